use thiserror::Error;

/// Protocol-level classification shared by every error type in the workspace.
///
/// Callers match on the kind to tell "try again later" apart from "this
/// log/witness pairing is broken" without caring which layer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Log identifier is not configured.
    UnknownLog,
    /// Witness identifier is not configured.
    UnknownWitness,
    /// Envelope or checkpoint body could not be parsed.
    MalformedEnvelope,
    /// Checkpoint origin differs from the configured log origin.
    OriginMismatch,
    /// Fewer expected signatures verified than required.
    SignatureMismatch,
    /// Proposed tree size is smaller than the recorded one.
    Regression,
    /// Same tree size, different root hash.
    ForkDetected,
    /// Consistency proof failed verification.
    InvalidProof,
    /// No tree size reaches the requested signature threshold.
    InsufficientSignatures,
    /// No record exists yet.
    NotFound,
    /// Log already has a golden checkpoint.
    AlreadyInitialized,
    /// Checkpoint is not signed by the configured log key.
    InvalidCheckpoint,
    /// Caller cancelled the operation before it committed.
    Cancelled,
    /// Key material or configuration is unusable.
    InvalidConfig,
    /// Persistent storage failed.
    Storage,
    /// A log or other upstream service could not be reached.
    Unavailable,
}

impl ErrorKind {
    /// True for outcomes that mean the log (or a party vouching for it)
    /// misbehaved; these must be alerted on and never retried blindly.
    pub fn is_safety_violation(self) -> bool {
        matches!(self, ErrorKind::ForkDetected | ErrorKind::OriginMismatch)
    }

    /// True for expected, non-exceptional outcomes worth retrying later.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::InsufficientSignatures
                | ErrorKind::NotFound
                | ErrorKind::Cancelled
                | ErrorKind::Storage
                | ErrorKind::Unavailable
        )
    }
}

/// Errors from parsing, verifying, or producing signed notes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    /// Envelope or body structure is invalid.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    /// Decoded origin differs from the expected one.
    #[error("checkpoint origin {actual:?} does not match expected {expected:?}")]
    OriginMismatch {
        /// Origin the caller expected.
        expected: String,
        /// Origin found in the checkpoint body.
        actual: String,
    },
    /// Signer or verifier key string could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// A primitive failed validation.
    #[error(transparent)]
    Validation(#[from] crate::validation::ValidationError),
}

impl NoteError {
    /// Classifies the error within the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NoteError::MalformedEnvelope(_) | NoteError::Validation(_) => {
                ErrorKind::MalformedEnvelope
            }
            NoteError::OriginMismatch { .. } => ErrorKind::OriginMismatch,
            NoteError::InvalidKey(_) => ErrorKind::InvalidConfig,
        }
    }
}
