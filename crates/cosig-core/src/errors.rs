//! Error types for witness operations.

use cosig_note::{Checkpoint, ErrorKind, LogId, NoteError};
use thiserror::Error;

use crate::merkle::ProofError;

/// Opaque failure reported by a persistence backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("storage failure: {0}")]
pub struct StorageError(pub String);

impl StorageError {
    /// Wraps any displayable backend error.
    pub fn new(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}

/// Errors returned by [`crate::Witness`].
#[derive(Error, Debug)]
pub enum WitnessError {
    /// Log is not configured, or has no golden checkpoint yet.
    #[error("unknown log {0}")]
    UnknownLog(LogId),
    /// Log already has a golden checkpoint.
    #[error("log {0} is already initialized")]
    AlreadyInitialized(LogId),
    /// Envelope is not signed by the configured log key.
    #[error("checkpoint for {log_id} lacks a valid log signature")]
    InvalidCheckpoint {
        /// Log the checkpoint claimed to be from.
        log_id: LogId,
    },
    /// Proposed tree is smaller than the golden one.
    #[error("log {log_id} regressed from size {current} to {proposed}")]
    Regression {
        /// Affected log.
        log_id: LogId,
        /// Golden tree size.
        current: u64,
        /// Proposed tree size.
        proposed: u64,
    },
    /// Same tree size as the golden checkpoint, different root.
    #[error("fork detected for {log_id}: golden {current}, proposed {proposed}")]
    ForkDetected {
        /// Affected log.
        log_id: LogId,
        /// Golden checkpoint.
        current: Box<Checkpoint>,
        /// Conflicting proposal.
        proposed: Box<Checkpoint>,
    },
    /// Consistency proof did not verify.
    #[error("invalid consistency proof for {log_id}: {source}")]
    InvalidProof {
        /// Affected log.
        log_id: LogId,
        /// Verification failure.
        #[source]
        source: ProofError,
    },
    /// Envelope could not be decoded.
    #[error(transparent)]
    Note(#[from] NoteError),
    /// Cancellation was requested before the update committed.
    #[error("operation cancelled")]
    Cancelled,
    /// Golden store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WitnessError {
    /// Classifies the error within the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WitnessError::UnknownLog(_) => ErrorKind::UnknownLog,
            WitnessError::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            WitnessError::InvalidCheckpoint { .. } => ErrorKind::InvalidCheckpoint,
            WitnessError::Regression { .. } => ErrorKind::Regression,
            WitnessError::ForkDetected { .. } => ErrorKind::ForkDetected,
            WitnessError::InvalidProof { .. } => ErrorKind::InvalidProof,
            WitnessError::Note(e) => e.kind(),
            WitnessError::Cancelled => ErrorKind::Cancelled,
            WitnessError::Storage(_) => ErrorKind::Storage,
        }
    }
}
