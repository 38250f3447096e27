//! Error types for store and distributor operations.

use cosig_core::{ErrorKind, StorageError};
use cosig_note::{LogId, NoteError, WitnessId};
use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error outside the journal codec.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Journal backend error.
    #[error("journal error: {0}")]
    Journal(#[from] cosig_journal::JournalError),
    /// Persisted state could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        StorageError::new(err)
    }
}

/// Errors returned by [`crate::Distributor`].
#[derive(Error, Debug)]
pub enum DistributorError {
    /// Log is not configured.
    #[error("unknown log {0}")]
    UnknownLog(LogId),
    /// Witness is not configured.
    #[error("unknown witness {0}")]
    UnknownWitness(WitnessId),
    /// Envelope could not be decoded or has the wrong origin.
    #[error(transparent)]
    Note(#[from] NoteError),
    /// The log or the witness signature did not verify.
    #[error("checkpoint for {log_id} is not signed by both the log and witness {witness_id}")]
    SignatureMismatch {
        /// Log named by the caller.
        log_id: LogId,
        /// Witness named by the caller.
        witness_id: WitnessId,
    },
    /// Submitted size is smaller than the stored one.
    #[error("{witness_id} regressed {log_id} from size {current} to {proposed}")]
    Regression {
        /// Affected log.
        log_id: LogId,
        /// Submitting witness.
        witness_id: WitnessId,
        /// Stored size.
        current: u64,
        /// Submitted size.
        proposed: u64,
    },
    /// Submitted checkpoint conflicts with the stored one at the same size.
    #[error("fork detected for {log_id} at size {size} via witness {witness_id}")]
    ForkDetected {
        /// Affected log.
        log_id: LogId,
        /// Submitting witness.
        witness_id: WitnessId,
        /// Conflicting tree size.
        size: u64,
    },
    /// No record exists for the pair.
    #[error("no checkpoint from {witness_id} for {log_id}")]
    NotFound {
        /// Requested log.
        log_id: LogId,
        /// Requested witness.
        witness_id: WitnessId,
    },
    /// No tree size has enough witness signatures.
    #[error("no checkpoint for {log_id} with {threshold} witness signatures")]
    InsufficientSignatures {
        /// Requested log.
        log_id: LogId,
        /// Requested signature count.
        threshold: usize,
    },
    /// Cancellation was requested before the write committed.
    #[error("operation cancelled")]
    Cancelled,
    /// Backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DistributorError {
    /// Classifies the error within the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DistributorError::UnknownLog(_) => ErrorKind::UnknownLog,
            DistributorError::UnknownWitness(_) => ErrorKind::UnknownWitness,
            DistributorError::Note(e) => e.kind(),
            DistributorError::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
            DistributorError::Regression { .. } => ErrorKind::Regression,
            DistributorError::ForkDetected { .. } => ErrorKind::ForkDetected,
            DistributorError::NotFound { .. } => ErrorKind::NotFound,
            DistributorError::InsufficientSignatures { .. } => ErrorKind::InsufficientSignatures,
            DistributorError::Cancelled => ErrorKind::Cancelled,
            DistributorError::Store(_) => ErrorKind::Storage,
        }
    }
}
