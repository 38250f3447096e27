//! CLI error type.

use cosig_core::{ConfigError, ErrorKind, WitnessError};
use cosig_note::{NoteError, ValidationError};
use cosig_store::{DistributorError, StoreError};
use thiserror::Error;

/// Every failure a command can report.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Witness(#[from] WitnessError),
    #[error(transparent)]
    Distributor(#[from] DistributorError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Note(err.into())
    }
}

impl CliError {
    /// Protocol classification, when the failure has one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CliError::Config(e) => Some(e.kind()),
            CliError::Note(e) => Some(e.kind()),
            CliError::Witness(e) => Some(e.kind()),
            CliError::Distributor(e) => Some(e.kind()),
            CliError::Store(_) => Some(ErrorKind::Storage),
            CliError::Io(_) => None,
        }
    }
}
