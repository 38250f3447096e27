//! Shared setup for commands.

use std::path::Path;
use std::sync::Arc;

use cosig_core::{Config, LogRegistry, WitnessRegistry};
use cosig_note::NoteSigner;
use cosig_store::{JournalBackend, JournalOptions};

use crate::error::CliError;

pub fn registries(config: &Path) -> Result<(Arc<LogRegistry>, Arc<WitnessRegistry>), CliError> {
    let config = Config::load(config)?;
    Ok((
        Arc::new(config.log_registry()?),
        Arc::new(config.witness_registry()?),
    ))
}

pub fn open_store(path: &Path) -> Result<Arc<JournalBackend>, CliError> {
    Ok(Arc::new(JournalBackend::open(path, JournalOptions::default())?))
}

pub fn read_signer(path: &Path) -> Result<NoteSigner, CliError> {
    let key = std::fs::read_to_string(path)?;
    Ok(NoteSigner::parse(key.trim())?)
}
