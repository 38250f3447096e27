//! Checkpoint retrieval commands.

use std::path::{Path, PathBuf};

use cosig_note::{LogId, WitnessId};
use cosig_store::Distributor;

use crate::context::{open_store, registries};
use crate::error::CliError;
use crate::output::write_envelope;

fn distributor(config: &Path, store: &Path) -> Result<Distributor, CliError> {
    let (logs, witnesses) = registries(config)?;
    Ok(Distributor::new(logs, witnesses, open_store(store)?))
}

/// Prints the combined quorum note.
pub fn run_quorum(
    config: PathBuf,
    store: PathBuf,
    log: String,
    threshold: usize,
) -> Result<(), CliError> {
    let distributor = distributor(&config, &store)?;
    let log_id = LogId::parse(log)?;
    let envelope = distributor.get_checkpoint_n(&log_id, threshold)?;
    write_envelope(&envelope)?;
    Ok(())
}

/// Prints the stored envelope for one witness.
pub fn run_witness(
    config: PathBuf,
    store: PathBuf,
    log: String,
    witness: String,
) -> Result<(), CliError> {
    let distributor = distributor(&config, &store)?;
    let log_id = LogId::parse(log)?;
    let witness_id = WitnessId::parse(witness)?;
    let envelope = distributor.get_checkpoint_witness(&log_id, &witness_id)?;
    write_envelope(&envelope)?;
    Ok(())
}
