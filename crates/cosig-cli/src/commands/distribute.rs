//! Distributor submission command.

use std::path::PathBuf;

use cosig_core::CancellationToken;
use cosig_note::{LogId, WitnessId};
use cosig_store::{DistributeOutcome, Distributor};

use crate::context::{open_store, registries};
use crate::error::CliError;

pub fn run(
    config: PathBuf,
    store: PathBuf,
    log: String,
    witness: String,
    envelope: PathBuf,
) -> Result<(), CliError> {
    let (logs, witnesses) = registries(&config)?;
    let distributor = Distributor::new(logs, witnesses, open_store(&store)?);
    let log_id = LogId::parse(log)?;
    let witness_id = WitnessId::parse(witness)?;
    let envelope = std::fs::read(&envelope)?;

    let outcome =
        distributor.distribute(&log_id, &witness_id, &envelope, &CancellationToken::new())?;
    match outcome {
        DistributeOutcome::Created { size } => println!("created {log_id}/{witness_id} at {size}"),
        DistributeOutcome::Updated { from, to } => {
            println!("updated {log_id}/{witness_id} from {from} to {to}")
        }
        DistributeOutcome::Unchanged { size } => {
            println!("unchanged {log_id}/{witness_id} at {size}")
        }
    }
    Ok(())
}
