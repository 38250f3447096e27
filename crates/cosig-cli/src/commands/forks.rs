//! Fork evidence listing.

use std::path::PathBuf;

use cosig_note::LogId;
use cosig_store::Distributor;

use crate::context::{open_store, registries};
use crate::error::CliError;
use crate::output::{format_fork_json, format_fork_row, print_fork_header};

pub fn run(config: PathBuf, store: PathBuf, log: String, json: bool) -> Result<(), CliError> {
    let (logs, witnesses) = registries(&config)?;
    let distributor = Distributor::new(logs, witnesses, open_store(&store)?);
    let log_id = LogId::parse(log)?;
    let evidence = distributor.fork_evidence(&log_id)?;

    if json {
        for item in &evidence {
            println!("{}", format_fork_json(item));
        }
    } else {
        print_fork_header();
        for item in &evidence {
            println!("{}", format_fork_row(item));
        }
    }
    Ok(())
}
