//! Lists configured logs.

use std::path::PathBuf;

use cosig_core::Config;

use crate::error::CliError;

pub fn run(config: PathBuf) -> Result<(), CliError> {
    let config = Config::load(&config)?;
    let registry = config.log_registry()?;
    for id in registry.ids() {
        if let Some(info) = registry.get(id) {
            println!("{id}\t{}", info.origin);
        }
    }
    Ok(())
}
