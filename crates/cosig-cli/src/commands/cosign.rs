//! Witness co-signing command.

use std::path::{Path, PathBuf};

use cosig_core::{CancellationToken, Witness};
use cosig_note::{LogId, TreeHash};
use tracing::{info, warn};

use crate::context::{open_store, read_signer, registries};
use crate::error::CliError;
use crate::output::write_envelope;

/// Co-signs the envelope, initializing the log on first contact.
pub fn run(
    config: PathBuf,
    key: PathBuf,
    store: PathBuf,
    log: String,
    proof: Option<PathBuf>,
    envelope: PathBuf,
) -> Result<(), CliError> {
    let (logs, _) = registries(&config)?;
    let signer = read_signer(&key)?;
    let backend = open_store(&store)?;
    let log_id = LogId::parse(log)?;
    let envelope = std::fs::read(&envelope)?;

    let witness = Witness::new(signer, logs, backend);
    let cancel = CancellationToken::new();

    let signed = if witness.is_tracking(&log_id)? {
        let proof = match proof {
            Some(path) => read_proof(&path)?,
            None => Vec::new(),
        };
        let from = witness.golden_size(&log_id)?;
        let signed = witness.update(&log_id, &envelope, &proof, &cancel)?;
        info!(log = %log_id, from, to = witness.golden_size(&log_id)?, "co-signed checkpoint");
        signed
    } else {
        if proof.is_some() {
            warn!(log = %log_id, "log not yet tracked, ignoring proof");
        }
        witness.init(&log_id, &envelope, &cancel)?
    };
    write_envelope(&signed)?;
    Ok(())
}

/// Reads a consistency proof: one base64 hash per non-empty line.
fn read_proof(path: &Path) -> Result<Vec<TreeHash>, CliError> {
    let text = std::fs::read_to_string(path)?;
    let mut proof = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        proof.push(TreeHash::from_base64(line)?);
    }
    Ok(proof)
}
