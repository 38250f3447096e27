//! Log-side checkpoint signing.

use std::path::PathBuf;

use cosig_note::{sign_note, Checkpoint, TreeHash};

use crate::context::read_signer;
use crate::error::CliError;
use crate::output::write_envelope;

pub fn run(key: PathBuf, origin: String, size: u64, root: String) -> Result<(), CliError> {
    let signer = read_signer(&key)?;
    let root = TreeHash::from_base64(&root)?;
    let checkpoint = Checkpoint::new(origin, size, root)?;
    let envelope = sign_note(&checkpoint.marshal(), &[&signer])?;
    write_envelope(&envelope)?;
    Ok(())
}
