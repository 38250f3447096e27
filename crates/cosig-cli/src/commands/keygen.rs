//! Key generation command.

use cosig_note::generate_key;

use crate::error::CliError;

/// Prints a new signer key on the first line and its verifier on the second.
pub fn run(name: String) -> Result<(), CliError> {
    let (signer, verifier) = generate_key(&name)?;
    println!("{}", signer.to_key_string());
    println!("{verifier}");
    Ok(())
}
