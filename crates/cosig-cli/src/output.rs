//! Output formatting utilities.

use std::io::Write;

use base64::Engine;
use cosig_store::ForkEvidence;
use serde_json::json;

/// Writes raw envelope bytes to stdout.
pub fn write_envelope(envelope: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(envelope)?;
    stdout.flush()
}

/// Formats fork evidence as one JSON object.
pub fn format_fork_json(evidence: &ForkEvidence) -> String {
    let b64 = base64::engine::general_purpose::STANDARD;
    json!({
        "log_id": evidence.log_id.as_str(),
        "witness_id": evidence.witness_id.as_str(),
        "size": evidence.size,
        "observed_at_ms": evidence.observed_at_ms,
        "stored": b64.encode(&evidence.stored),
        "rejected": b64.encode(&evidence.rejected),
    })
    .to_string()
}

/// Formats fork evidence as a table row.
pub fn format_fork_row(evidence: &ForkEvidence) -> String {
    format!(
        "{:<24} {:<12} {}",
        evidence.witness_id.as_str(),
        evidence.size,
        evidence.observed_at_ms
    )
}

/// Prints the fork table header.
pub fn print_fork_header() {
    println!("{:<24} {:<12} OBSERVED_AT_MS", "WITNESS", "SIZE");
    println!("{}", "-".repeat(52));
}
