//! Combining per-witness checkpoints into quorum-signed artifacts.

use std::collections::BTreeMap;

use cosig_core::{LogInfo, WitnessRegistry};
use cosig_note::{parse_checkpoint, LogId, Note, NoteSignature, WitnessId};
use tracing::{debug, warn};

use crate::distributor::Distributor;
use crate::error::DistributorError;
use crate::traits::StoredCheckpoint;

/// Witness signatures collected over one exact checkpoint body.
struct Agreement {
    size: u64,
    log_signature: NoteSignature,
    witnesses: BTreeMap<WitnessId, NoteSignature>,
}

/// Groups verified records by body text, keeping one signature per witness
/// key.
///
/// Records that no longer verify (or whose witness is no longer configured)
/// are skipped.
fn collect(
    log_id: &LogId,
    log: &LogInfo,
    witnesses: &WitnessRegistry,
    records: Vec<(WitnessId, StoredCheckpoint)>,
) -> BTreeMap<String, Agreement> {
    let mut groups: BTreeMap<String, Agreement> = BTreeMap::new();
    for (witness_id, record) in records {
        let Some(verifier) = witnesses.get(&witness_id) else {
            debug!(log = %log_id, witness = %witness_id, "skipping record from unconfigured witness");
            continue;
        };
        let parsed = match parse_checkpoint(&record.envelope, &log.origin, &log.verifier, &[verifier]) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(log = %log_id, witness = %witness_id, error = %e, "skipping unreadable record");
                continue;
            }
        };
        let (Some(log_sig), Some(wit_sig)) = (
            parsed.note.verified_signature(&log.verifier),
            parsed.note.verified_signature(verifier),
        ) else {
            warn!(log = %log_id, witness = %witness_id, "skipping record that no longer verifies");
            continue;
        };
        if wit_sig.key_id() == log_sig.key_id() {
            warn!(log = %log_id, witness = %witness_id, "skipping record whose witness key is the log key");
            continue;
        }
        let group = groups
            .entry(parsed.note.text().to_string())
            .or_insert_with(|| Agreement {
                size: parsed.checkpoint.size(),
                log_signature: log_sig.clone(),
                witnesses: BTreeMap::new(),
            });
        // One key counts once, however many witness ids it is configured under.
        if let Some((other, _)) = group
            .witnesses
            .iter()
            .find(|(_, sig)| sig.key_id() == wit_sig.key_id())
        {
            warn!(log = %log_id, witness = %witness_id, other = %other, "witness key already counted");
            continue;
        }
        group.witnesses.insert(witness_id, wit_sig.clone());
    }
    groups
}

/// Picks the largest tree size reaching `threshold` witnesses and encodes the
/// combined note: log signature first, then witness signatures by witness id.
pub(crate) fn combine(
    log_id: &LogId,
    log: &LogInfo,
    witnesses: &WitnessRegistry,
    records: Vec<(WitnessId, StoredCheckpoint)>,
    threshold: usize,
) -> Option<Vec<u8>> {
    let groups = collect(log_id, log, witnesses, records);
    let mut qualifying: Vec<(&String, &Agreement)> = groups
        .iter()
        .filter(|(_, g)| g.witnesses.len() >= threshold)
        .collect();
    // Largest size first; at equal size, more signatures, then body text.
    qualifying.sort_by(|(text_a, a), (text_b, b)| {
        b.size
            .cmp(&a.size)
            .then(b.witnesses.len().cmp(&a.witnesses.len()))
            .then(text_a.cmp(text_b))
    });

    let (text, best) = qualifying.first()?;
    if qualifying
        .iter()
        .skip(1)
        .any(|(_, other)| other.size == best.size)
    {
        warn!(
            log = %log_id,
            size = best.size,
            "witnesses disagree on the checkpoint at this size"
        );
    }

    let mut note = Note::new(text.as_str()).ok()?;
    note.add_signature(best.log_signature.clone());
    for sig in best.witnesses.values() {
        note.add_signature(sig.clone());
    }
    note.to_bytes().ok()
}

impl Distributor {
    /// The freshest checkpoint for `log_id` co-signed by at least
    /// `threshold` distinct witness keys, as one combined note.
    pub fn get_checkpoint_n(
        &self,
        log_id: &LogId,
        threshold: usize,
    ) -> Result<Vec<u8>, DistributorError> {
        let log = self.log_info(log_id)?;
        let records = self.backend.records_for_log(log_id)?;
        combine(log_id, log, &self.witnesses, records, threshold).ok_or_else(|| {
            DistributorError::InsufficientSignatures {
                log_id: log_id.clone(),
                threshold,
            }
        })
    }
}
