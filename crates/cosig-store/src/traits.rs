//! Storage backend traits.

use cosig_note::{LogId, WitnessId};

use crate::error::StoreError;

/// The checkpoint a distributor holds for one `(log, witness)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCheckpoint {
    /// Tree size, kept alongside the envelope for ordering without parsing.
    pub size: u64,
    /// Envelope exactly as submitted.
    pub envelope: Vec<u8>,
}

/// Two envelopes for the same log and size with different roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkEvidence {
    /// Affected log.
    pub log_id: LogId,
    /// Witness whose submission conflicted.
    pub witness_id: WitnessId,
    /// Tree size both envelopes claim.
    pub size: u64,
    /// Envelope that was already stored.
    pub stored: Vec<u8>,
    /// Envelope that was rejected.
    pub rejected: Vec<u8>,
    /// Milliseconds since the Unix epoch when the conflict was seen.
    pub observed_at_ms: u64,
}

/// Persistence for distributor checkpoint records and fork evidence.
///
/// Implementations serialize their own writes and serve reads concurrently.
/// Read-check-write sequences are the caller's responsibility.
pub trait CheckpointBackend: Send + Sync {
    /// Record for one pair, if any.
    fn get(&self, log_id: &LogId, witness_id: &WitnessId)
        -> Result<Option<StoredCheckpoint>, StoreError>;

    /// Replaces the record for one pair. Durable before returning `Ok`.
    fn put(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
        record: StoredCheckpoint,
    ) -> Result<(), StoreError>;

    /// Every record for a log, ordered by witness id.
    fn records_for_log(&self, log_id: &LogId)
        -> Result<Vec<(WitnessId, StoredCheckpoint)>, StoreError>;

    /// Retains fork evidence. Evidence matching a retained entry on
    /// witness, size and rejected envelope is not recorded again.
    fn record_fork(&self, evidence: ForkEvidence) -> Result<(), StoreError>;

    /// Retained fork evidence for a log, oldest first.
    fn forks_for_log(&self, log_id: &LogId) -> Result<Vec<ForkEvidence>, StoreError>;
}
