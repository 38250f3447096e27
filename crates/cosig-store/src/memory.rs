//! In-memory storage backend.

use std::collections::BTreeMap;

use cosig_core::{GoldenCheckpoint, GoldenStore, MemoryGoldenStore, StorageError};
use cosig_note::{LogId, WitnessId};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::evidence::{ForkRing, DEFAULT_FORK_CAPACITY};
use crate::traits::{CheckpointBackend, ForkEvidence, StoredCheckpoint};

/// Volatile backend holding every record in memory.
///
/// Also serves as the read index of [`crate::JournalBackend`].
#[derive(Debug)]
pub struct MemoryBackend {
    records: RwLock<BTreeMap<LogId, BTreeMap<WitnessId, StoredCheckpoint>>>,
    forks: RwLock<ForkRing>,
    goldens: MemoryGoldenStore,
}

impl MemoryBackend {
    /// Creates an empty backend with the default fork evidence capacity.
    pub fn new() -> Self {
        Self::with_fork_capacity(DEFAULT_FORK_CAPACITY)
    }

    /// Creates an empty backend keeping `capacity` fork entries per log.
    pub fn with_fork_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            forks: RwLock::new(ForkRing::new(capacity)),
            goldens: MemoryGoldenStore::new(),
        }
    }

    pub(crate) fn has_fork(&self, evidence: &ForkEvidence) -> bool {
        self.forks.read().contains(evidence)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointBackend for MemoryBackend {
    fn get(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
    ) -> Result<Option<StoredCheckpoint>, StoreError> {
        Ok(self
            .records
            .read()
            .get(log_id)
            .and_then(|by_witness| by_witness.get(witness_id))
            .cloned())
    }

    fn put(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
        record: StoredCheckpoint,
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .entry(log_id.clone())
            .or_default()
            .insert(witness_id.clone(), record);
        Ok(())
    }

    fn records_for_log(
        &self,
        log_id: &LogId,
    ) -> Result<Vec<(WitnessId, StoredCheckpoint)>, StoreError> {
        Ok(self
            .records
            .read()
            .get(log_id)
            .map(|by_witness| {
                by_witness
                    .iter()
                    .map(|(w, r)| (w.clone(), r.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn record_fork(&self, evidence: ForkEvidence) -> Result<(), StoreError> {
        let mut forks = self.forks.write();
        if !forks.contains(&evidence) {
            forks.push(evidence);
        }
        Ok(())
    }

    fn forks_for_log(&self, log_id: &LogId) -> Result<Vec<ForkEvidence>, StoreError> {
        Ok(self.forks.read().for_log(log_id))
    }
}

impl GoldenStore for MemoryBackend {
    fn golden(&self, log_id: &LogId) -> Result<Option<GoldenCheckpoint>, StorageError> {
        self.goldens.golden(log_id)
    }

    fn set_golden(&self, log_id: &LogId, golden: &GoldenCheckpoint) -> Result<(), StorageError> {
        self.goldens.set_golden(log_id, golden)
    }
}
