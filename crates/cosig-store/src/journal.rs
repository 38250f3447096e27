//! Journal-backed storage: every accepted write is appended to a journal
//! file and replayed into an in-memory index at startup.

use std::path::{Path, PathBuf};

use cosig_core::{GoldenCheckpoint, GoldenStore, StorageError};
use cosig_journal::{
    CheckpointRecord, ForkRecord, GoldenRecord, JournalReader, JournalRecord, JournalWriter,
    ReadMode, WriteOptions,
};
use cosig_note::{LogId, WitnessId};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::evidence::DEFAULT_FORK_CAPACITY;
use crate::memory::MemoryBackend;
use crate::traits::{CheckpointBackend, ForkEvidence, StoredCheckpoint};

/// Options for opening a [`JournalBackend`].
#[derive(Debug, Clone)]
pub struct JournalOptions {
    /// Fsync after every append (default: true).
    pub sync: bool,
    /// Fork evidence entries kept per log.
    pub fork_capacity: usize,
}

impl Default for JournalOptions {
    fn default() -> Self {
        Self {
            sync: true,
            fork_capacity: DEFAULT_FORK_CAPACITY,
        }
    }
}

/// Durable backend over a single journal file.
///
/// Writes are serialized by one writer mutex and reach the index only after
/// the journal append succeeded; reads are served from the index alone.
pub struct JournalBackend {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    index: MemoryBackend,
}

impl JournalBackend {
    /// Opens (or creates) the journal at `path` and replays it.
    ///
    /// A torn final frame, left by a crash mid-append, is cut off.
    pub fn open<P: AsRef<Path>>(path: P, options: JournalOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let index = MemoryBackend::with_fork_capacity(options.fork_capacity);

        let mut valid_len = None;
        if path.exists() && std::fs::metadata(&path)?.len() > 0 {
            let mut reader = JournalReader::open(&path, ReadMode::Permissive)?;
            let mut replayed = 0usize;
            while let Some(record) = reader.read_record()? {
                apply(&index, record)?;
                replayed += 1;
            }
            debug!(path = %path.display(), records = replayed, "journal replayed");
            valid_len = Some(reader.position());
        }

        let mut writer = JournalWriter::open(
            &path,
            WriteOptions {
                sync: options.sync,
                create: true,
                append: true,
            },
        )?;
        if let Some(len) = valid_len {
            let file_len = std::fs::metadata(&path)?.len();
            if len < file_len {
                warn!(
                    path = %path.display(),
                    dropped = file_len - len,
                    "discarding torn journal tail"
                );
                writer.truncate(len)?;
            }
        }

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            index,
        })
    }

    /// Path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn apply(index: &MemoryBackend, record: JournalRecord) -> Result<(), StoreError> {
    match record {
        JournalRecord::Checkpoint(r) => index.put(
            &r.log_id,
            &r.witness_id,
            StoredCheckpoint {
                size: r.size,
                envelope: r.envelope,
            },
        ),
        JournalRecord::Golden(r) => {
            let golden = GoldenCheckpoint::from_envelope(r.envelope)
                .map_err(|e| StoreError::Corrupt(format!("golden for {}: {e}", r.log_id)))?;
            index
                .set_golden(&r.log_id, &golden)
                .map_err(|e| StoreError::Corrupt(e.to_string()))
        }
        JournalRecord::Fork(r) => index.record_fork(ForkEvidence {
            log_id: r.log_id,
            witness_id: r.witness_id,
            size: r.size,
            stored: r.stored,
            rejected: r.rejected,
            observed_at_ms: r.observed_at_ms,
        }),
    }
}

impl CheckpointBackend for JournalBackend {
    fn get(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
    ) -> Result<Option<StoredCheckpoint>, StoreError> {
        self.index.get(log_id, witness_id)
    }

    fn put(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
        record: StoredCheckpoint,
    ) -> Result<(), StoreError> {
        // Index update happens under the writer lock so the index never
        // runs ahead of or behind the journal order.
        let mut writer = self.writer.lock();
        writer.append_record(&JournalRecord::Checkpoint(CheckpointRecord {
            log_id: log_id.clone(),
            witness_id: witness_id.clone(),
            size: record.size,
            envelope: record.envelope.clone(),
        }))?;
        self.index.put(log_id, witness_id, record)
    }

    fn records_for_log(
        &self,
        log_id: &LogId,
    ) -> Result<Vec<(WitnessId, StoredCheckpoint)>, StoreError> {
        self.index.records_for_log(log_id)
    }

    fn record_fork(&self, evidence: ForkEvidence) -> Result<(), StoreError> {
        let mut writer = self.writer.lock();
        // Resubmitting a known fork must not grow the journal.
        if self.index.has_fork(&evidence) {
            return Ok(());
        }
        writer.append_record(&JournalRecord::Fork(ForkRecord {
            log_id: evidence.log_id.clone(),
            witness_id: evidence.witness_id.clone(),
            size: evidence.size,
            stored: evidence.stored.clone(),
            rejected: evidence.rejected.clone(),
            observed_at_ms: evidence.observed_at_ms,
        }))?;
        self.index.record_fork(evidence)
    }

    fn forks_for_log(&self, log_id: &LogId) -> Result<Vec<ForkEvidence>, StoreError> {
        self.index.forks_for_log(log_id)
    }
}

impl GoldenStore for JournalBackend {
    fn golden(&self, log_id: &LogId) -> Result<Option<GoldenCheckpoint>, StorageError> {
        self.index.golden(log_id)
    }

    fn set_golden(&self, log_id: &LogId, golden: &GoldenCheckpoint) -> Result<(), StorageError> {
        let mut writer = self.writer.lock();
        writer
            .append_record(&JournalRecord::Golden(GoldenRecord {
                log_id: log_id.clone(),
                envelope: golden.envelope().to_vec(),
            }))
            .map_err(StorageError::new)?;
        self.index.set_golden(log_id, golden)
    }
}
