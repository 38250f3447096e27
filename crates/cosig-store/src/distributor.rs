//! The distributor: per-witness checkpoint records with monotonicity and
//! fork detection.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use cosig_core::{
    CancellationToken, CheckpointSink, KeyedLocks, LogInfo, LogRegistry, SinkError,
    WitnessRegistry,
};
use cosig_note::{parse_checkpoint, Checkpoint, LogId, Note, NoteVerifier, WitnessId};
use tracing::{debug, error, info, warn};

use crate::error::{DistributorError, StoreError};
use crate::traits::{CheckpointBackend, ForkEvidence, StoredCheckpoint};

/// What a successful [`Distributor::distribute`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributeOutcome {
    /// First checkpoint from this witness for this log.
    Created {
        /// Stored tree size.
        size: u64,
    },
    /// The stored checkpoint was replaced by a larger one.
    Updated {
        /// Previous tree size.
        from: u64,
        /// New tree size.
        to: u64,
    },
    /// The same checkpoint was already stored.
    Unchanged {
        /// Stored tree size.
        size: u64,
    },
}

/// Collects witness-signed checkpoints and serves them back individually or
/// combined into quorum artifacts.
pub struct Distributor {
    pub(crate) logs: Arc<LogRegistry>,
    pub(crate) witnesses: Arc<WitnessRegistry>,
    pub(crate) backend: Arc<dyn CheckpointBackend>,
    locks: KeyedLocks<(LogId, WitnessId)>,
}

impl Distributor {
    /// Creates a distributor over the given registries and backend.
    pub fn new(
        logs: Arc<LogRegistry>,
        witnesses: Arc<WitnessRegistry>,
        backend: Arc<dyn CheckpointBackend>,
    ) -> Self {
        Self {
            logs,
            witnesses,
            backend,
            locks: KeyedLocks::new(),
        }
    }

    pub(crate) fn log_info(&self, log_id: &LogId) -> Result<&LogInfo, DistributorError> {
        self.logs
            .get(log_id)
            .ok_or_else(|| DistributorError::UnknownLog(log_id.clone()))
    }

    fn witness_verifier(&self, witness_id: &WitnessId) -> Result<&NoteVerifier, DistributorError> {
        self.witnesses
            .get(witness_id)
            .ok_or_else(|| DistributorError::UnknownWitness(witness_id.clone()))
    }

    /// Accepts a checkpoint signed by the log and by `witness_id`.
    ///
    /// Sizes only grow per `(log, witness)`. A different root at the stored
    /// size is recorded as fork evidence and rejected; the stored record is
    /// never changed by a conflicting submission. Consistency proofs are the
    /// witness's job and are not checked here.
    pub fn distribute(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
        envelope: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DistributeOutcome, DistributorError> {
        let log = self.log_info(log_id)?;
        let witness = self.witness_verifier(witness_id)?;

        let parsed = parse_checkpoint(envelope, &log.origin, &log.verifier, &[witness])?;
        // Two separate lines must verify: one from the log, one from the witness.
        let signed_by_both = match (
            parsed.note.verified_signature(&log.verifier),
            parsed.note.verified_signature(witness),
        ) {
            (Some(log_sig), Some(wit_sig)) => log_sig.key_id() != wit_sig.key_id(),
            _ => false,
        };
        if !signed_by_both {
            warn!(log = %log_id, witness = %witness_id, "rejected checkpoint with missing signatures");
            return Err(DistributorError::SignatureMismatch {
                log_id: log_id.clone(),
                witness_id: witness_id.clone(),
            });
        }
        let proposed = parsed.checkpoint;

        let _guard = self.locks.lock(&(log_id.clone(), witness_id.clone()));
        let outcome = match self.backend.get(log_id, witness_id)? {
            None => DistributeOutcome::Created {
                size: proposed.size(),
            },
            Some(stored) => {
                if proposed.size() < stored.size {
                    warn!(
                        log = %log_id,
                        witness = %witness_id,
                        stored = stored.size,
                        proposed = proposed.size(),
                        "rejected regressing checkpoint"
                    );
                    return Err(DistributorError::Regression {
                        log_id: log_id.clone(),
                        witness_id: witness_id.clone(),
                        current: stored.size,
                        proposed: proposed.size(),
                    });
                }
                if proposed.size() == stored.size {
                    let current = stored_checkpoint(&stored)?;
                    if current == proposed {
                        debug!(log = %log_id, witness = %witness_id, size = stored.size, "checkpoint already stored");
                        return Ok(DistributeOutcome::Unchanged { size: stored.size });
                    }
                    self.report_fork(log_id, witness_id, stored, envelope, &current, &proposed);
                    return Err(DistributorError::ForkDetected {
                        log_id: log_id.clone(),
                        witness_id: witness_id.clone(),
                        size: proposed.size(),
                    });
                }
                DistributeOutcome::Updated {
                    from: stored.size,
                    to: proposed.size(),
                }
            }
        };

        if cancel.is_cancelled() {
            return Err(DistributorError::Cancelled);
        }
        self.backend.put(
            log_id,
            witness_id,
            StoredCheckpoint {
                size: proposed.size(),
                envelope: envelope.to_vec(),
            },
        )?;
        info!(log = %log_id, witness = %witness_id, ?outcome, "stored checkpoint");
        Ok(outcome)
    }

    fn report_fork(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
        stored: StoredCheckpoint,
        rejected: &[u8],
        current: &Checkpoint,
        proposed: &Checkpoint,
    ) {
        error!(
            log = %log_id,
            witness = %witness_id,
            size = proposed.size(),
            stored_root = %current.root_hash(),
            rejected_root = %proposed.root_hash(),
            "fork detected"
        );
        let observed_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let evidence = ForkEvidence {
            log_id: log_id.clone(),
            witness_id: witness_id.clone(),
            size: stored.size,
            stored: stored.envelope,
            rejected: rejected.to_vec(),
            observed_at_ms,
        };
        if let Err(e) = self.backend.record_fork(evidence) {
            error!(log = %log_id, error = %e, "failed to record fork evidence");
        }
    }

    /// Latest checkpoint stored for one witness.
    pub fn get_checkpoint_witness(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
    ) -> Result<Vec<u8>, DistributorError> {
        self.log_info(log_id)?;
        self.witness_verifier(witness_id)?;
        self.backend
            .get(log_id, witness_id)?
            .map(|r| r.envelope)
            .ok_or_else(|| DistributorError::NotFound {
                log_id: log_id.clone(),
                witness_id: witness_id.clone(),
            })
    }

    /// Configured logs in lexicographic order.
    pub fn get_logs(&self) -> Vec<LogId> {
        self.logs.ids().cloned().collect()
    }

    /// Retained fork evidence for a log, oldest first.
    pub fn fork_evidence(&self, log_id: &LogId) -> Result<Vec<ForkEvidence>, DistributorError> {
        self.log_info(log_id)?;
        Ok(self.backend.forks_for_log(log_id)?)
    }
}

pub(crate) fn stored_checkpoint(stored: &StoredCheckpoint) -> Result<Checkpoint, StoreError> {
    Note::parse(&stored.envelope)
        .and_then(|note| Checkpoint::parse(note.text()))
        .map_err(|e| StoreError::Corrupt(format!("stored envelope: {e}")))
}

impl CheckpointSink for Distributor {
    fn submit(
        &self,
        log_id: &LogId,
        witness_id: &WitnessId,
        envelope: &[u8],
    ) -> Result<(), SinkError> {
        self.distribute(log_id, witness_id, envelope, &CancellationToken::new())
            .map(|_| ())
            .map_err(|e| SinkError {
                kind: e.kind(),
                message: e.to_string(),
            })
    }
}
