//! The witness: co-signs checkpoints only when they extend the golden one.
//!
//! Per log, a witness moves from *unregistered* to *tracking* through
//! [`Witness::init`] (trust on first use of a log-signed checkpoint) and then
//! only advances through [`Witness::update`], which requires a consistency
//! proof from the golden tree to the proposed one. Every persisted golden
//! checkpoint is the one the witness most recently signed.

use std::collections::HashMap;
use std::sync::Arc;

use cosig_note::{
    Checkpoint, LogId, Note, NoteError, NoteSigner, NoteVerifier, ParsedCheckpoint, TreeHash,
};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{LogInfo, LogRegistry};
use crate::errors::{StorageError, WitnessError};
use crate::merkle::{ConsistencyVerifier, Rfc6962Verifier};
use crate::sync::KeyedLocks;

/// The checkpoint a witness last signed for a log, with its co-signed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenCheckpoint {
    checkpoint: Checkpoint,
    envelope: Vec<u8>,
}

impl GoldenCheckpoint {
    /// Decodes a golden checkpoint from the envelope the witness produced.
    ///
    /// Signatures are not re-checked; the envelope was verified before it was
    /// stored.
    pub fn from_envelope(envelope: Vec<u8>) -> Result<Self, NoteError> {
        let note = Note::parse(&envelope)?;
        let checkpoint = Checkpoint::parse(note.text())?;
        Ok(Self {
            checkpoint,
            envelope,
        })
    }

    /// Decoded checkpoint.
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Envelope signed by the log and the witness.
    pub fn envelope(&self) -> &[u8] {
        &self.envelope
    }
}

/// Durable per-log storage for golden checkpoints.
pub trait GoldenStore: Send + Sync {
    /// Golden checkpoint for `log_id`, if one was ever set.
    fn golden(&self, log_id: &LogId) -> Result<Option<GoldenCheckpoint>, StorageError>;

    /// Replaces the golden checkpoint for `log_id`.
    ///
    /// Must be durable before returning `Ok`.
    fn set_golden(&self, log_id: &LogId, golden: &GoldenCheckpoint) -> Result<(), StorageError>;
}

/// Volatile [`GoldenStore`] for tests and ephemeral witnesses.
#[derive(Debug, Default)]
pub struct MemoryGoldenStore {
    goldens: RwLock<HashMap<LogId, GoldenCheckpoint>>,
}

impl MemoryGoldenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GoldenStore for MemoryGoldenStore {
    fn golden(&self, log_id: &LogId) -> Result<Option<GoldenCheckpoint>, StorageError> {
        Ok(self.goldens.read().get(log_id).cloned())
    }

    fn set_golden(&self, log_id: &LogId, golden: &GoldenCheckpoint) -> Result<(), StorageError> {
        self.goldens.write().insert(log_id.clone(), golden.clone());
        Ok(())
    }
}

/// A witness bound to one signing key, a log registry and a golden store.
pub struct Witness {
    signer: NoteSigner,
    logs: Arc<LogRegistry>,
    store: Arc<dyn GoldenStore>,
    proofs: Arc<dyn ConsistencyVerifier>,
    locks: KeyedLocks<LogId>,
}

impl Witness {
    /// Creates a witness using RFC 6962 consistency verification.
    pub fn new(signer: NoteSigner, logs: Arc<LogRegistry>, store: Arc<dyn GoldenStore>) -> Self {
        Self {
            signer,
            logs,
            store,
            proofs: Arc::new(Rfc6962Verifier),
            locks: KeyedLocks::new(),
        }
    }

    /// Replaces the consistency verifier.
    pub fn with_consistency_verifier(mut self, proofs: Arc<dyn ConsistencyVerifier>) -> Self {
        self.proofs = proofs;
        self
    }

    /// Name the witness signs with.
    pub fn name(&self) -> &str {
        self.signer.name()
    }

    /// Verifier for this witness's signatures.
    pub fn verifier(&self) -> NoteVerifier {
        self.signer.verifier()
    }

    /// Starts tracking `log_id` from a log-signed checkpoint.
    ///
    /// The checkpoint is trusted on first use: no proof is needed, but it
    /// must carry a valid signature from the configured log key.
    pub fn init(
        &self,
        log_id: &LogId,
        envelope: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, WitnessError> {
        let info = self.log_info(log_id)?;
        let _guard = self.locks.lock(log_id);

        if self.store.golden(log_id)?.is_some() {
            return Err(WitnessError::AlreadyInitialized(log_id.clone()));
        }
        let parsed = self.parse_log_signed(log_id, info, envelope)?;

        if cancel.is_cancelled() {
            return Err(WitnessError::Cancelled);
        }
        let golden = self.commit(log_id, info, parsed)?;
        info!(
            log = %log_id,
            size = golden.checkpoint().size(),
            root = %golden.checkpoint().root_hash(),
            "witness initialized log"
        );
        Ok(golden.envelope)
    }

    /// Co-signed envelope of the golden checkpoint for `log_id`.
    pub fn get_latest(&self, log_id: &LogId) -> Result<Vec<u8>, WitnessError> {
        self.log_info(log_id)?;
        match self.store.golden(log_id)? {
            Some(golden) => Ok(golden.envelope),
            None => Err(WitnessError::UnknownLog(log_id.clone())),
        }
    }

    /// True once `log_id` has a golden checkpoint.
    pub fn is_tracking(&self, log_id: &LogId) -> Result<bool, WitnessError> {
        Ok(self.latest_checkpoint(log_id)?.is_some())
    }

    /// Tree size of the golden checkpoint for `log_id`.
    pub fn golden_size(&self, log_id: &LogId) -> Result<u64, WitnessError> {
        self.latest_checkpoint(log_id)?
            .map(|cp| cp.size())
            .ok_or_else(|| WitnessError::UnknownLog(log_id.clone()))
    }

    /// Golden checkpoint for `log_id`, or `None` before initialization.
    pub fn latest_checkpoint(&self, log_id: &LogId) -> Result<Option<Checkpoint>, WitnessError> {
        self.log_info(log_id)?;
        Ok(self.store.golden(log_id)?.map(|g| g.checkpoint))
    }

    /// Advances the golden checkpoint for `log_id` and returns the new
    /// co-signed envelope.
    ///
    /// - smaller size than golden: [`WitnessError::Regression`]
    /// - same size, same root: idempotent, returns the stored envelope
    /// - same size, different root: [`WitnessError::ForkDetected`]
    /// - larger size: `proof` must show consistency from the golden tree
    pub fn update(
        &self,
        log_id: &LogId,
        envelope: &[u8],
        proof: &[TreeHash],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, WitnessError> {
        let info = self.log_info(log_id)?;
        let _guard = self.locks.lock(log_id);

        let golden = self
            .store
            .golden(log_id)?
            .ok_or_else(|| WitnessError::UnknownLog(log_id.clone()))?;
        let current = golden.checkpoint();
        let parsed = self.parse_log_signed(log_id, info, envelope)?;
        let proposed = &parsed.checkpoint;

        if proposed.size() < current.size() {
            return Err(WitnessError::Regression {
                log_id: log_id.clone(),
                current: current.size(),
                proposed: proposed.size(),
            });
        }
        if proposed.size() == current.size() {
            if proposed.root_hash() != current.root_hash() {
                error!(
                    log = %log_id,
                    size = proposed.size(),
                    golden = %current.root_hash(),
                    proposed = %proposed.root_hash(),
                    "fork detected"
                );
                return Err(WitnessError::ForkDetected {
                    log_id: log_id.clone(),
                    current: Box::new(current.clone()),
                    proposed: Box::new(proposed.clone()),
                });
            }
            if !proof.is_empty() {
                debug!(log = %log_id, len = proof.len(), "ignoring proof for same-size update");
            }
            return Ok(golden.envelope);
        }
        self.proofs
            .verify(current, proposed, proof)
            .map_err(|source| WitnessError::InvalidProof {
                log_id: log_id.clone(),
                source,
            })?;

        if cancel.is_cancelled() {
            return Err(WitnessError::Cancelled);
        }
        let from = current.size();
        let golden = self.commit(log_id, info, parsed)?;
        info!(
            log = %log_id,
            from,
            to = golden.checkpoint().size(),
            "witness advanced log"
        );
        Ok(golden.envelope)
    }

    fn log_info(&self, log_id: &LogId) -> Result<&LogInfo, WitnessError> {
        self.logs
            .get(log_id)
            .ok_or_else(|| WitnessError::UnknownLog(log_id.clone()))
    }

    fn parse_log_signed(
        &self,
        log_id: &LogId,
        info: &LogInfo,
        envelope: &[u8],
    ) -> Result<ParsedCheckpoint, WitnessError> {
        let parsed = cosig_note::parse_checkpoint(envelope, &info.origin, &info.verifier, &[])?;
        if !parsed.is_signed_by(&info.verifier) {
            return Err(WitnessError::InvalidCheckpoint {
                log_id: log_id.clone(),
            });
        }
        Ok(parsed)
    }

    /// Signs the proposal and persists it. Only the log's own signature is
    /// carried over from the input envelope.
    fn commit(
        &self,
        log_id: &LogId,
        info: &LogInfo,
        parsed: ParsedCheckpoint,
    ) -> Result<GoldenCheckpoint, WitnessError> {
        let mut note = Note::new(parsed.note.text())?;
        if let Some(sig) = parsed.note.verified_signature(&info.verifier) {
            note.add_signature(sig.clone());
        }
        note.sign_with(&self.signer);
        let golden = GoldenCheckpoint {
            checkpoint: parsed.checkpoint,
            envelope: note.to_bytes()?,
        };
        self.store.set_golden(log_id, &golden)?;
        Ok(golden)
    }
}
