//! Background loop that keeps a witness current with a log.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cosig_note::{Checkpoint, ErrorKind, LogId, Note, NoteError, TreeHash, WitnessId};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::WitnessError;
use crate::witness::Witness;

/// Failure talking to a log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("log client error: {0}")]
pub struct ClientError(pub String);

/// Read access to a verifiable log.
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Latest log-signed checkpoint envelope.
    async fn latest_checkpoint(&self, log_id: &LogId) -> Result<Vec<u8>, ClientError>;

    /// Consistency proof between tree sizes `from` and `to`.
    async fn consistency_proof(
        &self,
        log_id: &LogId,
        from: u64,
        to: u64,
    ) -> Result<Vec<TreeHash>, ClientError>;
}

/// Rejection reported by a [`CheckpointSink`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SinkError {
    /// Protocol classification of the rejection.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

/// Destination for co-signed checkpoints, typically a distributor.
pub trait CheckpointSink: Send + Sync {
    /// Hands over a checkpoint co-signed by `witness_id`.
    fn submit(&self, log_id: &LogId, witness_id: &WitnessId, envelope: &[u8])
        -> Result<(), SinkError>;
}

/// What a single follower tick achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The log was unknown to the witness and is now tracked at this size.
    Initialized(u64),
    /// The golden checkpoint advanced.
    Advanced {
        /// Previous golden size.
        from: u64,
        /// New golden size.
        to: u64,
    },
    /// The log has not grown.
    Unchanged(u64),
}

/// Errors from a follower tick.
#[derive(Error, Debug)]
pub enum FollowError {
    /// The log could not be reached. Reported as
    /// [`ErrorKind::Unavailable`], which is retryable.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The log served something unparseable.
    #[error(transparent)]
    Note(#[from] NoteError),
    /// The witness refused the checkpoint.
    #[error(transparent)]
    Witness(#[from] WitnessError),
    /// The sink refused the co-signed checkpoint.
    #[error("sink rejected checkpoint: {0}")]
    Sink(#[from] SinkError),
    /// Cancellation was requested.
    #[error("follower cancelled")]
    Cancelled,
}

impl FollowError {
    /// Classifies the error within the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FollowError::Client(_) => ErrorKind::Unavailable,
            FollowError::Note(e) => e.kind(),
            FollowError::Witness(e) => e.kind(),
            FollowError::Sink(e) => e.kind,
            FollowError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Polls one log, feeds its checkpoints to a witness, and optionally
/// forwards the witness's signatures to a sink.
pub struct Follower {
    witness: Arc<Witness>,
    client: Arc<dyn LogClient>,
    log_id: LogId,
    sink: Option<(WitnessId, Arc<dyn CheckpointSink>)>,
    interval: Duration,
}

impl Follower {
    /// Creates a follower polling `log_id` every `interval`.
    pub fn new(
        witness: Arc<Witness>,
        client: Arc<dyn LogClient>,
        log_id: LogId,
        interval: Duration,
    ) -> Self {
        Self {
            witness,
            client,
            log_id,
            sink: None,
            interval,
        }
    }

    /// Forwards each co-signed checkpoint to `sink` as `witness_id`.
    pub fn with_sink(mut self, witness_id: WitnessId, sink: Arc<dyn CheckpointSink>) -> Self {
        self.sink = Some((witness_id, sink));
        self
    }

    /// Fetches the latest checkpoint once and brings the witness up to it.
    pub async fn tick(&self, cancel: &CancellationToken) -> Result<TickOutcome, FollowError> {
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FollowError::Cancelled),
            r = self.client.latest_checkpoint(&self.log_id) => r?,
        };
        let proposed = Checkpoint::parse(Note::parse(&raw)?.text())?;

        let (signed, outcome) = match self.witness.latest_checkpoint(&self.log_id)? {
            None => {
                let signed = self.witness.init(&self.log_id, &raw, cancel)?;
                (signed, TickOutcome::Initialized(proposed.size()))
            }
            Some(current) if proposed.size() > current.size() => {
                let proof = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(FollowError::Cancelled),
                    r = self.client.consistency_proof(&self.log_id, current.size(), proposed.size()) => r?,
                };
                let signed = self.witness.update(&self.log_id, &raw, &proof, cancel)?;
                (
                    signed,
                    TickOutcome::Advanced {
                        from: current.size(),
                        to: proposed.size(),
                    },
                )
            }
            // Equal sizes are still submitted so forks surface; smaller
            // sizes come back as regressions.
            Some(_) => {
                let signed = self.witness.update(&self.log_id, &raw, &[], cancel)?;
                (signed, TickOutcome::Unchanged(proposed.size()))
            }
        };

        if let Some((witness_id, sink)) = &self.sink {
            sink.submit(&self.log_id, witness_id, &signed)?;
        }
        Ok(outcome)
    }

    /// Runs ticks every interval until cancelled or a safety violation.
    ///
    /// Forks and origin mismatches stop the loop and are returned; every
    /// other failure is logged and retried on the next tick.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), FollowError> {
        info!(log = %self.log_id, interval = ?self.interval, "follower started");
        loop {
            match self.tick(&cancel).await {
                Ok(TickOutcome::Unchanged(size)) => debug!(log = %self.log_id, size, "log unchanged"),
                Ok(outcome) => info!(log = %self.log_id, ?outcome, "follower tick"),
                Err(FollowError::Cancelled) | Err(FollowError::Witness(WitnessError::Cancelled)) => {
                    break;
                }
                Err(e) if e.kind().is_safety_violation() => {
                    error!(log = %self.log_id, error = %e, "follower stopping on safety violation");
                    return Err(e);
                }
                Err(e) => warn!(log = %self.log_id, error = %e, kind = ?e.kind(), "follower tick failed"),
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(log = %self.log_id, "follower stopped");
        Ok(())
    }
}
