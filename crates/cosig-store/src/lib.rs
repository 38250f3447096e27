//! Distributor store and quorum combiner for witnessed checkpoints.
//!
//! This crate provides:
//! - `CheckpointBackend` trait for per-`(log, witness)` checkpoint records
//! - In-memory and journal-backed implementations, both also usable as a
//!   witness golden store
//! - The `Distributor`: monotonic ingestion with fork detection and bounded
//!   fork evidence retention
//! - Quorum combination of witness signatures into one multi-signed note
//!
//! The journal backend persists through `cosig-journal` and replays the file
//! into memory at startup.

#![deny(missing_docs)]

/// Distributor ingestion and lookups.
pub mod distributor;
/// Error types for store operations.
pub mod error;
/// Fork evidence retention.
pub mod evidence;
/// Journal-backed storage implementation.
pub mod journal;
/// In-memory storage implementation.
pub mod memory;
/// Quorum combination.
pub mod quorum;
/// Storage backend traits.
pub mod traits;

pub use distributor::{DistributeOutcome, Distributor};
pub use error::{DistributorError, StoreError};
pub use evidence::{ForkRing, DEFAULT_FORK_CAPACITY};
pub use journal::{JournalBackend, JournalOptions};
pub use memory::MemoryBackend;
pub use traits::{CheckpointBackend, ForkEvidence, StoredCheckpoint};
