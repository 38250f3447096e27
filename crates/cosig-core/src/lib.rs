//! Witness core for verifiable-log checkpoints.
//!
//! This crate provides:
//! - RFC 6962 Merkle hashing and consistency-proof verification
//! - The witness state machine (init, get latest, update) over a pluggable
//!   golden checkpoint store
//! - Log and witness registries loaded from JSON configuration
//! - A cancellable follower that keeps a witness current with a log
//!
//! Core invariants:
//! - A witness never signs a checkpoint smaller than its golden one
//! - A witness never signs two different roots for the same tree size
//! - Updates for one log are serialized; different logs never contend
//!
#![deny(missing_docs)]

/// Log and witness registries.
pub mod config;
/// Error types for witness operations.
pub mod errors;
/// Log follower loop.
pub mod follower;
/// Merkle hashing and consistency proofs.
pub mod merkle;
/// Per-key locking.
pub mod sync;
/// Witness state machine and golden store.
pub mod witness;

pub use config::{Config, ConfigError, LogConfig, LogInfo, LogRegistry, WitnessConfig, WitnessRegistry};
pub use cosig_note::ErrorKind;
pub use errors::{StorageError, WitnessError};
pub use follower::{
    CheckpointSink, ClientError, FollowError, Follower, LogClient, SinkError, TickOutcome,
};
pub use merkle::{
    empty_root, hash_children, hash_leaf, verify_consistency, ConsistencyVerifier, ProofError,
    Rfc6962Verifier,
};
pub use sync::KeyedLocks;
pub use tokio_util::sync::CancellationToken;
pub use witness::{GoldenCheckpoint, GoldenStore, MemoryGoldenStore, Witness};
