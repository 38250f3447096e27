//! Signed note envelopes and the checkpoint codec.
//!
//! A checkpoint is a three-line body (origin, tree size, base64 root hash,
//! then optional extension lines) wrapped in a signed note. This crate parses
//! and produces those envelopes, manages Ed25519 note keys, and reports which
//! of a caller-supplied set of verifiers signed a given envelope.
//!
#![deny(missing_docs)]

/// Checkpoint bodies and the envelope codec.
pub mod checkpoint;
/// Shared error taxonomy and codec errors.
pub mod errors;
/// Merkle tree hash type.
pub mod hash;
/// Log and witness identifiers.
pub mod identifiers;
/// Ed25519 note keys.
pub mod key;
/// Signed note envelopes.
pub mod note;
/// Validation helpers used by note primitives.
pub mod validation;

pub use checkpoint::{parse_checkpoint, Checkpoint, ParsedCheckpoint};
pub use errors::{ErrorKind, NoteError};
pub use hash::{TreeHash, HASH_SIZE};
pub use identifiers::{LogId, WitnessId};
pub use key::{generate_key, key_hash, KeyId, NoteSigner, NoteVerifier};
pub use note::{sign_note, Note, NoteSignature, SignerSet};
pub use validation::ValidationError;
