//! Checkpoint bodies and the envelope codec.

use std::fmt;

use crate::errors::NoteError;
use crate::hash::TreeHash;
use crate::key::NoteVerifier;
use crate::note::{Note, SignerSet};

/// A snapshot of an append-only log: origin, tree size and root hash.
///
/// Equality ignores the extension lines; two checkpoints describe the same
/// log state exactly when origin, size and root hash agree.
#[derive(Clone, Eq)]
pub struct Checkpoint {
    origin: String,
    size: u64,
    root_hash: TreeHash,
    extension: String,
}

impl Checkpoint {
    /// Creates a checkpoint without extension lines.
    pub fn new(origin: impl Into<String>, size: u64, root_hash: TreeHash) -> Result<Self, NoteError> {
        Self::with_extension(origin, size, root_hash, String::new())
    }

    /// Creates a checkpoint carrying opaque extension lines.
    ///
    /// The extension must be empty or a sequence of newline-terminated lines.
    pub fn with_extension(
        origin: impl Into<String>,
        size: u64,
        root_hash: TreeHash,
        extension: impl Into<String>,
    ) -> Result<Self, NoteError> {
        let origin = origin.into();
        let extension = extension.into();
        if origin.is_empty() || origin.contains('\n') {
            return Err(NoteError::MalformedEnvelope(format!("invalid origin {origin:?}")));
        }
        if !extension.is_empty() && !extension.ends_with('\n') {
            return Err(NoteError::MalformedEnvelope(
                "checkpoint extension must end in a newline".into(),
            ));
        }
        Ok(Self {
            origin,
            size,
            root_hash,
            extension,
        })
    }

    /// Parses a checkpoint body.
    pub fn parse(text: &str) -> Result<Self, NoteError> {
        let mut parts = text.splitn(4, '\n');
        let (Some(origin), Some(size), Some(hash), Some(extension)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(NoteError::MalformedEnvelope(
                "checkpoint body has too few lines".into(),
            ));
        };
        if size.is_empty()
            || !size.bytes().all(|b| b.is_ascii_digit())
            || (size.len() > 1 && size.starts_with('0'))
        {
            return Err(NoteError::MalformedEnvelope(format!("invalid tree size {size:?}")));
        }
        let size = size
            .parse::<u64>()
            .map_err(|_| NoteError::MalformedEnvelope(format!("tree size {size} overflows")))?;
        let root_hash = TreeHash::from_base64(hash)
            .map_err(|e| NoteError::MalformedEnvelope(format!("invalid root hash: {e}")))?;
        Self::with_extension(origin, size, root_hash, extension)
    }

    /// Encodes the checkpoint body.
    pub fn marshal(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.origin,
            self.size,
            self.root_hash.to_base64(),
            self.extension
        )
    }

    /// Log origin line.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Number of leaves committed to.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Merkle root at `size`.
    pub fn root_hash(&self) -> &TreeHash {
        &self.root_hash
    }

    /// Opaque extension lines (possibly empty).
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl PartialEq for Checkpoint {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.size == other.size && self.root_hash == other.root_hash
    }
}

impl fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkpoint")
            .field("origin", &self.origin)
            .field("size", &self.size)
            .field("root_hash", &self.root_hash)
            .finish()
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.origin, self.size, self.root_hash)
    }
}

/// Result of decoding a signed checkpoint envelope.
#[derive(Debug, Clone)]
pub struct ParsedCheckpoint {
    /// Decoded checkpoint body.
    pub checkpoint: Checkpoint,
    /// The full note, including signatures that did not verify.
    pub note: Note,
    /// Keys of the supplied verifiers whose signatures verified.
    pub signers: SignerSet,
}

impl ParsedCheckpoint {
    /// True if `verifier`'s signature was among the verified ones.
    pub fn is_signed_by(&self, verifier: &NoteVerifier) -> bool {
        self.signers.contains(&verifier.key_id())
    }
}

/// Decodes a signed checkpoint envelope for a known log.
///
/// Fails only if the envelope or body is malformed, or the origin is not
/// `expected_origin`. Each verifier is checked independently; the caller
/// decides how many verified signers it needs.
pub fn parse_checkpoint(
    envelope: &[u8],
    expected_origin: &str,
    log_verifier: &NoteVerifier,
    witness_verifiers: &[&NoteVerifier],
) -> Result<ParsedCheckpoint, NoteError> {
    let note = Note::parse(envelope)?;
    let checkpoint = Checkpoint::parse(note.text())?;
    if checkpoint.origin() != expected_origin {
        return Err(NoteError::OriginMismatch {
            expected: expected_origin.to_string(),
            actual: checkpoint.origin().to_string(),
        });
    }
    let signers = note.verified_by(std::iter::once(log_verifier).chain(witness_verifiers.iter().copied()));
    Ok(ParsedCheckpoint {
        checkpoint,
        note,
        signers,
    })
}
