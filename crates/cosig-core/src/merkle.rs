//! RFC 6962 Merkle hashing and consistency-proof verification.

use cosig_note::{Checkpoint, TreeHash};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Domain prefix for leaf hashes.
pub const LEAF_HASH_PREFIX: u8 = 0x00;
/// Domain prefix for interior node hashes.
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash of a leaf: `SHA-256(0x00 || data)`.
pub fn hash_leaf(data: &[u8]) -> TreeHash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_HASH_PREFIX]);
    hasher.update(data);
    TreeHash::from_bytes(hasher.finalize().into())
}

/// Hash of an interior node: `SHA-256(0x01 || left || right)`.
pub fn hash_children(left: &TreeHash, right: &TreeHash) -> TreeHash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_HASH_PREFIX]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    TreeHash::from_bytes(hasher.finalize().into())
}

/// Root of the empty tree: `SHA-256("")`.
pub fn empty_root() -> TreeHash {
    TreeHash::from_bytes(Sha256::digest([]).into())
}

/// Reasons a consistency proof is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// The second tree is smaller than the first.
    #[error("tree size {second} is smaller than {first}")]
    SizeRegression {
        /// Size of the older tree.
        first: u64,
        /// Size of the newer tree.
        second: u64,
    },
    /// A proof was supplied where none is needed.
    #[error("expected empty proof, got {len} hashes")]
    UnexpectedProof {
        /// Number of hashes supplied.
        len: usize,
    },
    /// The proof has the wrong number of hashes for the two sizes.
    #[error("proof has wrong length: {0}")]
    WrongLength(&'static str),
    /// The recomputed roots differ from the claimed ones.
    #[error("recomputed root does not match")]
    RootMismatch,
}

/// Verifies that a tree of `size2` leaves with root `root2` extends the
/// tree of `size1` leaves with root `root1` (RFC 9162, section 2.1.4.2).
pub fn verify_consistency(
    size1: u64,
    size2: u64,
    root1: &TreeHash,
    root2: &TreeHash,
    proof: &[TreeHash],
) -> Result<(), ProofError> {
    if size2 < size1 {
        return Err(ProofError::SizeRegression {
            first: size1,
            second: size2,
        });
    }
    if size1 == size2 {
        if !proof.is_empty() {
            return Err(ProofError::UnexpectedProof { len: proof.len() });
        }
        return if root1 == root2 {
            Ok(())
        } else {
            Err(ProofError::RootMismatch)
        };
    }
    // Every tree extends the empty tree.
    if size1 == 0 {
        if !proof.is_empty() {
            return Err(ProofError::UnexpectedProof { len: proof.len() });
        }
        return Ok(());
    }
    if proof.is_empty() {
        return Err(ProofError::WrongLength("empty proof"));
    }

    let (seed, rest) = if size1.is_power_of_two() {
        (*root1, proof)
    } else {
        (proof[0], &proof[1..])
    };

    let mut fn_ = size1 - 1;
    let mut sn = size2 - 1;
    while fn_ & 1 == 1 {
        fn_ >>= 1;
        sn >>= 1;
    }

    let mut fr = seed;
    let mut sr = seed;
    for c in rest {
        if sn == 0 {
            return Err(ProofError::WrongLength("proof too long"));
        }
        if fn_ & 1 == 1 || fn_ == sn {
            fr = hash_children(c, &fr);
            sr = hash_children(c, &sr);
            while fn_ & 1 == 0 && fn_ != 0 {
                fn_ >>= 1;
                sn >>= 1;
            }
        } else {
            sr = hash_children(&sr, c);
        }
        fn_ >>= 1;
        sn >>= 1;
    }

    if sn != 0 {
        return Err(ProofError::WrongLength("proof too short"));
    }
    if fr != *root1 || sr != *root2 {
        return Err(ProofError::RootMismatch);
    }
    Ok(())
}

/// Decides whether one checkpoint is an append-only extension of another.
pub trait ConsistencyVerifier: Send + Sync {
    /// Returns `Ok(())` if `proof` shows `to` extends `from`.
    fn verify(&self, from: &Checkpoint, to: &Checkpoint, proof: &[TreeHash])
        -> Result<(), ProofError>;
}

/// Consistency verification with RFC 6962 hashing rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc6962Verifier;

impl ConsistencyVerifier for Rfc6962Verifier {
    fn verify(
        &self,
        from: &Checkpoint,
        to: &Checkpoint,
        proof: &[TreeHash],
    ) -> Result<(), ProofError> {
        verify_consistency(from.size(), to.size(), from.root_hash(), to.root_hash(), proof)
    }
}
