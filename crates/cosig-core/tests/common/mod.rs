#![allow(dead_code)]

use std::sync::Arc;

use cosig_core::{empty_root, hash_children, hash_leaf, LogInfo, LogRegistry};
use cosig_note::{generate_key, sign_note, Checkpoint, LogId, NoteSigner, TreeHash};

/// In-memory Merkle tree built straight from RFC 6962 definitions.
pub struct TestTree {
    leaves: Vec<TreeHash>,
}

impl TestTree {
    pub fn new(size: usize) -> Self {
        Self::with_seed(size, "entry")
    }

    pub fn with_seed(size: usize, seed: &str) -> Self {
        let leaves = (0..size)
            .map(|i| hash_leaf(format!("{seed} {i}").as_bytes()))
            .collect();
        Self { leaves }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn root(&self, size: usize) -> TreeHash {
        mth(&self.leaves[..size])
    }

    /// PROOF(m, D[n]) from RFC 6962 section 2.1.2.
    pub fn consistency(&self, m: usize, n: usize) -> Vec<TreeHash> {
        if m == 0 || m == n {
            return Vec::new();
        }
        subproof(m, &self.leaves[..n], true)
    }
}

fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

fn mth(leaves: &[TreeHash]) -> TreeHash {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            hash_children(&mth(&leaves[..k]), &mth(&leaves[k..]))
        }
    }
}

fn subproof(m: usize, leaves: &[TreeHash], complete: bool) -> Vec<TreeHash> {
    let n = leaves.len();
    if m == n {
        return if complete { Vec::new() } else { vec![mth(leaves)] };
    }
    let k = split_point(n);
    if m <= k {
        let mut proof = subproof(m, &leaves[..k], complete);
        proof.push(mth(&leaves[k..]));
        proof
    } else {
        let mut proof = subproof(m - k, &leaves[k..], false);
        proof.push(mth(&leaves[..k]));
        proof
    }
}

/// A log with a signing key and a precomputed tree.
pub struct TestLog {
    pub id: LogId,
    pub origin: String,
    pub signer: NoteSigner,
    pub tree: TestTree,
}

impl TestLog {
    pub fn new(name: &str) -> Self {
        let (signer, _) = generate_key(name).unwrap();
        Self {
            id: LogId::parse(name).unwrap(),
            origin: format!("example.com/{name}"),
            signer,
            tree: TestTree::new(64),
        }
    }

    pub fn checkpoint(&self, size: usize) -> Checkpoint {
        Checkpoint::new(self.origin.clone(), size as u64, self.tree.root(size)).unwrap()
    }

    /// Log-signed envelope for the tree at `size`.
    pub fn signed(&self, size: usize) -> Vec<u8> {
        self.sign_root(size, self.tree.root(size))
    }

    /// Log-signed envelope claiming an arbitrary root at `size`.
    pub fn sign_root(&self, size: usize, root: TreeHash) -> Vec<u8> {
        let cp = Checkpoint::new(self.origin.clone(), size as u64, root).unwrap();
        sign_note(&cp.marshal(), &[&self.signer]).unwrap()
    }

    pub fn proof(&self, from: usize, to: usize) -> Vec<TreeHash> {
        self.tree.consistency(from, to)
    }

    pub fn info(&self) -> LogInfo {
        LogInfo {
            origin: self.origin.clone(),
            verifier: self.signer.verifier(),
        }
    }
}

pub fn registry(logs: &[&TestLog]) -> Arc<LogRegistry> {
    Arc::new(logs.iter().map(|l| (l.id.clone(), l.info())).collect())
}
