mod common;

use common::TestTree;
use cosig_core::{verify_consistency, ProofError};
use proptest::prelude::*;

#[test]
fn test_every_pair_up_to_forty_verifies() {
    let tree = TestTree::new(40);
    for n in 1..=40 {
        for m in 0..=n {
            let proof = tree.consistency(m, n);
            let root_m = tree.root(m);
            let root_n = tree.root(n);
            assert!(
                verify_consistency(m as u64, n as u64, &root_m, &root_n, &proof).is_ok(),
                "consistency {m} -> {n} failed"
            );
        }
    }
}

#[test]
fn test_proof_against_other_tree_fails() {
    let tree = TestTree::new(16);
    let other = TestTree::with_seed(16, "forked");
    let proof = tree.consistency(5, 16);
    let result = verify_consistency(5, 16, &tree.root(5), &other.root(16), &proof);
    assert_eq!(result, Err(ProofError::RootMismatch));
}

#[test]
fn test_extra_hash_rejected() {
    let tree = TestTree::new(16);
    let mut proof = tree.consistency(6, 13);
    proof.push(tree.root(1));
    assert!(verify_consistency(6, 13, &tree.root(6), &tree.root(13), &proof).is_err());
}

#[test]
fn test_empty_proof_for_growth_rejected() {
    let tree = TestTree::new(8);
    assert_eq!(
        verify_consistency(3, 8, &tree.root(3), &tree.root(8), &[]),
        Err(ProofError::WrongLength("empty proof"))
    );
}

proptest! {
    #[test]
    fn prop_generated_proofs_verify(n in 1usize..200, m_frac in 0.0f64..=1.0) {
        let tree = TestTree::new(n);
        let m = ((n as f64) * m_frac) as usize;
        let proof = tree.consistency(m, n);
        prop_assert!(verify_consistency(m as u64, n as u64, &tree.root(m), &tree.root(n), &proof).is_ok());
    }

    #[test]
    fn prop_tampered_proofs_fail(n in 3usize..100, m_frac in 0.1f64..0.9, idx in any::<prop::sample::Index>(), bit in 0usize..256) {
        let tree = TestTree::new(n);
        let m = (((n as f64) * m_frac) as usize).clamp(1, n - 1);
        let mut proof = tree.consistency(m, n);
        prop_assume!(!proof.is_empty());
        let i = idx.index(proof.len());
        let mut bytes = *proof[i].as_bytes();
        bytes[bit / 8] ^= 1 << (bit % 8);
        proof[i] = cosig_note::TreeHash::from_bytes(bytes);
        prop_assert!(verify_consistency(m as u64, n as u64, &tree.root(m), &tree.root(n), &proof).is_err());
    }
}
