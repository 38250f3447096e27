mod common;

use std::sync::Arc;
use std::thread;

use common::{forked_root, root, wid, Fixture, ORIGIN};
use cosig_core::{CancellationToken, CheckpointSink, ErrorKind};
use cosig_note::{generate_key, parse_checkpoint, sign_note, Checkpoint, LogId, Note};
use cosig_store::{
    CheckpointBackend, DistributeOutcome, Distributor, DistributorError, MemoryBackend,
};
use proptest::prelude::*;

fn make_distributor(fx: &Fixture) -> (Distributor, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let distributor = Distributor::new(fx.logs(), fx.witness_registry(), backend.clone());
    (distributor, backend)
}

fn submit(
    d: &Distributor,
    fx: &Fixture,
    witness: &str,
    envelope: &[u8],
) -> Result<DistributeOutcome, DistributorError> {
    d.distribute(&fx.log_id, &wid(witness), envelope, &CancellationToken::new())
}

#[test]
fn test_first_submission_is_stored() {
    let fx = Fixture::new(&["A"]);
    let (d, backend) = make_distributor(&fx);
    let env = fx.cosigned(16, root(16), &["A"]);

    assert_eq!(submit(&d, &fx, "A", &env).unwrap(), DistributeOutcome::Created { size: 16 });
    assert_eq!(d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap(), env);
    assert_eq!(backend.get(&fx.log_id, &wid("A")).unwrap().unwrap().size, 16);
}

#[test]
fn test_larger_submission_overwrites() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);
    submit(&d, &fx, "A", &fx.cosigned(8, root(8), &["A"])).unwrap();

    let env = fx.cosigned(20, root(20), &["A"]);
    assert_eq!(
        submit(&d, &fx, "A", &env).unwrap(),
        DistributeOutcome::Updated { from: 8, to: 20 }
    );
    assert_eq!(d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap(), env);
}

#[test]
fn test_regression_rejected_and_record_kept() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);
    let env16 = fx.cosigned(16, root(16), &["A"]);
    submit(&d, &fx, "A", &env16).unwrap();

    let err = submit(&d, &fx, "A", &fx.cosigned(11, root(11), &["A"])).unwrap_err();
    assert!(matches!(
        err,
        DistributorError::Regression { current: 16, proposed: 11, .. }
    ));
    assert_eq!(d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap(), env16);
}

#[test]
fn test_fork_rejected_and_evidence_recorded() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);
    let env16 = fx.cosigned(16, root(16), &["A"]);
    submit(&d, &fx, "A", &env16).unwrap();

    let env16b = fx.cosigned(16, forked_root(16), &["A"]);
    let err = submit(&d, &fx, "A", &env16b).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForkDetected);
    assert!(err.kind().is_safety_violation());
    assert_eq!(d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap(), env16);

    let evidence = d.fork_evidence(&fx.log_id).unwrap();
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0].size, 16);
    assert_eq!(evidence[0].witness_id, wid("A"));
    assert_eq!(evidence[0].stored, env16);
    assert_eq!(evidence[0].rejected, env16b);
}

#[test]
fn test_resubmission_is_idempotent() {
    let fx = Fixture::new(&["A", "B"]);
    let (d, backend) = make_distributor(&fx);
    let env = fx.cosigned(16, root(16), &["A"]);
    submit(&d, &fx, "A", &env).unwrap();
    let before = backend.records_for_log(&fx.log_id).unwrap();

    // Extra signatures change the bytes, not the checkpoint.
    let env_more = fx.cosigned(16, root(16), &["A", "B"]);
    assert_eq!(
        submit(&d, &fx, "A", &env_more).unwrap(),
        DistributeOutcome::Unchanged { size: 16 }
    );
    assert_eq!(submit(&d, &fx, "A", &env).unwrap(), DistributeOutcome::Unchanged { size: 16 });
    assert_eq!(backend.records_for_log(&fx.log_id).unwrap(), before);
}

#[test]
fn test_requires_log_and_witness_signatures() {
    let fx = Fixture::new(&["A", "B"]);
    let (d, _) = make_distributor(&fx);

    // Signed by B only, submitted as A.
    let env = fx.cosigned(5, root(5), &["B"]);
    let err = submit(&d, &fx, "A", &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureMismatch);

    // Witness signature without the log's.
    let cp = Checkpoint::new(ORIGIN, 5, root(5)).unwrap();
    let env = sign_note(&cp.marshal(), &[fx.witness("A").1]).unwrap();
    let err = submit(&d, &fx, "A", &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureMismatch);

    // Right names, wrong keys.
    let (fake_log, _) = generate_key("L").unwrap();
    let (fake_a, _) = generate_key("A").unwrap();
    let env = sign_note(&cp.marshal(), &[&fake_log, &fake_a]).unwrap();
    let err = submit(&d, &fx, "A", &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureMismatch);

    assert_eq!(
        d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_witness_named_like_log_needs_own_signature() {
    // The witness key is also named "L" but is a different key.
    let fx = Fixture::new(&["L"]);
    let (d, _) = make_distributor(&fx);

    let env = fx.cosigned(16, root(16), &[]);
    let err = submit(&d, &fx, "L", &env).unwrap_err();
    assert!(matches!(err, DistributorError::SignatureMismatch { .. }));
    assert_eq!(
        d.get_checkpoint_witness(&fx.log_id, &wid("L")).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let env = fx.cosigned(16, root(16), &["L"]);
    assert_eq!(submit(&d, &fx, "L", &env).unwrap(), DistributeOutcome::Created { size: 16 });
}

#[test]
fn test_witness_configured_with_log_key_is_rejected() {
    let fx = Fixture::new(&[]);
    let witnesses = Arc::new([(wid("A"), fx.log.verifier())].into_iter().collect());
    let d = Distributor::new(fx.logs(), witnesses, Arc::new(MemoryBackend::new()));

    // One log signature line verifies for both, but it is only one line.
    let env = fx.cosigned(16, root(16), &[]);
    let err = submit(&d, &fx, "A", &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
}

#[test]
fn test_concurrent_submissions_keep_largest() {
    let fx = Fixture::new(&["A", "B"]);
    let (d, backend) = make_distributor(&fx);
    let d = Arc::new(d);
    let log_id = fx.log_id.clone();
    let verifiers: Vec<_> = fx.witnesses.iter().map(|(_, s)| s.verifier()).collect();
    let log_v = fx.log.verifier();

    let mut handles = Vec::new();
    for witness in ["A", "B"] {
        for offset in 0..4u64 {
            // Each thread submits an interleaved, descending run of sizes.
            let envelopes: Vec<_> = (1..=40u64)
                .rev()
                .filter(|size| size % 4 == offset)
                .map(|size| fx.cosigned(size, root(size), &[witness]))
                .collect();
            let d = Arc::clone(&d);
            let log_id = log_id.clone();
            handles.push(thread::spawn(move || {
                let cancel = CancellationToken::new();
                for env in envelopes {
                    match d.distribute(&log_id, &wid(witness), &env, &cancel) {
                        Ok(_) | Err(DistributorError::Regression { .. }) => {}
                        Err(e) => panic!("unexpected error {e}"),
                    }
                }
            }));
        }
    }
    let reader = {
        let d = Arc::clone(&d);
        let log_id = log_id.clone();
        thread::spawn(move || {
            let refs: Vec<_> = verifiers.iter().collect();
            for _ in 0..200 {
                let Ok(combined) = d.get_checkpoint_n(&log_id, 1) else {
                    continue;
                };
                let parsed = parse_checkpoint(&combined, ORIGIN, &log_v, &refs).unwrap();
                let lines = parsed.note.signatures().len();
                assert!(parsed.is_signed_by(&log_v));
                assert!(lines >= 2);
                assert_eq!(parsed.signers.len(), lines, "every line must verify");
                assert_eq!(parsed.checkpoint.root_hash(), &root(parsed.checkpoint.size()));
            }
        })
    };
    for h in handles {
        h.join().unwrap();
    }
    reader.join().unwrap();

    for witness in ["A", "B"] {
        assert_eq!(backend.get(&log_id, &wid(witness)).unwrap().unwrap().size, 40);
    }
    let combined = d.get_checkpoint_n(&log_id, 2).unwrap();
    let body = Checkpoint::parse(Note::parse(&combined).unwrap().text()).unwrap();
    assert_eq!(body.size(), 40);
}

#[test]
fn test_unknown_log_and_witness() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);
    let env = fx.cosigned(5, root(5), &["A"]);
    let cancel = CancellationToken::new();

    let other = LogId::parse("Other").unwrap();
    let err = d.distribute(&other, &wid("A"), &env, &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownLog);
    let err = d.distribute(&fx.log_id, &wid("Z"), &env, &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownWitness);

    assert_eq!(d.get_checkpoint_witness(&other, &wid("A")).unwrap_err().kind(), ErrorKind::UnknownLog);
    assert_eq!(
        d.get_checkpoint_witness(&fx.log_id, &wid("Z")).unwrap_err().kind(),
        ErrorKind::UnknownWitness
    );
    assert_eq!(d.get_checkpoint_n(&other, 1).unwrap_err().kind(), ErrorKind::UnknownLog);
    assert_eq!(d.fork_evidence(&other).unwrap_err().kind(), ErrorKind::UnknownLog);
}

#[test]
fn test_codec_errors_surface() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);

    let err = submit(&d, &fx, "A", b"not a note").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);

    let cp = Checkpoint::new("example.com/elsewhere", 5, root(5)).unwrap();
    let env = sign_note(&cp.marshal(), &[&fx.log, fx.witness("A").1]).unwrap();
    let err = submit(&d, &fx, "A", &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OriginMismatch);
}

#[test]
fn test_cancelled_distribute_leaves_state() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = d
        .distribute(&fx.log_id, &wid("A"), &fx.cosigned(3, root(3), &["A"]), &cancel)
        .unwrap_err();
    assert!(matches!(err, DistributorError::Cancelled));
    assert_eq!(
        d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_get_logs_sorted() {
    let (log_b, _) = generate_key("b-log").unwrap();
    let (log_a, _) = generate_key("a-log").unwrap();
    let logs: cosig_core::LogRegistry = [("b-log", log_b), ("a-log", log_a)]
        .into_iter()
        .map(|(id, signer)| {
            (
                LogId::parse(id).unwrap(),
                cosig_core::LogInfo {
                    origin: id.to_string(),
                    verifier: signer.verifier(),
                },
            )
        })
        .collect();
    let d = Distributor::new(
        Arc::new(logs),
        Arc::new(cosig_core::WitnessRegistry::default()),
        Arc::new(MemoryBackend::new()),
    );
    assert_eq!(
        d.get_logs(),
        vec![LogId::parse("a-log").unwrap(), LogId::parse("b-log").unwrap()]
    );
}

#[test]
fn test_sink_forwards_to_distribute() {
    let fx = Fixture::new(&["A"]);
    let (d, _) = make_distributor(&fx);
    d.submit(&fx.log_id, &wid("A"), &fx.cosigned(4, root(4), &["A"]))
        .unwrap();
    let err = d
        .submit(&fx.log_id, &wid("A"), &fx.cosigned(4, forked_root(4), &["A"]))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ForkDetected);
}

#[test]
fn test_pairs_are_independent() {
    let fx = Fixture::new(&["A", "B"]);
    let (d, _) = make_distributor(&fx);
    submit(&d, &fx, "A", &fx.cosigned(16, root(16), &["A"])).unwrap();
    // B may still report an older size, and a different root than A at 16.
    submit(&d, &fx, "B", &fx.cosigned(10, root(10), &["B"])).unwrap();
    submit(&d, &fx, "B", &fx.cosigned(16, forked_root(16), &["B"])).unwrap();

    let a = Note::parse(&d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap()).unwrap();
    let b = Note::parse(&d.get_checkpoint_witness(&fx.log_id, &wid("B")).unwrap()).unwrap();
    assert_ne!(a.text(), b.text());
}

#[test]
fn test_stored_envelope_is_verbatim() {
    let fx = Fixture::new(&["A", "B"]);
    let (d, _) = make_distributor(&fx);
    let env = fx.cosigned(9, root(9), &["A", "B"]);
    submit(&d, &fx, "A", &env).unwrap();

    let stored = d.get_checkpoint_witness(&fx.log_id, &wid("A")).unwrap();
    assert_eq!(stored, env);
    let parsed = parse_checkpoint(&stored, ORIGIN, &fx.log.verifier(), &[]).unwrap();
    assert_eq!(parsed.checkpoint.size(), 9);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_stored_sizes_never_decrease(
        steps in prop::collection::vec((1u64..40, any::<bool>()), 1..25)
    ) {
        let fx = Fixture::new(&["A"]);
        let (d, backend) = make_distributor(&fx);
        let mut last = 0u64;
        for (size, fork) in steps {
            let r = if fork { forked_root(size) } else { root(size) };
            let env = fx.cosigned(size, r, &["A"]);
            let before = backend.get(&fx.log_id, &wid("A")).unwrap();
            let result = submit(&d, &fx, "A", &env);
            let after = backend.get(&fx.log_id, &wid("A")).unwrap();

            if let Some(rec) = &after {
                prop_assert!(rec.size >= last);
                last = rec.size;
            }
            match result {
                Err(DistributorError::ForkDetected { .. }) | Err(DistributorError::Regression { .. }) => {
                    prop_assert_eq!(before, after);
                }
                Ok(_) => prop_assert!(after.is_some()),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }
    }
}
