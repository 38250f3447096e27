#![allow(dead_code)]

use std::sync::Arc;

use cosig_core::{hash_leaf, LogInfo, LogRegistry, WitnessRegistry};
use cosig_note::{generate_key, Checkpoint, LogId, Note, NoteSigner, TreeHash, WitnessId};

pub const ORIGIN: &str = "example.com/log";

/// One log, a handful of witnesses, and helpers to produce their envelopes.
pub struct Fixture {
    pub log_id: LogId,
    pub log: NoteSigner,
    pub witnesses: Vec<(WitnessId, NoteSigner)>,
}

impl Fixture {
    pub fn new(witness_names: &[&str]) -> Self {
        let (log, _) = generate_key("L").unwrap();
        let witnesses = witness_names
            .iter()
            .map(|name| (WitnessId::parse(*name).unwrap(), generate_key(name).unwrap().0))
            .collect();
        Self {
            log_id: LogId::parse("L").unwrap(),
            log,
            witnesses,
        }
    }

    pub fn logs(&self) -> Arc<LogRegistry> {
        let info = LogInfo {
            origin: ORIGIN.to_string(),
            verifier: self.log.verifier(),
        };
        Arc::new([(self.log_id.clone(), info)].into_iter().collect())
    }

    pub fn witness_registry(&self) -> Arc<WitnessRegistry> {
        Arc::new(
            self.witnesses
                .iter()
                .map(|(id, signer)| (id.clone(), signer.verifier()))
                .collect(),
        )
    }

    pub fn witness(&self, name: &str) -> (&WitnessId, &NoteSigner) {
        self.witnesses
            .iter()
            .find(|(id, _)| id.as_str() == name)
            .map(|(id, s)| (id, s))
            .unwrap()
    }

    /// Envelope for `size`/`root` signed by the log and the named witnesses.
    pub fn cosigned(&self, size: u64, root: TreeHash, witnesses: &[&str]) -> Vec<u8> {
        let cp = Checkpoint::new(ORIGIN, size, root).unwrap();
        let mut note = Note::new(cp.marshal()).unwrap();
        note.sign_with(&self.log);
        for name in witnesses {
            note.sign_with(self.witness(name).1);
        }
        note.to_bytes().unwrap()
    }
}

/// Deterministic stand-in root for a tree size.
pub fn root(size: u64) -> TreeHash {
    hash_leaf(format!("root {size}").as_bytes())
}

/// A different root for the same size.
pub fn forked_root(size: u64) -> TreeHash {
    hash_leaf(format!("forked root {size}").as_bytes())
}

pub fn wid(name: &str) -> WitnessId {
    WitnessId::parse(name).unwrap()
}
