//! Bounded per-log retention of fork evidence.

use std::collections::{HashMap, VecDeque};

use cosig_note::LogId;

use crate::traits::ForkEvidence;

/// Default number of fork evidence entries kept per log.
pub const DEFAULT_FORK_CAPACITY: usize = 16;

/// Ring buffer of fork evidence per log; the oldest entry is dropped once a
/// log reaches capacity.
#[derive(Debug)]
pub struct ForkRing {
    capacity: usize,
    entries: HashMap<LogId, VecDeque<ForkEvidence>>,
}

impl ForkRing {
    /// Creates a ring keeping at most `capacity` entries per log.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// Appends evidence, evicting the oldest entry for the log if full.
    pub fn push(&mut self, evidence: ForkEvidence) {
        let ring = self.entries.entry(evidence.log_id.clone()).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(evidence);
    }

    /// Whether the ring already holds evidence of the same rejection:
    /// same witness, size and rejected envelope. Timestamps are ignored.
    pub fn contains(&self, evidence: &ForkEvidence) -> bool {
        self.entries.get(&evidence.log_id).is_some_and(|ring| {
            ring.iter().any(|e| {
                e.witness_id == evidence.witness_id
                    && e.size == evidence.size
                    && e.rejected == evidence.rejected
            })
        })
    }

    /// Entries for a log, oldest first.
    pub fn for_log(&self, log_id: &LogId) -> Vec<ForkEvidence> {
        self.entries
            .get(log_id)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for ForkRing {
    fn default() -> Self {
        Self::new(DEFAULT_FORK_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosig_note::WitnessId;

    fn evidence(log: &str, size: u64) -> ForkEvidence {
        ForkEvidence {
            log_id: LogId::parse(log).unwrap(),
            witness_id: WitnessId::parse("w1").unwrap(),
            size,
            stored: vec![],
            rejected: vec![],
            observed_at_ms: 0,
        }
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut ring = ForkRing::new(3);
        for size in 1..=5 {
            ring.push(evidence("FooLog", size));
        }
        let sizes: Vec<_> = ring
            .for_log(&LogId::parse("FooLog").unwrap())
            .iter()
            .map(|e| e.size)
            .collect();
        assert_eq!(sizes, vec![3, 4, 5]);
    }

    #[test]
    fn contains_ignores_timestamp_and_stored() {
        let mut ring = ForkRing::new(3);
        ring.push(evidence("FooLog", 7));

        let mut again = evidence("FooLog", 7);
        again.observed_at_ms = 99;
        again.stored = b"other".to_vec();
        assert!(ring.contains(&again));

        let mut different = evidence("FooLog", 7);
        different.rejected = b"another fork".to_vec();
        assert!(!ring.contains(&different));
        assert!(!ring.contains(&evidence("FooLog", 8)));
        assert!(!ring.contains(&evidence("BarLog", 7)));
    }

    #[test]
    fn logs_have_separate_rings() {
        let mut ring = ForkRing::new(1);
        ring.push(evidence("FooLog", 1));
        ring.push(evidence("BarLog", 2));
        assert_eq!(ring.for_log(&LogId::parse("FooLog").unwrap()).len(), 1);
        assert_eq!(ring.for_log(&LogId::parse("BarLog").unwrap())[0].size, 2);
        assert!(ring.for_log(&LogId::parse("BazLog").unwrap()).is_empty());
    }
}
