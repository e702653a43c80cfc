//! Per-validator signing history, one outcome per processed block.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use crate::error::{MonitorError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigningOutcome {
    Missed,
    Signed,
    Proposed,
}

/// The commit of one block height, ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPointer {
    pub height: u64,
    /// `None` when the proposer of `height` was not observed.
    pub proposer_address_hex: Option<String>,
    pub commit_signer_addresses_hex: HashSet<String>,
    /// Header time of the block that carried this commit, i.e. `height + 1`.
    pub timestamp: DateTime<Utc>,
}

impl BlockPointer {
    pub fn outcome_for(&self, address_hex: &str) -> SigningOutcome {
        if !self.commit_signer_addresses_hex.contains(address_hex) {
            SigningOutcome::Missed
        } else if self.proposer_address_hex.as_deref() == Some(address_hex) {
            SigningOutcome::Proposed
        } else {
            SigningOutcome::Signed
        }
    }
}

/// Signing outcomes keyed by validator address.
///
/// Heights must arrive strictly sequentially. With a non-zero capacity the
/// oldest outcome of every sequence is dropped once it is full; capacity `0`
/// keeps the whole session in memory.
pub struct HistoryTracker {
    sequences: HashMap<String, VecDeque<SigningOutcome>>,
    capacity: usize,
    last_height: Option<u64>,
    blocks_recorded: u64,
}

impl HistoryTracker {
    pub fn new<I, S>(addresses: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sequences: addresses
                .into_iter()
                .map(|address| (address.into(), VecDeque::new()))
                .collect(),
            capacity,
            last_height: None,
            blocks_recorded: 0,
        }
    }

    /// Append one outcome for every known validator.
    pub fn record_block(&mut self, block: &BlockPointer) -> Result<()> {
        if let Some(last) = self.last_height {
            if block.height != last + 1 {
                return Err(MonitorError::HeightOutOfOrder {
                    expected: last + 1,
                    got: block.height,
                });
            }
        }

        for (address, sequence) in self.sequences.iter_mut() {
            if self.capacity > 0 && sequence.len() >= self.capacity {
                sequence.pop_front();
            }
            sequence.push_back(block.outcome_for(address));
        }

        self.last_height = Some(block.height);
        self.blocks_recorded += 1;
        debug!(
            "Recorded height {} ({} signers)",
            block.height,
            block.commit_signer_addresses_hex.len()
        );
        Ok(())
    }

    pub fn sequence_for(&self, address_hex: &str) -> Option<&VecDeque<SigningOutcome>> {
        self.sequences.get(address_hex)
    }

    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    pub fn blocks_recorded(&self) -> u64 {
        self.blocks_recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(height: u64, proposer: Option<&str>, signers: &[&str]) -> BlockPointer {
        BlockPointer {
            height,
            proposer_address_hex: proposer.map(str::to_string),
            commit_signer_addresses_hex: signers.iter().map(|s| s.to_string()).collect(),
            timestamp: Utc::now(),
        }
    }

    fn outcomes(tracker: &HistoryTracker, address: &str) -> Vec<SigningOutcome> {
        tracker.sequence_for(address).unwrap().iter().copied().collect()
    }

    #[test]
    fn test_signed_missed_proposed() {
        let mut tracker = HistoryTracker::new(["V", "W"], 0);

        tracker.record_block(&pointer(10, Some("W"), &["V", "W"])).unwrap();
        tracker.record_block(&pointer(11, Some("W"), &["W"])).unwrap();
        tracker.record_block(&pointer(12, Some("V"), &["V", "W"])).unwrap();

        assert_eq!(
            outcomes(&tracker, "V"),
            vec![SigningOutcome::Signed, SigningOutcome::Missed, SigningOutcome::Proposed]
        );
        assert_eq!(
            outcomes(&tracker, "W"),
            vec![SigningOutcome::Proposed, SigningOutcome::Proposed, SigningOutcome::Signed]
        );
        assert_eq!(tracker.last_height(), Some(12));
        assert_eq!(tracker.blocks_recorded(), 3);
    }

    #[test]
    fn test_proposer_absent_from_commit_is_missed() {
        let mut tracker = HistoryTracker::new(["V"], 0);
        tracker.record_block(&pointer(1, Some("V"), &[])).unwrap();
        assert_eq!(outcomes(&tracker, "V"), vec![SigningOutcome::Missed]);
    }

    #[test]
    fn test_unknown_proposer_never_proposes() {
        let mut tracker = HistoryTracker::new(["V"], 0);
        tracker.record_block(&pointer(1, None, &["V"])).unwrap();
        assert_eq!(outcomes(&tracker, "V"), vec![SigningOutcome::Signed]);
    }

    #[test]
    fn test_gap_and_repeat_are_rejected() {
        let mut tracker = HistoryTracker::new(["V"], 0);
        tracker.record_block(&pointer(5, None, &["V"])).unwrap();

        let gap = tracker.record_block(&pointer(7, None, &["V"]));
        assert!(matches!(gap, Err(MonitorError::HeightOutOfOrder { expected: 6, got: 7 })));

        let repeat = tracker.record_block(&pointer(5, None, &["V"]));
        assert!(repeat.is_err());

        assert_eq!(outcomes(&tracker, "V").len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut tracker = HistoryTracker::new(["V"], 2);
        tracker.record_block(&pointer(1, None, &[])).unwrap();
        tracker.record_block(&pointer(2, None, &["V"])).unwrap();
        tracker.record_block(&pointer(3, Some("V"), &["V"])).unwrap();

        assert_eq!(
            outcomes(&tracker, "V"),
            vec![SigningOutcome::Signed, SigningOutcome::Proposed]
        );
        assert_eq!(tracker.blocks_recorded(), 3);
    }

    #[test]
    fn test_unknown_address() {
        let tracker = HistoryTracker::new(["V"], 0);
        assert!(tracker.sequence_for("X").is_none());
    }
}
