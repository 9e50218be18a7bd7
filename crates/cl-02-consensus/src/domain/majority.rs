//! Strict-majority quorum for PoA block signatures
//!
//! Quorum is computed once from the active-validator count at proposal time,
//! so validator churn during collection cannot move the target.

use serde::{Deserialize, Serialize};

/// `0` for an empty set, otherwise `n / 2 + 1`.
pub fn required_signatures(active_validators: usize) -> usize {
    if active_validators == 0 {
        0
    } else {
        active_validators / 2 + 1
    }
}

/// Quorum target frozen at proposal time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumSnapshot {
    pub active_validators: usize,
    pub required: usize,
}

impl QuorumSnapshot {
    pub fn new(active_validators: usize) -> Self {
        Self {
            active_validators,
            required: required_signatures(active_validators),
        }
    }

    pub fn is_reached(&self, collected: usize) -> bool {
        collected >= self.required
    }

    /// Signatures still missing
    pub fn remaining(&self, collected: usize) -> usize {
        self.required.saturating_sub(collected)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_required_is_smallest_strict_majority(n in 1usize..1_000_000) {
            let required = required_signatures(n);
            prop_assert!(required <= n);
            prop_assert!(required * 2 > n);
            prop_assert!((required - 1) * 2 <= n);
        }

        #[test]
        fn prop_quorum_reached_iff_majority_signed(
            n in 0usize..10_000,
            collected in 0usize..10_000,
        ) {
            let snapshot = QuorumSnapshot::new(n);
            prop_assert_eq!(snapshot.is_reached(collected), n == 0 || collected * 2 > n);
            prop_assert_eq!(snapshot.remaining(collected) == 0, snapshot.is_reached(collected));
        }
    }
}
