//! Byzantine quorum arithmetic.
//!
//! With at most `f` faulty oracles:
//! - `FPlusOne`: at least one honest oracle is included
//! - `TwoFPlusOne`: honest oracles form a majority of the responders

use crate::types::AttributedObservation;

/// Quorum kinds used by plugins to decide `observation_quorum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quorum {
    FPlusOne,
    TwoFPlusOne,
}

impl Quorum {
    /// Minimum number of responses that satisfies this quorum.
    pub fn threshold(self, f: usize) -> usize {
        match self {
            Quorum::FPlusOne => f + 1,
            Quorum::TwoFPlusOne => 2 * f + 1,
        }
    }

    /// True if `count` responses satisfy this quorum.
    pub fn is_reached(self, f: usize, count: usize) -> bool {
        count >= self.threshold(f)
    }
}

/// True if the attributed observations satisfy `quorum`.
pub fn observation_count_reaches_quorum(
    quorum: Quorum,
    f: usize,
    aos: &[AttributedObservation],
) -> bool {
    quorum.is_reached(f, aos.len())
}
