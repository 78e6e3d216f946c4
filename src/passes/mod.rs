//! The two valuation passes and their driver.
//!
//! [`value`] runs the forward pass (top-down path valuation), then edge
//! probability normalization, then the backward pass (bottom-up expectation
//! aggregation). Valuation is a pure function of the forest and the
//! explicit `now` timestamp; nothing here reads a clock.

mod backward;
mod forward;
mod normalize;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::forest::Forest;

pub use normalize::PROB_TOLERANCE;

/// A non-fatal anomaly, reported through the caller-supplied sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A node's computed end date falls after its declared due date. The
    /// node's expected MIRR is set to NaN as a sentinel.
    Late {
        node: String,
        end: DateTime<Utc>,
        due: DateTime<Utc>,
    },
    /// A node's outgoing branch probabilities did not sum to 1 and were
    /// rescaled in place.
    RenormalizedProbabilities { node: String, sum: f64 },
    /// A rendered expected MIRR fell outside the forest's finite heat
    /// range.
    MirrOutsideRange {
        node: String,
        mirr: f64,
        lo: f64,
        hi: f64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Late { node, end, due } => {
                write!(f, "late: {node} end {end} due {due}")
            }
            Warning::RenormalizedProbabilities { node, .. } => {
                write!(f, "normalizing path probabilities: {node}")
            }
            Warning::MirrOutsideRange {
                node,
                mirr,
                lo,
                hi,
            } => {
                write!(f, "mirr {mirr} outside range [{lo}, {hi}] at {node}")
            }
        }
    }
}

/// Values the whole forest in place: per-node path NPV/MIRR, normalized
/// branch probabilities, and probability-weighted expected stats.
///
/// Identical `(forest, now)` inputs produce bit-identical results; callers
/// running concurrent valuations must give each run its own forest.
pub fn value(forest: &mut Forest, now: DateTime<Utc>, warn: &mut dyn FnMut(Warning)) {
    forward::run(forest, now, warn);
    normalize::run(forest, warn);
    backward::run(forest);
}
