//! Edge-probability normalization.
//!
//! Runs between the forward and backward passes so the backward pass can
//! stay a pure reduction: any mutation of edge weights happens here, in one
//! explicit step, and is reported through the warning sink.

use crate::forest::{Forest, NodeId};

use super::Warning;

/// Branch-probability sums farther than this from 1 get rescaled.
pub const PROB_TOLERANCE: f64 = 1e-3;

pub(crate) fn run(forest: &mut Forest, warn: &mut dyn FnMut(Warning)) {
    for idx in 0..forest.len() {
        let node = forest.node_mut(NodeId::new(idx));
        if node.edges.is_empty() {
            continue;
        }
        let sum: f64 = node.edges.iter().map(|e| e.prob).sum();
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            warn(Warning::RenormalizedProbabilities {
                node: node.name.clone(),
                sum,
            });
            for edge in &mut node.edges {
                edge.prob /= sum;
            }
        }
    }
}
