//! Backward pass: bottom-up expectation aggregation.
//!
//! A leaf folds its path stats into its expected stats verbatim; this is
//! the single point where Path becomes Expected. An internal node's
//! expected stats are the probability-weighted sums of its children's,
//! computed independently per field. MIRR is linearly weighted, not
//! compounded, by design.
//!
//! The pass accumulates onto whatever the forward pass seeded into
//! `expected` (zero, or a NaN MIRR for a late node), so the lateness
//! sentinel survives on internal nodes and poisons every ancestor sum. At
//! a late *leaf* the fold overwrites the sentinel with the path MIRR,
//! keeping `Expected == Path` true for all leaves.

use chrono::TimeDelta;

use crate::forest::{Forest, NodeId};

pub(crate) fn run(forest: &mut Forest) {
    for root in forest.roots().to_vec() {
        visit(forest, root);
    }
}

fn visit(forest: &mut Forest, id: NodeId) {
    if forest.node(id).is_leaf() {
        let node = forest.node_mut(id);
        node.expected = node.path;
        return;
    }

    let edges = forest.node(id).edges.clone();
    for edge in &edges {
        visit(forest, edge.child);
    }

    let mut cash = 0.0;
    let mut duration_ms = 0.0;
    let mut npv = 0.0;
    let mut mirr = 0.0;
    for edge in &edges {
        let child = &forest.node(edge.child).expected;
        cash += child.cash * edge.prob;
        duration_ms += child.duration.num_milliseconds() as f64 * edge.prob;
        npv += child.npv * edge.prob;
        mirr += child.mirr * edge.prob;
    }

    let node = forest.node_mut(id);
    node.expected.cash += cash;
    node.expected.duration = node.expected.duration + TimeDelta::milliseconds(duration_ms as i64);
    node.expected.npv += npv;
    node.expected.mirr += mirr;
}
