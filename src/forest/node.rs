//! Arena storage for the decision-node forest.
//!
//! Nodes live in a dense `Vec` and address each other by index: children
//! are owned `(probability, NodeId)` edges, the parent back-reference is a
//! plain non-owning `NodeId`. Upward navigation without ownership cycles.

use chrono::{DateTime, TimeDelta, Utc};
use smallvec::SmallVec;

use crate::timeline::Timeline;

/// A stable index into a [`Forest`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// One metric bundle: total cash, calendar duration, and the NPV/MIRR of
/// the timeline that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub cash: f64,
    pub duration: TimeDelta,
    pub npv: f64,
    pub mirr: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            cash: 0.0,
            duration: TimeDelta::zero(),
            npv: 0.0,
            mirr: 0.0,
        }
    }
}

/// An outgoing branch: conditional probability of taking it, and the child
/// it leads to. The child is owned exclusively through this edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub prob: f64,
    pub child: NodeId,
}

/// One decision node, carrying four stat bundles:
///
/// - `period`: one occurrence of this node's cash flow
/// - `node`: `period` scaled by `repeat`
/// - `path`: cumulative from the root through this node (forward pass)
/// - `expected`: probability-weighted over this node's future (backward pass)
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionNode {
    pub name: String,
    pub desc: String,
    /// Occurrence count, always >= 1.
    pub repeat: i64,
    /// Financing-rate override; 0 means inherit.
    pub fin_rate: f64,
    /// Reinvestment-rate override; 0 means inherit.
    pub re_rate: f64,
    pub due: Option<DateTime<Utc>>,

    pub period: Stats,
    pub node: Stats,
    pub path: Stats,
    pub expected: Stats,

    /// Set by the forward pass: `now + parent path duration`.
    pub start: Option<DateTime<Utc>>,
    /// Set by the forward pass: `now + own path duration`.
    pub end: Option<DateTime<Utc>>,
    /// The cash-event ledger for the path from the root through this node.
    pub timeline: Timeline,

    pub parent: Option<NodeId>,
    pub edges: SmallVec<[Edge; 4]>,
}

impl DecisionNode {
    pub fn is_leaf(&self) -> bool {
        self.edges.is_empty()
    }
}

/// The node arena plus its root set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    pub(crate) nodes: Vec<DecisionNode>,
    pub(crate) roots: Vec<NodeId>,
}

impl Forest {
    pub fn node(&self, id: NodeId) -> &DecisionNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DecisionNode {
        &mut self.nodes[id.index()]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arena (pre-order) sequence.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DecisionNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i), n))
    }
}
