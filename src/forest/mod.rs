//! The decision-node forest: arena storage plus construction from a
//! node-definition document.

mod build;
mod node;

pub use node::{DecisionNode, Edge, Forest, NodeId, Stats};
