//! prospect: valuation of mutually-exclusive future decision paths.
//!
//! A node-definition document describes a forest of decisions, each node
//! carrying recurring cash flows, financing/reinvestment rate overrides,
//! and branch probabilities. The engine builds per-node cash-flow
//! timelines along every root-to-node path, derives NPV and MIRR for each
//! path, and aggregates probability-weighted expectations bottom-up.
//!
//! ```no_run
//! use chrono::Utc;
//! use prospect::{model::Definitions, forest::Forest, passes::value};
//!
//! # fn main() -> Result<(), prospect::error::Error> {
//! let defs = Definitions::from_yaml("plan:\n  cash: '-100'\n  days: '30'\n")?;
//! let mut forest = Forest::from_definitions(&defs)?;
//! value(&mut forest, Utc::now(), &mut |w| eprintln!("{w}"));
//! let root = forest.node(forest.roots()[0]);
//! println!("npv {} mirr {}", root.path.npv, root.path.mirr);
//! # Ok(())
//! # }
//! ```
//!
//! Valuation is synchronous, single-threaded, and a pure function of the
//! document and the explicit reference timestamp.

pub mod error;
pub mod expr;
pub mod forest;
pub mod model;
pub mod passes;
pub mod render;
pub mod timeline;

pub use error::Error;
pub use forest::{DecisionNode, Edge, Forest, NodeId, Stats};
pub use model::{Definitions, NodeDef};
pub use passes::{value, Warning};
pub use timeline::{Event, Timeline};
