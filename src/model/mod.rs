//! The node-definition document: the external input format describing a
//! forest of decision paths.
//!
//! A document is a flat mapping of node name to definition; tree shape is
//! implied by each definition's `paths` mapping (child name to branch
//! probability). Roots are the names never referenced as a child. Both maps
//! are `BTreeMap` so iteration (and therefore construction, valuation, and
//! rendering) is deterministic regardless of document key order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One raw node definition. The cash/days/repeat fields are arithmetic
/// expressions, evaluated during forest construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    #[serde(default)]
    pub desc: String,
    /// Cash amount per occurrence (signed; negative = outflow).
    #[serde(default = "zero_expr")]
    pub cash: String,
    /// Days per occurrence.
    #[serde(default = "zero_expr")]
    pub days: String,
    /// Occurrence count; must evaluate to an exact integer.
    #[serde(default = "one_expr")]
    pub repeat: String,
    /// Financing-rate override; 0 means unset.
    #[serde(default)]
    pub fin_rate: f64,
    /// Reinvestment-rate override; 0 means unset.
    #[serde(default)]
    pub re_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Child name to branch probability.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, f64>,
}

impl Default for NodeDef {
    fn default() -> Self {
        Self {
            desc: String::new(),
            cash: zero_expr(),
            days: zero_expr(),
            repeat: one_expr(),
            fin_rate: 0.0,
            re_rate: 0.0,
            due: None,
            paths: BTreeMap::new(),
        }
    }
}

fn zero_expr() -> String {
    "0".to_string()
}

fn one_expr() -> String {
    "1".to_string()
}

/// A parsed node-definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definitions(pub BTreeMap<String, NodeDef>);

impl Definitions {
    pub fn from_yaml(buf: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(buf)?)
    }

    pub fn from_json(buf: &str) -> Result<Self> {
        Ok(serde_json::from_str(buf)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn get(&self, name: &str) -> Option<&NodeDef> {
        self.0.get(name)
    }

    /// Names never referenced as a child of any other node, in name order.
    pub fn root_names(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self.0.keys().map(String::as_str).collect();
        for def in self.0.values() {
            roots.retain(|name| !def.paths.contains_key(*name));
        }
        roots
    }

    /// Rejects documents where a node is reachable as its own descendant.
    ///
    /// Runs on the raw name-reference graph, before any construction, so a
    /// cyclic document can never send the recursive builder into an
    /// infinite descent. References to missing nodes are ignored here; they
    /// are reported by construction, which can name the referencing parent.
    pub fn check_acyclic(&self) -> Result<()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (name, def) in &self.0 {
            graph.add_node(name.as_str());
            for child in def.paths.keys() {
                if self.0.contains_key(child) {
                    graph.add_edge(name.as_str(), child.as_str(), ());
                }
            }
        }
        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(Error::CyclicDefinition {
                name: cycle.node_id().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
# a tiny two-branch plan
plan:
  desc: decide
  paths:
    build: 0.6
    buy: 0.4
build:
  desc: build it
  cash: -1000 * 12
  days: "365.2425"
  repeat: "1"
buy:
  desc: buy it
  cash: "-20000"
  days: "30"
"#;

    #[test]
    fn parses_yaml_document() {
        let defs = Definitions::from_yaml(DOC).unwrap();
        assert_eq!(defs.0.len(), 3);
        let plan = defs.get("plan").unwrap();
        assert_eq!(plan.paths.len(), 2);
        assert_eq!(plan.paths["build"], 0.6);
        // defaults
        assert_eq!(plan.cash, "0");
        assert_eq!(plan.repeat, "1");
        assert_eq!(defs.get("buy").unwrap().repeat, "1");
    }

    #[test]
    fn accepts_json_documents() {
        let defs = Definitions::from_json(
            r#"{"solo": {"desc": "one node", "cash": "100", "days": "0"}}"#,
        )
        .unwrap();
        assert_eq!(defs.root_names(), vec!["solo"]);
    }

    #[test]
    fn roots_are_names_never_referenced_as_children() {
        let defs = Definitions::from_yaml(DOC).unwrap();
        assert_eq!(defs.root_names(), vec!["plan"]);
    }

    #[test]
    fn yaml_round_trip_preserves_nodes() {
        let defs = Definitions::from_yaml(DOC).unwrap();
        let out = defs.to_yaml().unwrap();
        let defs2 = Definitions::from_yaml(&out).unwrap();
        assert_eq!(defs, defs2);
    }

    #[test]
    fn cycle_is_rejected() {
        let doc = r#"
a:
  paths:
    b: 1.0
b:
  paths:
    a: 1.0
"#;
        let defs = Definitions::from_yaml(doc).unwrap();
        let err = defs.check_acyclic().unwrap_err();
        assert!(matches!(err, Error::CyclicDefinition { .. }), "{err}");
    }

    #[test]
    fn self_reference_is_rejected() {
        let doc = "a:\n  paths:\n    a: 1.0\n";
        let defs = Definitions::from_yaml(doc).unwrap();
        assert!(defs.check_acyclic().is_err());
        // and it is also not a root
        assert!(defs.root_names().is_empty());
    }

    #[test]
    fn missing_child_reference_passes_cycle_check() {
        let doc = "a:\n  paths:\n    ghost: 1.0\n";
        let defs = Definitions::from_yaml(doc).unwrap();
        assert!(defs.check_acyclic().is_ok());
    }
}
