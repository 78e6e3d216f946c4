//! Builds a [`Forest`] from a node-definition document.

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::expr;
use crate::model::Definitions;
use crate::timeline::{days_to_delta, Timeline};

use super::node::{DecisionNode, Edge, Forest, NodeId, Stats};

impl Forest {
    /// Instantiates every root and, recursively, its children.
    ///
    /// Fatal conditions (no partial forest escapes): a referenced child
    /// missing from the document, an expression that fails to evaluate, a
    /// repeat expression that is not an exact integer, or a cyclic
    /// document.
    pub fn from_definitions(defs: &Definitions) -> Result<Forest> {
        defs.check_acyclic()?;
        let mut forest = Forest::default();
        for name in defs.root_names() {
            let root = build_node(&mut forest, defs, name, None)?;
            forest.roots.push(root);
        }
        Ok(forest)
    }
}

fn build_node(
    forest: &mut Forest,
    defs: &Definitions,
    name: &str,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let def = match defs.get(name) {
        Some(def) => def,
        None => {
            let referenced_by = parent
                .map(|p| forest.node(p).name.clone())
                .unwrap_or_default();
            return Err(Error::MissingNode {
                name: name.to_string(),
                referenced_by,
            });
        }
    };

    let cash = eval_field(name, "cash", &def.cash)?;
    let days = eval_field(name, "days", &def.days)?;
    let repeat = eval_field(name, "repeat", &def.repeat)?;
    if repeat.fract() != 0.0 || !repeat.is_finite() {
        return Err(Error::InvalidRepeat {
            node: name.to_string(),
            value: repeat,
        });
    }
    let repeat = (repeat as i64).max(1);

    let period = Stats {
        cash,
        duration: days_to_delta(days),
        ..Stats::default()
    };
    let node_stats = Stats {
        cash: period.cash * repeat as f64,
        duration: period.duration * repeat as i32,
        ..Stats::default()
    };

    let id = NodeId::new(forest.nodes.len());
    forest.nodes.push(DecisionNode {
        name: name.to_string(),
        desc: def.desc.clone(),
        repeat,
        fin_rate: def.fin_rate,
        re_rate: def.re_rate,
        due: def.due,
        period,
        node: node_stats,
        path: Stats::default(),
        expected: Stats::default(),
        start: None,
        end: None,
        timeline: Timeline::new(),
        parent,
        edges: SmallVec::new(),
    });

    // BTreeMap order makes edge order name-sorted and runs reproducible.
    let mut edges: SmallVec<[Edge; 4]> = SmallVec::new();
    for (child_name, &prob) in &def.paths {
        let child = build_node(forest, defs, child_name, Some(id))?;
        edges.push(Edge { prob, child });
    }
    forest.node_mut(id).edges = edges;

    Ok(id)
}

fn eval_field(node: &str, field: &'static str, input: &str) -> Result<f64> {
    expr::eval(input).map_err(|source| Error::Expression {
        node: node.to_string(),
        field,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn forest(doc: &str) -> Result<Forest> {
        Forest::from_definitions(&Definitions::from_yaml(doc).unwrap())
    }

    #[test]
    fn builds_single_root() {
        let f = forest("solo:\n  desc: just one\n  cash: '100'\n  days: '30'\n").unwrap();
        assert_eq!(f.len(), 1);
        let root = f.node(f.roots()[0]);
        assert_eq!(root.name, "solo");
        assert_eq!(root.period.cash, 100.0);
        assert_eq!(root.period.duration, TimeDelta::days(30));
        assert_eq!(root.repeat, 1);
        assert!(root.parent.is_none());
        assert!(root.is_leaf());
    }

    #[test]
    fn node_stats_scale_period_by_repeat() {
        let f = forest("job:\n  cash: -1500 * 2\n  days: '7'\n  repeat: 3 + 1\n").unwrap();
        let root = f.node(f.roots()[0]);
        assert_eq!(root.repeat, 4);
        assert_eq!(root.node.cash, -12000.0);
        assert_eq!(root.node.duration, TimeDelta::days(28));
    }

    #[test]
    fn repeat_below_one_is_coerced_to_one() {
        let f = forest("n:\n  cash: '1'\n  days: '1'\n  repeat: '-3'\n").unwrap();
        assert_eq!(f.node(f.roots()[0]).repeat, 1);
    }

    #[test]
    fn fractional_repeat_is_fatal() {
        let err = forest("n:\n  cash: '1'\n  days: '1'\n  repeat: '2.5'\n").unwrap_err();
        assert!(
            matches!(err, Error::InvalidRepeat { ref node, value } if node == "n" && value == 2.5),
            "{err}"
        );
    }

    #[test]
    fn repeat_that_divides_to_an_integer_is_fine() {
        let f = forest("n:\n  cash: '1'\n  days: '1'\n  repeat: 6 / 2\n").unwrap();
        assert_eq!(f.node(f.roots()[0]).repeat, 3);
    }

    #[test]
    fn bad_expression_is_fatal_and_names_the_field() {
        let err = forest("n:\n  cash: '1 +'\n  days: '1'\n").unwrap_err();
        match err {
            Error::Expression { node, field, .. } => {
                assert_eq!(node, "n");
                assert_eq!(field, "cash");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_child_is_fatal_and_names_the_parent() {
        let err = forest("a:\n  cash: '0'\n  days: '0'\n  paths:\n    ghost: 1.0\n").unwrap_err();
        match err {
            Error::MissingNode {
                name,
                referenced_by,
            } => {
                assert_eq!(name, "ghost");
                assert_eq!(referenced_by, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn children_are_wired_with_parent_backrefs() {
        let doc = r#"
root:
  cash: '0'
  days: '0'
  paths:
    left: 0.5
    right: 0.5
left:
  cash: '10'
  days: '1'
right:
  cash: '20'
  days: '2'
"#;
        let f = forest(doc).unwrap();
        assert_eq!(f.len(), 3);
        let root_id = f.roots()[0];
        let root = f.node(root_id);
        assert_eq!(root.edges.len(), 2);
        // name-sorted edge order
        assert_eq!(f.node(root.edges[0].child).name, "left");
        assert_eq!(f.node(root.edges[1].child).name, "right");
        for edge in &root.edges {
            assert_eq!(f.node(edge.child).parent, Some(root_id));
        }
    }

    #[test]
    fn cyclic_document_is_fatal() {
        let err = forest("a:\n  paths:\n    b: 1.0\nb:\n  paths:\n    a: 1.0\n").unwrap_err();
        assert!(matches!(err, Error::CyclicDefinition { .. }));
    }
}
