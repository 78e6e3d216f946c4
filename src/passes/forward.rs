//! Forward pass: top-down path valuation.
//!
//! Each node inherits its parent's cumulative path stats and a private
//! clone of the parent's timeline, appends its own rate changes and cash
//! events, and recalculates. Siblings therefore never observe each other's
//! events, and a node's timeline is fully determined by its path from the
//! root.

use chrono::{DateTime, Utc};

use crate::forest::{Forest, NodeId};

use super::Warning;

pub(crate) fn run(forest: &mut Forest, now: DateTime<Utc>, warn: &mut dyn FnMut(Warning)) {
    // Pre-order over an explicit stack; children pushed in reverse so the
    // first edge is processed first.
    let mut stack: Vec<NodeId> = forest.roots().iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        let inherited = forest.node(id).parent.map(|pid| {
            let parent = forest.node(pid);
            (parent.timeline.clone(), parent.path)
        });

        let node = forest.node_mut(id);
        if let Some((timeline, path)) = inherited {
            node.timeline = timeline;
            node.path.cash = path.cash;
            node.path.duration = path.duration;
        }

        let start = now + node.path.duration;
        node.path.cash += node.node.cash;
        node.path.duration = node.path.duration + node.node.duration;
        let end = now + node.path.duration;
        node.start = Some(start);
        node.end = Some(end);

        // Rate overrides take effect at this node's start, before its cash
        // events. 0 means "no override".
        if node.fin_rate != 0.0 {
            node.timeline.record_rate_change(start, Some(node.fin_rate), None);
        }
        if node.re_rate != 0.0 {
            node.timeline.record_rate_change(start, None, Some(node.re_rate));
        }
        for i in 1..=node.repeat {
            let date = start + node.period.duration * i as i32;
            node.timeline.record_cash_event(date, node.period.cash);
        }

        node.timeline.recalculate();
        node.path.npv = node.timeline.npv();
        node.path.mirr = node.timeline.mirr();

        if let Some(due) = node.due {
            if end > due {
                warn(Warning::Late {
                    node: node.name.clone(),
                    end,
                    due,
                });
                // Sentinel: contaminates every probability-weighted
                // ancestor sum in the backward pass.
                node.expected.mirr = f64::NAN;
            }
        }

        for edge in node.edges.iter().rev() {
            stack.push(edge.child);
        }
    }
}
