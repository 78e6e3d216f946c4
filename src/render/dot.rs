//! Graphviz DOT rendering of a valued forest.
//!
//! Pure string generation; the output is fed to `dot`/`xdot` or any other
//! Graphviz consumer. Node identifiers are arena indices (`n0`, `n1`, ...)
//! so identical forests render to identical text.

use std::fmt::Write;

use chrono::{DateTime, TimeDelta, Utc};

use crate::forest::{DecisionNode, Forest, NodeId};
use crate::passes::Warning;

/// The finite range of expected MIRR across the forest, for the heat
/// scale. Non-finite values are skipped; a forest with no finite expected
/// MIRR at all yields the empty `(MAX, -MAX)` range, which renders every
/// node in the out-of-range color.
pub fn mirr_range(forest: &Forest) -> (f64, f64) {
    let mut lo = f64::MAX;
    let mut hi = -f64::MAX;
    for (_, node) in forest.iter() {
        let mirr = node.expected.mirr;
        if mirr.is_finite() {
            lo = lo.min(mirr);
            hi = hi.max(mirr);
        }
    }
    (lo, hi)
}

/// Renders the forest as a DOT digraph. Out-of-range MIRR values are
/// reported through `warn` and drawn in the fallback color.
pub fn to_dot(forest: &Forest, warn: &mut dyn FnMut(Warning), top_to_bottom: bool) -> String {
    let (lo, hi) = mirr_range(forest);
    let mut out = String::new();
    out.push_str("digraph {\n");
    let _ = writeln!(
        out,
        "\trankdir=\"{}\";",
        if top_to_bottom { "TB" } else { "LR" }
    );

    // Arena order is pre-order from the roots.
    for (id, node) in forest.iter() {
        write_node(&mut out, id, node, lo, hi, warn);
    }
    for (id, node) in forest.iter() {
        write_edges(&mut out, forest, id, node);
    }

    out.push_str("}\n");
    out
}

fn write_node(
    out: &mut String,
    id: NodeId,
    node: &DecisionNode,
    lo: f64,
    hi: f64,
    warn: &mut dyn FnMut(Warning),
) {
    let mirr = node.expected.mirr;
    let mut hue = 0.0;
    let mut fill = "white".to_string();
    if mirr.is_finite() {
        let value;
        if mirr < lo || mirr > hi {
            warn(Warning::MirrOutsideRange {
                node: node.name.clone(),
                mirr,
                lo,
                hi,
            });
            value = 0.4;
        } else if mirr > 0.0 {
            hue = 20.0 / 360.0 + 100.0 / 360.0 * mirr / hi;
            value = (mirr / hi).max(0.4);
        } else {
            hue = 60.0 / 360.0 * (mirr - lo) / lo.abs();
            value = ((0.0 - mirr) / (0.0 - lo)).max(0.4);
        }
        // hi == 0 or lo == 0 degenerates the scale
        if hue.is_nan() {
            hue = 0.0;
        }
        fill = format!("{hue:.3} 1.0 {value:.3}");
    }

    let mut dates = format!("{} - {}", fmt_date(node.start), fmt_date(node.end));
    let mut font_color = None;
    if let Some(due) = node.due {
        dates = format!("{dates} \\n due: {}", due.format("%Y-%m-%d"));
        if node.end.is_some_and(|end| end > due) {
            font_color = Some(format!("{hue:.3} 1.0 1.0"));
            fill = "0.0 0.0 0.3".to_string();
        }
    }

    let label = build_label(node, &dates);
    let font = font_color
        .map(|c| format!(", fontcolor=\"{c}\""))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "\tn{} [shape=\"record\", style=\"filled\", fillcolor=\"{}\"{}, label=\"{}\"];",
        id.index(),
        fill,
        font,
        label
    );
}

/// Builds the record label: name, description, dates, then a table of
/// node/past/future rows over the metrics that are actually present.
fn build_label(node: &DecisionNode, dates: &str) -> String {
    let n = &node.node;
    let p = &node.path;
    let e = &node.expected;

    let include_cash = !(n.cash == 0.0 && p.cash == 0.0 && e.cash == 0.0);
    let include_duration = !(n.duration.is_zero() && p.duration.is_zero() && e.duration.is_zero());
    let include_npv = !(n.npv == 0.0 && p.npv == 0.0 && e.npv == 0.0);
    // The node row never shows a MIRR, so only past and future decide.
    let include_mirr = !((p.mirr.is_nan() || p.mirr == 0.0) && (e.mirr.is_nan() || e.mirr == 0.0));

    // Top-left cell is always blank.
    let mut headers = vec![String::new()];
    let mut node_fields = Vec::new();
    let mut past_fields = Vec::new();
    let mut future_fields = Vec::new();

    if include_cash {
        headers.push("cash".into());
        node_fields.push(comma(n.cash));
        past_fields.push(comma(p.cash));
        future_fields.push(comma(e.cash));
    }
    if include_duration {
        headers.push("duration".into());
        node_fields.push(fmt_days(n.duration));
        past_fields.push(fmt_days(p.duration));
        future_fields.push(fmt_days(e.duration));
    }
    if include_npv {
        headers.push("npv".into());
        node_fields.push(comma(n.npv));
        past_fields.push(comma(p.npv));
        future_fields.push(comma(e.npv));
    }
    if include_mirr {
        headers.push("mirr".into());
        node_fields.push(String::new());
        past_fields.push(format!("{:.1}%", p.mirr));
        future_fields.push(format!("{:.1}%", e.mirr));
    }

    let header_row = headers.join("|");
    let node_row = format!("node     | {}", node_fields.join(" | "));
    let past_row = format!("past     | {}", past_fields.join(" | "));
    let future_row = format!("future   | {}", future_fields.join(" | "));

    format!(
        "{} \\n {} \\n {} | {{ {{{}}} | {{{}}} | {{{}}} | {{{}}} }}",
        escape_record(&node.name),
        escape_record(&node.desc),
        dates,
        header_row,
        node_row,
        past_row,
        future_row
    )
}

fn write_edges(out: &mut String, forest: &Forest, id: NodeId, node: &DecisionNode) {
    // The critical child extends this node's path the furthest.
    let mut critical = None;
    let mut max_extra = TimeDelta::zero();
    for edge in &node.edges {
        let extra = forest.node(edge.child).path.duration - node.path.duration;
        if extra > max_extra {
            max_extra = extra;
            critical = Some(edge.child);
        }
    }

    for edge in &node.edges {
        let color = if critical == Some(edge.child) {
            ", color=\"red\""
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "\tn{} -> n{} [label=\"{:.2}\", penwidth=\"{:.2}\"{}];",
            id.index(),
            edge.child.index(),
            edge.prob,
            (edge.prob + 0.1).sqrt() * 10.0,
            color
        );
    }
}

fn fmt_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

fn fmt_days(d: TimeDelta) -> String {
    format!("{:.0} days", d.num_milliseconds() as f64 / 86_400_000.0)
}

/// Truncates to a whole number and groups digits by thousands.
fn comma(n: f64) -> String {
    let whole = n as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Escapes characters significant inside a DOT record label.
fn escape_record(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '|' | '{' | '}' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
