//! Terminal renderings of a plan

use pgray_plan::{GraphNode, PlanGraph, PlanRecord, Visualization};
use serde_json::{Map, Value, json};
use std::collections::HashSet;

const INDENT: &str = "  ";

/// Renders the graph as an indented tree of node cards
pub fn render_tree(graph: &PlanGraph) -> String {
    let targets: HashSet<&str> = graph.edges.iter().map(|e| e.target.as_str()).collect();
    let mut stack: Vec<(&GraphNode, usize)> = graph
        .nodes
        .iter()
        .filter(|n| !targets.contains(n.id.as_str()))
        .rev()
        .map(|n| (n, 0))
        .collect();

    let mut out = String::new();
    while let Some((node, depth)) = stack.pop() {
        let pad = INDENT.repeat(depth);
        out.push_str(&format!("{pad}{}\n", node.data.label));
        for line in node.data.summary_lines() {
            out.push_str(&format!("{pad}{INDENT}| {line}\n"));
        }

        let children: Vec<_> = graph.children_of(&node.id).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

/// Wraps a parsed plan in the `EXPLAIN (FORMAT JSON)` envelope
pub fn plan_document(
    root: Option<&PlanRecord>,
    planning_time_ms: Option<f64>,
    execution_time_ms: Option<f64>,
) -> Value {
    let Some(root) = root else {
        return json!([]);
    };

    let mut envelope = Map::new();
    envelope.insert("Plan".to_string(), json!(root));
    if let Some(ms) = planning_time_ms {
        envelope.insert("Planning Time".to_string(), json!(ms));
    }
    if let Some(ms) = execution_time_ms {
        envelope.insert("Execution Time".to_string(), json!(ms));
    }
    json!([envelope])
}

/// Serializes the visualization as JSON
pub fn graph_document(visualization: &Visualization, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(visualization)
    } else {
        serde_json::to_string_pretty(visualization)
    }
}
