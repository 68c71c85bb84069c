//! Text Plan Parser
//!
//! Rebuilds the plan tree from PostgreSQL's default (text) EXPLAIN output:
//!
//! ```text
//! Sort  (cost=10.00..10.25 rows=100)
//!   ->  Seq Scan on orders  (cost=0.00..5.00 rows=100)
//! ```
//!
//! The column of a line's `->` marker is its depth. An indentation stack
//! seeded with a sentinel at depth -1 finds each line's parent: entries are
//! closed while they sit at the same or a deeper column than the new line.
//!
//! # Example
//!
//! ```
//! use pgray_plan::text::parse_text_plan;
//!
//! let text = "Sort  (cost=10.00..10.25 rows=100)\n  ->  Seq Scan on orders  (cost=0.00..5.00 rows=100)";
//! let root = parse_text_plan(text).unwrap();
//! assert_eq!(root.node_type, "Sort");
//! assert_eq!(root.children[0].relation.as_deref(), Some("orders"));
//! ```

use crate::metrics::{Metrics, relation_name};
use crate::record::PlanRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Marker placed before every child step
pub const DEPTH_MARKER: &str = "->";

/// Label of the synthetic record returned for forest output
pub const FOREST_ROOT_LABEL: &str = "Root";

// "<type>  (<metrics>)" with the parenthetical as the last token
static LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\((.*)\)$").expect("valid regex"));

static SUMMARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Planning|Execution) [Tt]ime:\s*(\d+\.?\d*)").expect("valid regex")
});

/// What to return when the text holds more than one top-level step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Return the first top-level step; later ones are dropped
    #[default]
    First,
    /// Wrap all top-level steps in a synthetic "Root" record
    Forest,
}

/// Timings printed after the plan by EXPLAIN ANALYZE
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryTimings {
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
}

struct StackEntry {
    record: PlanRecord,
    indent: isize,
}

/// Parser for text-format EXPLAIN output
#[derive(Debug, Clone, Default)]
pub struct TextPlanParser {
    roots: RootPolicy,
    skip_summary_lines: bool,
}

impl TextPlanParser {
    /// Creates a parser that returns the first top-level step
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy for multiple top-level steps
    pub fn with_root_policy(mut self, roots: RootPolicy) -> Self {
        self.roots = roots;
        self
    }

    /// Drops `Planning Time:`/`Execution Time:` lines before building the tree
    pub fn skip_summary_lines(mut self, skip: bool) -> Self {
        self.skip_summary_lines = skip;
        self
    }

    /// Parses plan text into a record tree.
    ///
    /// Returns `None` when the text has no non-blank lines.
    pub fn parse(&self, text: &str) -> Option<PlanRecord> {
        let mut stack = vec![StackEntry {
            record: PlanRecord::new(FOREST_ROOT_LABEL),
            indent: -1,
        }];
        let mut line_count = 0usize;

        let lines = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !(self.skip_summary_lines && is_summary_line(line)));

        for line in lines {
            line_count += 1;
            let indent = indentation(line);
            let record = parse_line(line);

            while stack.last().is_some_and(|top| top.indent >= indent) {
                close_top(&mut stack);
            }
            stack.push(StackEntry { record, indent });
        }

        while stack.len() > 1 {
            close_top(&mut stack);
        }

        let sentinel = stack.pop()?.record;
        let top_level = sentinel.children.len();
        tracing::debug!(lines = line_count, top_level, "Parsed text plan");

        match (self.roots, top_level) {
            (_, 0) => None,
            (RootPolicy::Forest, n) if n > 1 => Some(sentinel),
            _ => {
                if top_level > 1 {
                    tracing::warn!(
                        dropped = top_level - 1,
                        "Text plan has several top-level steps; keeping the first"
                    );
                }
                sentinel.children.into_iter().next()
            }
        }
    }
}

/// Parses plan text with the default policy (first top-level step)
pub fn parse_text_plan(text: &str) -> Option<PlanRecord> {
    TextPlanParser::new().parse(text)
}

/// Reads `Planning Time:` and `Execution Time:` summary lines
pub fn summary_timings(text: &str) -> SummaryTimings {
    let mut timings = SummaryTimings::default();
    for line in text.lines() {
        let Some(caps) = SUMMARY_REGEX.captures(line.trim()) else {
            continue;
        };
        let ms = caps.get(2).and_then(|m| m.as_str().parse().ok());
        match caps.get(1).map(|m| m.as_str()) {
            Some("Planning") => timings.planning_time_ms = ms,
            Some("Execution") => timings.execution_time_ms = ms,
            _ => {}
        }
    }
    timings
}

/// Builds a childless record from one line of plan text
fn parse_line(line: &str) -> PlanRecord {
    let content = line.replacen(DEPTH_MARKER, "", 1);
    let content = content.trim();

    let (node_type, metrics) = match LINE_REGEX.captures(content) {
        Some(caps) => {
            let node_type = caps.get(1).map_or("", |m| m.as_str()).trim();
            let fragment = caps.get(2).map_or("", |m| m.as_str());
            (node_type, Metrics::parse(fragment))
        }
        None => (content, Metrics::default()),
    };

    if metrics.is_empty() {
        tracing::trace!(line = content, "No metrics recognized on plan line");
    }

    PlanRecord {
        node_type: node_type.to_string(),
        startup_cost: metrics.startup_cost,
        total_cost: metrics.total_cost,
        rows: metrics.rows,
        width: metrics.width,
        actual_startup_time: metrics.actual_startup_time,
        actual_total_time: metrics.actual_total_time,
        loops: metrics.loops,
        relation: relation_name(node_type),
        children: Vec::new(),
        raw: None,
    }
}

/// Column of the first depth marker, or 0 when the line has none
fn indentation(line: &str) -> isize {
    line.find(DEPTH_MARKER)
        .map_or(0, |idx| line[..idx].chars().count() as isize)
}

fn is_summary_line(line: &str) -> bool {
    SUMMARY_REGEX.is_match(line.trim())
}

/// Pops the top entry and appends its record to the entry below
fn close_top(stack: &mut Vec<StackEntry>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(done) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.record.children.push(done.record);
    }
}

#[cfg(test)]
mod tests;
