//! Metrics Extractor
//!
//! Reads the numeric fields out of the parenthetical that trails each line of
//! text-format EXPLAIN output, e.g.
//! `cost=0.00..12.34 rows=10 width=4) (actual time=0.01..0.05 rows=10 loops=1`.
//!
//! Every field is matched independently and is optional. Extraction never
//! fails: a fragment with nothing recognizable yields [`Metrics::default`].

use regex::{Captures, Regex};
use std::sync::LazyLock;

static COST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"cost=(\d+\.?\d*)\.\.(\d+\.?\d*)").expect("valid regex"));

static ROWS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rows=(\d+)").expect("valid regex"));

static WIDTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"width=(\d+)").expect("valid regex"));

static ACTUAL_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"actual time=(\d+\.?\d*)\.\.(\d+\.?\d*)").expect("valid regex")
});

static LOOPS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"loops=(\d+)").expect("valid regex"));

/// Marker separating an operator from the relation it reads
const RELATION_MARKER: &str = " on ";

/// Numeric fields found in a metrics fragment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// Lower bound of `cost=a..b`
    pub startup_cost: Option<f64>,
    /// Upper bound of `cost=a..b`
    pub total_cost: Option<f64>,
    /// First `rows=n`, which is the planner estimate when costs are shown
    pub rows: Option<u64>,
    /// Estimated row width in bytes, `width=n`
    pub width: Option<u64>,
    /// Lower bound of `actual time=a..b`
    pub actual_startup_time: Option<f64>,
    /// Upper bound of `actual time=a..b`
    pub actual_total_time: Option<f64>,
    /// Number of executions, `loops=n`
    pub loops: Option<u64>,
}

impl Metrics {
    /// Extracts all recognizable fields from a metrics fragment
    pub fn parse(fragment: &str) -> Self {
        let (startup_cost, total_cost) = range(&COST_REGEX, fragment);
        let (actual_startup_time, actual_total_time) = range(&ACTUAL_TIME_REGEX, fragment);

        Self {
            startup_cost,
            total_cost,
            rows: count(&ROWS_REGEX, fragment),
            width: count(&WIDTH_REGEX, fragment),
            actual_startup_time,
            actual_total_time,
            loops: count(&LOOPS_REGEX, fragment),
        }
    }

    /// Returns true if no field was recognized
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Extracts metrics from a fragment; shorthand for [`Metrics::parse`]
pub fn extract_metrics(fragment: &str) -> Metrics {
    Metrics::parse(fragment)
}

/// Derives the relation name from an operator label.
///
/// `"Seq Scan on users"` gives `users`; everything after the first `" on "`
/// is returned. Labels without the marker have no relation.
pub fn relation_name(node_type: &str) -> Option<String> {
    node_type
        .split_once(RELATION_MARKER)
        .map(|(_, relation)| relation)
        .filter(|relation| !relation.is_empty())
        .map(String::from)
}

fn range(regex: &Regex, fragment: &str) -> (Option<f64>, Option<f64>) {
    match regex.captures(fragment) {
        Some(caps) => (float(&caps, 1), float(&caps, 2)),
        None => (None, None),
    }
}

fn count(regex: &Regex, fragment: &str) -> Option<u64> {
    regex
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn float(caps: &Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}
