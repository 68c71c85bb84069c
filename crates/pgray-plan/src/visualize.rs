//! Plan visualization entry point
//!
//! Accepts EXPLAIN output in either format, finds the plan root and hands it
//! to the graph builder.
//!
//! # Example
//!
//! ```
//! use pgray_plan::visualize::{InputFormat, visualize};
//!
//! let json = r#"[{"Plan": {"Node Type": "Seq Scan", "Relation Name": "users"}}]"#;
//! let result = visualize(json).unwrap();
//!
//! assert_eq!(result.format, InputFormat::Json);
//! assert_eq!(result.graph.nodes[0].data.relation.as_deref(), Some("users"));
//! ```

use crate::config::VisualizerConfig;
use crate::error::{PlanError, Result};
use crate::graph::{IdGenerator, PlanGraph};
use crate::record::PlanRecord;
use crate::text::summary_timings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Key of the plan root inside an EXPLAIN (FORMAT JSON) envelope
pub const PLAN_KEY: &str = "Plan";

const PLANNING_TIME_KEY: &str = "Planning Time";
const EXECUTION_TIME_KEY: &str = "Execution Time";

/// Format of the EXPLAIN output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Decide from the first non-blank character
    #[default]
    Auto,
    Json,
    Text,
}

impl InputFormat {
    /// Resolves `Auto` against the input; other formats are returned as is
    pub fn detect(self, input: &str) -> Self {
        match self {
            Self::Auto => {
                let trimmed = input.trim_start();
                if trimmed.starts_with('[') || trimmed.starts_with('{') {
                    Self::Json
                } else {
                    Self::Text
                }
            }
            other => other,
        }
    }
}

/// A parsed plan tree together with the statement timings
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlan {
    pub format: InputFormat,
    /// `None` for text input with no plan lines
    pub root: Option<PlanRecord>,
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
}

/// Result of visualizing one EXPLAIN output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visualization {
    pub format: InputFormat,
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
    #[serde(flatten)]
    pub graph: PlanGraph,
}

/// Turns EXPLAIN output into plan graphs
#[derive(Debug, Clone, Default)]
pub struct Visualizer {
    config: VisualizerConfig,
    ids: Option<Arc<IdGenerator>>,
}

impl Visualizer {
    pub fn new(config: VisualizerConfig) -> Self {
        Self { config, ids: None }
    }

    /// Draws node identifiers from a long-lived generator so they stay unique
    /// across calls.
    ///
    /// Identifiers then use the generator's prefix; `config.ids.prefix` is
    /// ignored. [`Visualizer::shared_id_generator`] builds one from the
    /// configured prefix.
    pub fn with_id_generator(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Returns a generator using the configured identifier prefix
    pub fn shared_id_generator(&self) -> Arc<IdGenerator> {
        Arc::new(IdGenerator::with_prefix(self.config.ids.prefix.as_str()))
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// Parses the input into a plan tree without building the graph
    pub fn parse_plan(&self, input: &str, format: InputFormat) -> Result<ParsedPlan> {
        let format = format.detect(input);
        tracing::debug!(?format, bytes = input.len(), "Parsing plan");

        match format {
            InputFormat::Json | InputFormat::Auto => {
                let value: Value = serde_json::from_str(input)?;
                let envelope = locate_envelope(&value)?;
                let plan = plan_of(envelope)?;

                Ok(ParsedPlan {
                    format: InputFormat::Json,
                    root: Some(PlanRecord::from_json(plan)),
                    planning_time_ms: envelope.get(PLANNING_TIME_KEY).and_then(Value::as_f64),
                    execution_time_ms: envelope.get(EXECUTION_TIME_KEY).and_then(Value::as_f64),
                })
            }
            InputFormat::Text => {
                let timings = summary_timings(input);
                Ok(ParsedPlan {
                    format,
                    root: self.config.text_parser().parse(input),
                    planning_time_ms: timings.planning_time_ms,
                    execution_time_ms: timings.execution_time_ms,
                })
            }
        }
    }

    /// Parses the input and builds its plan graph
    pub fn visualize(&self, input: &str, format: InputFormat) -> Result<Visualization> {
        let parsed = self.parse_plan(input, format)?;

        let mut builder = self.config.graph_builder();
        if let Some(ids) = &self.ids {
            builder = builder.with_id_generator(Arc::clone(ids));
        }

        let graph = match &parsed.root {
            Some(root) => builder.build(root),
            None => {
                tracing::debug!("No plan lines found; returning an empty graph");
                PlanGraph::default()
            }
        };

        Ok(Visualization {
            format: parsed.format,
            planning_time_ms: parsed.planning_time_ms,
            execution_time_ms: parsed.execution_time_ms,
            graph,
        })
    }
}

/// Returns the object holding `"Plan"`: the first array element, or the
/// value itself
fn locate_envelope(value: &Value) -> Result<&Value> {
    let envelope = match value {
        Value::Array(items) => items.first().ok_or(PlanError::MissingPlan)?,
        other => other,
    };
    if envelope.is_object() {
        Ok(envelope)
    } else {
        Err(PlanError::MissingPlan)
    }
}

fn plan_of(envelope: &Value) -> Result<&Value> {
    envelope
        .get(PLAN_KEY)
        .filter(|plan| plan.is_object())
        .ok_or(PlanError::MissingPlan)
}

/// Returns the plan root object of an EXPLAIN (FORMAT JSON) document
pub fn locate_plan_root(value: &Value) -> Result<&Value> {
    plan_of(locate_envelope(value)?)
}

/// Visualizes input of either format with default settings
pub fn visualize(input: &str) -> Result<Visualization> {
    Visualizer::default().visualize(input, InputFormat::Auto)
}

#[cfg(test)]
mod tests;
