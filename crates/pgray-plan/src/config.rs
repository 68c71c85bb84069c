//! Visualizer Configuration
//!
//! Settings are read from TOML. Every field has a default, so an empty file
//! (or no file at all) gives the reference behavior:
//!
//! ```toml
//! [layout]
//! x_spacing = 250.0
//! y_spacing = 150.0
//!
//! [ids]
//! prefix = "node"
//!
//! [text]
//! roots = "first"            # or "forest"
//! skip_summary_lines = false
//! ```

use crate::error::Result;
use crate::graph::{DEFAULT_ID_PREFIX, PlanGraphBuilder};
use crate::layout::{DEFAULT_X_SPACING, DEFAULT_Y_SPACING, FanOutLayout};
use crate::text::{RootPolicy, TextPlanParser};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub layout: LayoutConfig,
    pub ids: IdConfig,
    pub text: TextConfig,
}

impl VisualizerConfig {
    /// Parses a configuration from TOML
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Returns a graph builder configured from these settings
    pub fn graph_builder(&self) -> PlanGraphBuilder {
        PlanGraphBuilder::new()
            .with_id_prefix(self.ids.prefix.as_str())
            .with_layout(FanOutLayout::from(&self.layout))
    }

    /// Returns a text parser configured from these settings
    pub fn text_parser(&self) -> TextPlanParser {
        TextPlanParser::new()
            .with_root_policy(self.text.roots)
            .skip_summary_lines(self.text.skip_summary_lines)
    }
}

/// Spacing of the fan-out layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub x_spacing: f64,
    pub y_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            x_spacing: DEFAULT_X_SPACING,
            y_spacing: DEFAULT_Y_SPACING,
        }
    }
}

impl From<&LayoutConfig> for FanOutLayout {
    fn from(config: &LayoutConfig) -> Self {
        FanOutLayout::new(config.x_spacing, config.y_spacing)
    }
}

/// Node identifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    pub prefix: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

/// Text-format parsing settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub roots: RootPolicy,
    pub skip_summary_lines: bool,
}
