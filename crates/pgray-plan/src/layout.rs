//! Node placement for the plan graph
//!
//! Positions are layout hints for the renderer. [`FanOutLayout`] spreads each
//! parent's children symmetrically on the row below it; it does not avoid
//! collisions in deep or wide trees. Swap in another [`LayoutStrategy`] to
//! change placement without touching graph construction.

use serde::{Deserialize, Serialize};

/// A 2-D point in renderer coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Assigns a child's position from its parent's
pub trait LayoutStrategy: Send + Sync {
    /// Returns the position of child `index` out of `count` siblings
    fn position(&self, parent: Position, index: usize, count: usize) -> Position;
}

/// Default horizontal distance between siblings
pub const DEFAULT_X_SPACING: f64 = 250.0;

/// Default vertical distance between a parent and its children
pub const DEFAULT_Y_SPACING: f64 = 150.0;

/// Places child `i` of `n` at `x + (i - n/2) * x_spacing`, one row down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanOutLayout {
    pub x_spacing: f64,
    pub y_spacing: f64,
}

impl FanOutLayout {
    pub fn new(x_spacing: f64, y_spacing: f64) -> Self {
        Self {
            x_spacing,
            y_spacing,
        }
    }
}

impl Default for FanOutLayout {
    fn default() -> Self {
        Self::new(DEFAULT_X_SPACING, DEFAULT_Y_SPACING)
    }
}

impl LayoutStrategy for FanOutLayout {
    fn position(&self, parent: Position, index: usize, count: usize) -> Position {
        let offset = index as f64 - count as f64 / 2.0;
        Position::new(
            parent.x + offset * self.x_spacing,
            parent.y + self.y_spacing,
        )
    }
}
