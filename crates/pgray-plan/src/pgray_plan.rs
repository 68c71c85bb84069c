//! PG-Ray Plan - PostgreSQL EXPLAIN parsing and plan graph construction
//!
//! This crate provides functionality for:
//! - Parsing `EXPLAIN (FORMAT JSON)` and default text EXPLAIN output
//! - Extracting cost, row and timing metrics from plan lines
//! - Flattening plan trees into positioned nodes and edges for rendering

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod metrics;
pub mod record;
pub mod text;
pub mod visualize;

pub use config::*;
pub use error::*;
pub use graph::*;
pub use layout::*;
pub use metrics::*;
pub use record::*;
pub use text::*;
pub use visualize::*;
