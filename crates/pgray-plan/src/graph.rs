//! Plan Graph Builder
//!
//! Flattens a [`PlanRecord`] tree into the node and edge lists a graph
//! renderer consumes. Nodes and edges come out in pre-order (a parent before
//! any of its descendants, siblings in plan order). Every node except the
//! top one has exactly one incoming edge.
//!
//! # Example
//!
//! ```
//! use pgray_plan::graph::PlanGraphBuilder;
//! use pgray_plan::record::PlanRecord;
//!
//! let root = PlanRecord::new("Hash Join").with_child(PlanRecord::new("Seq Scan"));
//! let graph = PlanGraphBuilder::new().build(&root);
//!
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges[0].source, "node-0");
//! assert_eq!(graph.edges[0].target, "node-1");
//! ```

use crate::layout::{FanOutLayout, LayoutStrategy, Position};
use crate::record::{NodeCategory, PlanRecord};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Renderer component used to draw plan nodes
pub const PLAN_NODE_TYPE: &str = "customPlanNode";

/// Renderer edge style
pub const PLAN_EDGE_TYPE: &str = "smoothstep";

/// Default prefix of generated node identifiers
pub const DEFAULT_ID_PREFIX: &str = "node";

/// Generates `"{prefix}-{n}"` identifiers from a monotonic counter.
///
/// A builder without a shared generator creates a fresh one per build, so
/// identifiers restart at `node-0`. Share one through an `Arc` to keep
/// identifiers unique across builds, including concurrent ones.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ID_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 0)
    }

    /// Creates a generator whose first identifier is `"{prefix}-{first}"`
    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(first),
        }
    }

    /// Returns the next unused identifier
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }

    /// Returns the counter value of the next identifier; for a generator
    /// starting at 0 this is how many have been handed out
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Display payload of a plan node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNodeData {
    /// Operator label
    pub label: String,
    /// Total cost, 0 when the plan does not report it
    pub cost: f64,
    /// Estimated rows, 0 when the plan does not report it
    pub rows: u64,
    /// Actual total time in milliseconds, only for EXPLAIN ANALYZE plans
    pub time: Option<f64>,
    pub relation: Option<String>,
    pub category: NodeCategory,
    /// The step's own fields, for a details view
    pub details: Value,
}

impl GraphNodeData {
    pub fn from_record(record: &PlanRecord) -> Self {
        Self {
            label: record.node_type.clone(),
            cost: record.total_cost.unwrap_or(0.0),
            rows: record.rows.unwrap_or(0),
            time: record.actual_total_time,
            relation: record.relation.clone(),
            category: record.operator().category(),
            details: record.details(),
        }
    }

    /// Returns the lines shown on the node card, below the label
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        if let Some(relation) = &self.relation {
            lines.push(relation.clone());
        }
        lines.push(format!("Cost: {:.2}", self.cost));
        lines.push(format!("Rows: {}", self.rows));
        if let Some(time) = self.time {
            lines.push(format!("Time: {:.3}ms", time));
        }
        lines
    }
}

/// A positioned plan node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub position: Position,
    pub data: GraphNodeData,
}

impl GraphNode {
    pub fn new(id: String, position: Position, record: &PlanRecord) -> Self {
        Self {
            id,
            node_type: PLAN_NODE_TYPE,
            position,
            data: GraphNodeData::from_record(record),
        }
    }
}

/// A directed parent-to-child edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: &'static str,
    pub animated: bool,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("edge-{}-{}", source, target),
            source,
            target,
            edge_type: PLAN_EDGE_TYPE,
            animated: true,
        }
    }
}

/// Flat node and edge lists for one plan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl PlanGraph {
    /// Returns true if there is nothing to display
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by identifier
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the direct children of a node, in plan order
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id)
            .filter_map(move |e| self.node(&e.target))
    }
}

/// Record waiting to be emitted, with what its parent decided for it
struct Pending<'r> {
    record: &'r PlanRecord,
    parent: Option<String>,
    position: Position,
}

/// Builds [`PlanGraph`]s from plan records
pub struct PlanGraphBuilder {
    ids: Option<Arc<IdGenerator>>,
    id_prefix: String,
    layout: Box<dyn LayoutStrategy>,
}

impl PlanGraphBuilder {
    /// Creates a builder with per-build identifiers and the fan-out layout
    pub fn new() -> Self {
        Self {
            ids: None,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            layout: Box::new(FanOutLayout::default()),
        }
    }

    /// Draws identifiers from a shared generator instead of a per-build one
    pub fn with_id_generator(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Sets the prefix of per-build identifiers
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Replaces the placement strategy
    pub fn with_layout(mut self, layout: impl LayoutStrategy + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    /// Builds the graph of a whole plan, rooted at the origin
    pub fn build(&self, root: &PlanRecord) -> PlanGraph {
        self.build_from(root, None, Position::default())
    }

    /// Builds the graph of a subtree hanging off `parent` at `origin`.
    ///
    /// When `parent` is given, an edge from it to the subtree root is emitted.
    pub fn build_from(&self, root: &PlanRecord, parent: Option<&str>, origin: Position) -> PlanGraph {
        let mut graph = PlanGraph::default();
        self.build_into(root, parent, origin, &mut graph);
        graph
    }

    /// Appends the subtree's nodes and edges to `graph`.
    ///
    /// Without a shared generator, numbering continues past the highest
    /// identifier with this builder's prefix already in `graph` or `parent`.
    pub fn build_into(
        &self,
        root: &PlanRecord,
        parent: Option<&str>,
        origin: Position,
        graph: &mut PlanGraph,
    ) {
        match &self.ids {
            Some(ids) => self.walk(root, parent, origin, ids, graph),
            None => {
                let first = self.next_free_index(parent, graph);
                let ids = IdGenerator::starting_at(self.id_prefix.as_str(), first);
                self.walk(root, parent, origin, &ids, graph);
            }
        }
        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Built plan graph"
        );
    }

    /// Returns the first counter value not used by `graph` or `parent`
    fn next_free_index(&self, parent: Option<&str>, graph: &PlanGraph) -> u64 {
        let prefix = format!("{}-", self.id_prefix);
        graph
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(parent)
            .filter_map(|id| id.strip_prefix(prefix.as_str())?.parse::<u64>().ok())
            .max()
            .map_or(0, |n| n + 1)
    }

    fn walk(
        &self,
        root: &PlanRecord,
        parent: Option<&str>,
        origin: Position,
        ids: &IdGenerator,
        graph: &mut PlanGraph,
    ) {
        let mut stack = vec![Pending {
            record: root,
            parent: parent.map(String::from),
            position: origin,
        }];

        while let Some(Pending {
            record,
            parent,
            position,
        }) = stack.pop()
        {
            let id = ids.next_id();
            if let Some(parent) = parent {
                graph.edges.push(GraphEdge::new(parent, id.as_str()));
            }

            let count = record.children.len();
            // Reverse so the first child is emitted next
            for (index, child) in record.children.iter().enumerate().rev() {
                stack.push(Pending {
                    record: child,
                    parent: Some(id.clone()),
                    position: self.layout.position(position, index, count),
                });
            }

            graph.nodes.push(GraphNode::new(id, position, record));
        }
    }
}

impl Default for PlanGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlanGraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanGraphBuilder")
            .field("ids", &self.ids)
            .field("id_prefix", &self.id_prefix)
            .finish_non_exhaustive()
    }
}

/// Builds a graph with default settings
pub fn build_plan_graph(root: &PlanRecord) -> PlanGraph {
    PlanGraphBuilder::new().build(root)
}
