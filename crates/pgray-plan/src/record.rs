//! Plan Record Model - The recursive plan tree shared by both input formats
//!
//! A [`PlanRecord`] is one step of a PostgreSQL execution plan. Records are
//! produced either from `EXPLAIN (FORMAT JSON)` objects or by the text parser,
//! and serialize back to the same PostgreSQL JSON key shape so the two paths
//! are interchangeable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key holding child plans in the PostgreSQL JSON format
pub const PLANS_KEY: &str = "Plans";

/// Represents a single step of a query plan and its children
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlanRecord {
    /// Operator label, e.g. "Seq Scan" or "Seq Scan on users"
    #[serde(rename = "Node Type")]
    pub node_type: String,
    /// Startup cost (cost to return the first row)
    #[serde(rename = "Startup Cost", skip_serializing_if = "Option::is_none")]
    pub startup_cost: Option<f64>,
    /// Total cost (cost to return all rows)
    #[serde(rename = "Total Cost", skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    /// Estimated number of rows
    #[serde(rename = "Plan Rows", skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    /// Estimated row width in bytes
    #[serde(rename = "Plan Width", skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    /// Actual time to the first row in milliseconds (EXPLAIN ANALYZE)
    #[serde(rename = "Actual Startup Time", skip_serializing_if = "Option::is_none")]
    pub actual_startup_time: Option<f64>,
    /// Actual total time in milliseconds (EXPLAIN ANALYZE)
    #[serde(rename = "Actual Total Time", skip_serializing_if = "Option::is_none")]
    pub actual_total_time: Option<f64>,
    /// Number of loops (EXPLAIN ANALYZE)
    #[serde(rename = "Actual Loops", skip_serializing_if = "Option::is_none")]
    pub loops: Option<u64>,
    /// Relation/table name for scan steps
    #[serde(rename = "Relation Name", skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Child steps, in plan order
    #[serde(rename = "Plans", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanRecord>,
    /// The structured object this record was read from, without its `Plans`
    #[serde(skip)]
    pub raw: Option<Value>,
}

impl PlanRecord {
    /// Creates a childless record with the given operator label
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Self::default()
        }
    }

    /// Reads a record tree from a PostgreSQL `EXPLAIN (FORMAT JSON)` plan object.
    ///
    /// Never fails: missing or mistyped fields are left absent, and a missing
    /// `Node Type` yields an empty label.
    pub fn from_json(value: &Value) -> Self {
        let mut record = Self::new(
            value
                .get("Node Type")
                .and_then(|v| v.as_str())
                .unwrap_or_default(),
        );

        record.startup_cost = value.get("Startup Cost").and_then(|v| v.as_f64());
        record.total_cost = value.get("Total Cost").and_then(|v| v.as_f64());
        record.rows = value.get("Plan Rows").and_then(as_count);
        record.width = value.get("Plan Width").and_then(as_count);
        record.actual_startup_time = value.get("Actual Startup Time").and_then(|v| v.as_f64());
        record.actual_total_time = value.get("Actual Total Time").and_then(|v| v.as_f64());
        record.loops = value.get("Actual Loops").and_then(as_count);
        record.relation = value
            .get("Relation Name")
            .and_then(|v| v.as_str())
            .map(String::from);

        if let Some(plans) = value.get(PLANS_KEY).and_then(|v| v.as_array()) {
            record.children = plans.iter().map(Self::from_json).collect();
        }

        if let Some(obj) = value.as_object() {
            let mut raw = obj.clone();
            raw.remove(PLANS_KEY);
            record.raw = Some(Value::Object(raw));
        }

        record
    }

    /// Sets the startup and total cost
    pub fn with_cost(mut self, startup: f64, total: f64) -> Self {
        self.startup_cost = Some(startup);
        self.total_cost = Some(total);
        self
    }

    /// Sets the estimated rows
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Sets the relation name
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Sets the actual startup and total time
    pub fn with_actual_time(mut self, startup: f64, total: f64) -> Self {
        self.actual_startup_time = Some(startup);
        self.actual_total_time = Some(total);
        self
    }

    /// Adds a child record
    pub fn with_child(mut self, child: PlanRecord) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the operator this record's label names
    pub fn operator(&self) -> NodeType {
        NodeType::from_label(&self.node_type)
    }

    /// Returns this record's own fields as a PostgreSQL-shaped JSON object.
    ///
    /// Structured input returns the source object; text input returns the
    /// parsed fields. Children are never included.
    pub fn details(&self) -> Value {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let step = PlanRecord {
            node_type: self.node_type.clone(),
            relation: self.relation.clone(),
            children: Vec::new(),
            raw: None,
            ..*self
        };
        serde_json::to_value(&step).unwrap_or_default()
    }

    /// Returns the total number of records in this subtree (including self)
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Returns the number of parent-child pairs in this subtree
    pub fn edge_count(&self) -> usize {
        self.node_count() - 1
    }

    /// Returns the maximum depth of this subtree
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Returns true if this record has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns an iterator over this subtree in pre-order
    pub fn iter(&self) -> PlanRecordIter<'_> {
        PlanRecordIter { stack: vec![self] }
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
}

/// Iterator for traversing plan records depth-first, parents before children
pub struct PlanRecordIter<'a> {
    stack: Vec<&'a PlanRecord>,
}

impl<'a> Iterator for PlanRecordIter<'a> {
    type Item = &'a PlanRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.stack.pop()?;
        // Push children in reverse order so we visit them in order
        self.stack.extend(record.children.iter().rev());
        Some(record)
    }
}

/// Broad operator family, used by renderers to style nodes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Scan,
    Join,
    Aggregate,
    Sort,
    Other,
}

/// Type of operation performed by a plan step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    // Scan operations
    SeqScan,
    IndexScan,
    IndexOnlyScan,
    BitmapIndexScan,
    BitmapHeapScan,
    TidScan,
    SubqueryScan,
    FunctionScan,
    ValuesScan,
    CteScan,
    WorkTableScan,
    ForeignScan,
    CustomScan,

    // Join operations
    NestedLoop,
    HashJoin,
    MergeJoin,

    // Aggregation operations
    Aggregate,
    GroupAggregate,
    HashAggregate,
    WindowAgg,

    // Sort operations
    Sort,
    IncrementalSort,

    SetOp,
    Append,
    MergeAppend,
    RecursiveUnion,
    Limit,
    Materialize,
    Memoize,
    Hash,
    Unique,
    BitmapAnd,
    BitmapOr,
    ModifyTable,
    Result,
    Gather,
    GatherMerge,
    LockRows,
    ProjectSet,

    Unknown,
}

/// PostgreSQL operator labels, as printed by both EXPLAIN formats
const OPERATOR_LABELS: &[(&str, NodeType)] = &[
    ("Seq Scan", NodeType::SeqScan),
    ("Index Scan", NodeType::IndexScan),
    ("Index Only Scan", NodeType::IndexOnlyScan),
    ("Bitmap Index Scan", NodeType::BitmapIndexScan),
    ("Bitmap Heap Scan", NodeType::BitmapHeapScan),
    ("Tid Scan", NodeType::TidScan),
    ("TID Scan", NodeType::TidScan),
    ("Subquery Scan", NodeType::SubqueryScan),
    ("Function Scan", NodeType::FunctionScan),
    ("Values Scan", NodeType::ValuesScan),
    ("CTE Scan", NodeType::CteScan),
    ("WorkTable Scan", NodeType::WorkTableScan),
    ("Foreign Scan", NodeType::ForeignScan),
    ("Custom Scan", NodeType::CustomScan),
    ("Nested Loop", NodeType::NestedLoop),
    ("Hash Join", NodeType::HashJoin),
    ("Merge Join", NodeType::MergeJoin),
    // Text format spells the join type into the label
    ("Hash Left Join", NodeType::HashJoin),
    ("Hash Right Join", NodeType::HashJoin),
    ("Hash Full Join", NodeType::HashJoin),
    ("Hash Semi Join", NodeType::HashJoin),
    ("Hash Anti Join", NodeType::HashJoin),
    ("Hash Right Semi Join", NodeType::HashJoin),
    ("Hash Right Anti Join", NodeType::HashJoin),
    ("Merge Left Join", NodeType::MergeJoin),
    ("Merge Right Join", NodeType::MergeJoin),
    ("Merge Full Join", NodeType::MergeJoin),
    ("Merge Semi Join", NodeType::MergeJoin),
    ("Merge Anti Join", NodeType::MergeJoin),
    ("Aggregate", NodeType::Aggregate),
    ("GroupAggregate", NodeType::GroupAggregate),
    ("Group Aggregate", NodeType::GroupAggregate),
    ("HashAggregate", NodeType::HashAggregate),
    ("Hash Aggregate", NodeType::HashAggregate),
    ("MixedAggregate", NodeType::HashAggregate),
    ("WindowAgg", NodeType::WindowAgg),
    ("Sort", NodeType::Sort),
    ("Incremental Sort", NodeType::IncrementalSort),
    ("SetOp", NodeType::SetOp),
    ("HashSetOp", NodeType::SetOp),
    ("Append", NodeType::Append),
    ("Merge Append", NodeType::MergeAppend),
    ("Recursive Union", NodeType::RecursiveUnion),
    ("Limit", NodeType::Limit),
    ("Materialize", NodeType::Materialize),
    ("Memoize", NodeType::Memoize),
    ("Hash", NodeType::Hash),
    ("Unique", NodeType::Unique),
    ("BitmapAnd", NodeType::BitmapAnd),
    ("BitmapOr", NodeType::BitmapOr),
    ("ModifyTable", NodeType::ModifyTable),
    ("Insert", NodeType::ModifyTable),
    ("Update", NodeType::ModifyTable),
    ("Delete", NodeType::ModifyTable),
    ("Result", NodeType::Result),
    ("Gather", NodeType::Gather),
    ("Gather Merge", NodeType::GatherMerge),
    ("LockRows", NodeType::LockRows),
    ("ProjectSet", NodeType::ProjectSet),
];

impl NodeType {
    /// Classifies an operator label.
    ///
    /// Accepts exact JSON names ("Hash Join") as well as text-format labels
    /// that carry extra words ("Seq Scan on users", "Nested Loop Left Join",
    /// "Parallel Seq Scan on t"). The longest known name that prefixes the
    /// label on a word boundary wins.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let label = label.strip_prefix("Parallel ").unwrap_or(label);

        OPERATOR_LABELS
            .iter()
            .filter(|(name, _)| {
                label
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
            })
            .max_by_key(|(name, _)| name.len())
            .map(|(_, node_type)| *node_type)
            .unwrap_or(Self::Unknown)
    }

    /// Returns the operator family used for styling
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::SeqScan
            | Self::IndexScan
            | Self::IndexOnlyScan
            | Self::BitmapIndexScan
            | Self::BitmapHeapScan
            | Self::TidScan
            | Self::SubqueryScan
            | Self::FunctionScan
            | Self::ValuesScan
            | Self::CteScan
            | Self::WorkTableScan
            | Self::ForeignScan
            | Self::CustomScan => NodeCategory::Scan,
            Self::NestedLoop | Self::HashJoin | Self::MergeJoin => NodeCategory::Join,
            Self::Aggregate | Self::GroupAggregate | Self::HashAggregate | Self::WindowAgg => {
                NodeCategory::Aggregate
            }
            Self::Sort | Self::IncrementalSort => NodeCategory::Sort,
            _ => NodeCategory::Other,
        }
    }
}
