//! Tests for input detection and plan location

use super::*;
use crate::text::RootPolicy;
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::json;

const ANALYZE_JSON: &str = r#"[
  {
    "Plan": {
      "Node Type": "Sort",
      "Startup Cost": 17.0,
      "Total Cost": 17.5,
      "Plan Rows": 200,
      "Actual Total Time": 0.412,
      "Plans": [
        {
          "Node Type": "Seq Scan",
          "Relation Name": "users",
          "Total Cost": 15.0,
          "Plan Rows": 200
        }
      ]
    },
    "Planning Time": 0.081,
    "Execution Time": 0.502
  }
]"#;

#[test]
fn test_detect_format() {
    assert_eq!(InputFormat::Auto.detect("  [{}]"), InputFormat::Json);
    assert_eq!(InputFormat::Auto.detect("\n{\"Plan\": {}}"), InputFormat::Json);
    assert_eq!(InputFormat::Auto.detect("Seq Scan on users"), InputFormat::Text);
    assert_eq!(InputFormat::Auto.detect(""), InputFormat::Text);
    assert_eq!(InputFormat::Text.detect("[1]"), InputFormat::Text);
    assert_eq!(InputFormat::Json.detect("Sort"), InputFormat::Json);
}

#[test]
fn test_json_array_envelope() {
    let result = visualize(ANALYZE_JSON).expect("visualize");

    assert_eq!(result.format, InputFormat::Json);
    assert_eq!(result.planning_time_ms, Some(0.081));
    assert_eq!(result.execution_time_ms, Some(0.502));
    assert_eq!(result.graph.nodes.len(), 2);
    assert_eq!(result.graph.edges.len(), 1);

    let root = &result.graph.nodes[0].data;
    assert_eq!(root.label, "Sort");
    assert_eq!(root.cost, 17.5);
    assert_eq!(root.rows, 200);
    assert_eq!(root.time, Some(0.412));
    assert!(root.details.get("Plans").is_none());

    let scan = &result.graph.nodes[1].data;
    assert_eq!(scan.label, "Seq Scan");
    assert_eq!(scan.relation.as_deref(), Some("users"));
}

#[test]
fn test_json_object_envelope() {
    let result = visualize(r#"{"Plan": {"Node Type": "Result"}}"#).expect("visualize");

    assert_eq!(result.graph.nodes.len(), 1);
    assert_eq!(result.planning_time_ms, None);
}

#[test]
fn test_missing_plan() {
    for input in [
        "[]",
        "[{}]",
        r#"{"plan": {}}"#,
        r#"{"Plan": 3}"#,
        "[1, 2]",
        r#""Plan""#,
    ] {
        let result = Visualizer::default().visualize(input, InputFormat::Json);
        assert!(
            matches!(result, Err(PlanError::MissingPlan)),
            "expected MissingPlan for {input}"
        );
    }
}

#[test]
fn test_missing_plan_message() {
    let err = visualize("[{}]").unwrap_err();
    assert_eq!(err.to_string(), "Invalid JSON: Could not find 'Plan' property");
}

#[test]
fn test_invalid_json() {
    let result = visualize("[{\"Plan\": ");
    assert!(matches!(result, Err(PlanError::InvalidJson(_))));
}

#[test]
fn test_locate_plan_root() {
    let value = json!([{"Plan": {"Node Type": "Limit"}}, {"Plan": {"Node Type": "Sort"}}]);
    let root = locate_plan_root(&value).expect("plan");
    assert_eq!(root["Node Type"], json!("Limit"));
}

#[test]
fn test_text_plan_with_timings() {
    let text = indoc! {"
        Sort  (cost=17.00..17.50 rows=200 width=36) (actual time=0.400..0.412 rows=200 loops=1)
          ->  Seq Scan on users  (cost=0.00..15.00 rows=200 width=36)
        Planning Time: 0.081 ms
        Execution Time: 0.502 ms
    "};

    let parsed = Visualizer::default()
        .parse_plan(text, InputFormat::Auto)
        .expect("parse");

    assert_eq!(parsed.format, InputFormat::Text);
    assert_eq!(parsed.planning_time_ms, Some(0.081));
    assert_eq!(parsed.execution_time_ms, Some(0.502));
    let root = parsed.root.expect("root");
    assert_eq!(root.node_type, "Sort");
    assert_eq!(root.actual_total_time, Some(0.412));
}

#[test]
fn test_text_summary_lines_skipped_by_config() {
    let mut config = VisualizerConfig::default();
    config.text.skip_summary_lines = true;

    let text = "Seq Scan on users  (cost=0.00..15.00 rows=200)\nPlanning Time: 0.081 ms";
    let result = Visualizer::new(config)
        .visualize(text, InputFormat::Text)
        .expect("visualize");

    assert_eq!(result.graph.nodes.len(), 1);
    assert_eq!(result.planning_time_ms, Some(0.081));
}

#[test]
fn test_empty_text_gives_empty_graph() {
    let result = visualize("   \n\n").expect("visualize");

    assert_eq!(result.format, InputFormat::Text);
    assert!(result.graph.is_empty());
    assert!(result.graph.edges.is_empty());
}

#[test]
fn test_forest_policy() {
    let mut config = VisualizerConfig::default();
    config.text.roots = RootPolicy::Forest;

    let result = Visualizer::new(config)
        .visualize("Limit\nSort", InputFormat::Text)
        .expect("visualize");

    let labels: Vec<_> = result.graph.nodes.iter().map(|n| n.data.label.as_str()).collect();
    assert_eq!(labels, vec!["Root", "Limit", "Sort"]);
}

#[test]
fn test_shared_ids_across_calls() {
    let visualizer = Visualizer::default().with_id_generator(Arc::new(IdGenerator::new()));

    let first = visualizer.visualize(ANALYZE_JSON, InputFormat::Auto).expect("first");
    let second = visualizer.visualize(ANALYZE_JSON, InputFormat::Auto).expect("second");

    assert_eq!(first.graph.nodes[0].id, "node-0");
    assert_eq!(second.graph.nodes[0].id, "node-2");
}

#[test]
fn test_serialized_visualization() {
    let result = visualize(r#"{"Plan": {"Node Type": "Result"}, "Execution Time": 0.01}"#)
        .expect("visualize");
    let value = serde_json::to_value(&result).expect("serialize");

    assert_eq!(value["format"], json!("json"));
    assert_eq!(value["execution_time_ms"], json!(0.01));
    assert_eq!(value["planning_time_ms"], json!(null));
    assert_eq!(value["nodes"][0]["id"], json!("node-0"));
    assert_eq!(value["edges"], json!([]));
}

#[test]
fn test_shared_generator_prefix_wins_over_config() {
    let mut config = VisualizerConfig::default();
    config.ids.prefix = "step".to_string();

    let foreign = Visualizer::new(config.clone())
        .with_id_generator(Arc::new(IdGenerator::with_prefix("op")))
        .visualize("Result", InputFormat::Text)
        .expect("visualize");
    assert_eq!(foreign.graph.nodes[0].id, "op-0");

    let visualizer = Visualizer::new(config);
    let visualizer = visualizer.clone().with_id_generator(visualizer.shared_id_generator());
    let first = visualizer.visualize("Result", InputFormat::Text).expect("first");
    let second = visualizer.visualize("Result", InputFormat::Text).expect("second");
    assert_eq!(first.graph.nodes[0].id, "step-0");
    assert_eq!(second.graph.nodes[0].id, "step-1");
}
