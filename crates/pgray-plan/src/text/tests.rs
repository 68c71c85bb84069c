//! Tests for the text plan parser

use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;

#[test]
fn test_parse_sort_over_seq_scan() {
    let text = indoc! {"
        Sort  (cost=10.00..10.25 rows=100)
          ->  Seq Scan on orders  (cost=0.00..5.00 rows=100)
    "};

    let root = parse_text_plan(text).expect("plan");

    assert_eq!(root.node_type, "Sort");
    assert_eq!(root.startup_cost, Some(10.0));
    assert_eq!(root.total_cost, Some(10.25));
    assert_eq!(root.rows, Some(100));
    assert_eq!(root.relation, None);
    assert_eq!(root.children.len(), 1);

    let child = &root.children[0];
    assert_eq!(child.node_type, "Seq Scan on orders");
    assert_eq!(child.total_cost, Some(5.0));
    assert_eq!(child.rows, Some(100));
    assert_eq!(child.relation, Some("orders".to_string()));
    assert!(child.is_leaf());
    assert_eq!(child.raw, None);
}

#[test]
fn test_indentation_stack_with_dropped_second_root() {
    // Marker columns: 0 (no marker), 2, 2, 4, 0 (no marker)
    let text = indoc! {"
        Append
          ->  Seq Scan on a
          ->  Hash
            ->  Seq Scan on b
        Limit
    "};

    let root = parse_text_plan(text).expect("plan");

    assert_eq!(root.node_type, "Append");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].node_type, "Seq Scan on a");
    assert!(root.children[0].is_leaf());
    assert_eq!(root.children[1].node_type, "Hash");
    assert_eq!(root.children[1].children.len(), 1);
    assert_eq!(root.children[1].children[0].node_type, "Seq Scan on b");
    assert!(root.iter().all(|r| r.node_type != "Limit"));
    assert_eq!(root.node_count(), 4);
}

#[test]
fn test_forest_policy_wraps_top_level_steps() {
    let text = "Append\n  ->  Seq Scan on a\nLimit";

    let root = TextPlanParser::new()
        .with_root_policy(RootPolicy::Forest)
        .parse(text)
        .expect("plan");

    assert_eq!(root.node_type, FOREST_ROOT_LABEL);
    let labels: Vec<_> = root.children.iter().map(|r| r.node_type.as_str()).collect();
    assert_eq!(labels, vec!["Append", "Limit"]);
    assert_eq!(root.children[0].children.len(), 1);
}

#[test]
fn test_forest_policy_keeps_single_root() {
    let root = TextPlanParser::new()
        .with_root_policy(RootPolicy::Forest)
        .parse("Result  (cost=0.00..0.01 rows=1 width=4)")
        .expect("plan");

    assert_eq!(root.node_type, "Result");
}

#[test]
fn test_postgres_nested_output() {
    let text = indoc! {"
        Hash Join  (cost=10.00..100.00 rows=500 width=72)
           Hash Cond: (o.user_id = u.id)
           ->  Seq Scan on orders o  (cost=0.00..50.00 rows=1000 width=36)
           ->  Hash  (cost=5.00..10.00 rows=100 width=36)
                 ->  Seq Scan on users u  (cost=0.00..5.00 rows=100 width=36)
    "};

    let root = parse_text_plan(text).expect("plan");

    // Detail lines carry no marker, so they sit at column 0 and become
    // dropped top-level siblings
    assert_eq!(root.node_type, "Hash Join");
    assert!(root.children.is_empty());

    let forest = TextPlanParser::new()
        .with_root_policy(RootPolicy::Forest)
        .parse(text)
        .expect("plan");
    assert_eq!(forest.children.len(), 2);
    let detail = &forest.children[1];
    // The trailing parenthetical is taken as a (metric-less) fragment
    assert_eq!(detail.node_type, "Hash Cond:");
    assert_eq!(detail.total_cost, None);
    assert_eq!(detail.children.len(), 2);
    assert_eq!(detail.children[0].relation, Some("orders o".to_string()));
    assert_eq!(detail.children[1].children[0].width, Some(36));
}

#[test]
fn test_marker_only_lines_nest_by_column() {
    let text = indoc! {"
        ->  Hash Join  (cost=10.00..100.00 rows=500 width=72)
              ->  Seq Scan on orders o  (cost=0.00..50.00 rows=1000 width=36)
              ->  Hash  (cost=5.00..10.00 rows=100 width=36)
                    ->  Seq Scan on users u  (cost=0.00..5.00 rows=100 width=36)
    "};

    let root = parse_text_plan(text).expect("plan");

    assert_eq!(root.node_type, "Hash Join");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[1].node_type, "Hash");
    assert_eq!(root.children[1].children[0].relation, Some("users u".to_string()));
    assert_eq!(root.node_count(), 4);
}

#[test]
fn test_analyze_line_metrics() {
    let text = "Seq Scan on t  (cost=0.00..35.50 rows=2550 width=4) (actual time=0.010..0.250 rows=2550 loops=1)";

    let root = parse_text_plan(text).expect("plan");

    assert_eq!(root.node_type, "Seq Scan on t");
    assert_eq!(root.rows, Some(2550));
    assert_eq!(root.actual_startup_time, Some(0.01));
    assert_eq!(root.actual_total_time, Some(0.25));
    assert_eq!(root.loops, Some(1));
}

#[test]
fn test_line_without_metrics_still_yields_record() {
    let root = parse_text_plan("Seq Scan on users").expect("plan");

    assert_eq!(root.node_type, "Seq Scan on users");
    assert_eq!(root.relation, Some("users".to_string()));
    assert_eq!(root.total_cost, None);
    assert_eq!(root.rows, None);
}

#[test]
fn test_unrecognized_parenthetical_gives_absent_metrics() {
    let root = parse_text_plan("Seq Scan on t  (never executed)").expect("plan");

    assert_eq!(root.node_type, "Seq Scan on t");
    assert_eq!(root.total_cost, None);
    assert_eq!(root.actual_total_time, None);
}

#[test]
fn test_empty_input_has_no_plan() {
    assert_eq!(parse_text_plan(""), None);
    assert_eq!(parse_text_plan("   \n\t\n  "), None);
}

#[test]
fn test_non_blank_lines_become_records() {
    let text = "Limit\n\n  ->  Sort\n\n        ->  Seq Scan on t\n";

    let root = parse_text_plan(text).expect("plan");

    assert_eq!(root.node_count(), 3);
    assert_eq!(root.depth(), 3);
}

#[test]
fn test_summary_lines() {
    let text = indoc! {"
        Seq Scan on test  (cost=0.00..10.00 rows=100 width=36)
        Planning Time: 0.156 ms
        Execution time: 0.089 ms
    "};

    let timings = summary_timings(text);
    assert_eq!(timings.planning_time_ms, Some(0.156));
    assert_eq!(timings.execution_time_ms, Some(0.089));

    let forest = TextPlanParser::new()
        .with_root_policy(RootPolicy::Forest)
        .skip_summary_lines(true)
        .parse(text)
        .expect("plan");
    assert_eq!(forest.node_type, "Seq Scan on test");

    let kept = TextPlanParser::new()
        .with_root_policy(RootPolicy::Forest)
        .parse(text)
        .expect("plan");
    assert_eq!(kept.children.len(), 3);
}

#[test]
fn test_indentation_uses_marker_column() {
    assert_eq!(indentation("Sort"), 0);
    assert_eq!(indentation("  ->  Sort"), 2);
    assert_eq!(indentation("      ->  Hash"), 6);
    assert_eq!(indentation("   Hash Cond: (a = b)"), 0);
}
