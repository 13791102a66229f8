//! FILENAME: tests/test_row_grouping.rs
//! PURPOSE: Tests for column-based row grouping combined with aggregation.

mod common;

use aggregation_engine::{
    compute_row_tree, AggregationPosition, GroupingConfig, PositionPolicy, ROOT_NODE_ID,
};
use common::{baseline_columns, baseline_rows, GridHarness};
use grid_model::{CellValue, Row};
use rustc_hash::FxHashMap;

// ============================================================================
// TREE SHAPE
// ============================================================================

#[test]
fn test_every_leaf_appears_exactly_once() {
    let groupings = [
        GroupingConfig::flat(),
        GroupingConfig::by_columns(&["category1"]),
        GroupingConfig::by_columns(&["category1", "category2"]),
        GroupingConfig::by_columns(&["category2", "category1"]),
    ];
    for grouping in groupings.iter() {
        let tree = compute_row_tree(&baseline_rows(), &baseline_columns(), grouping).unwrap();
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for leaf in tree.leaf_descendants(ROOT_NODE_ID) {
            *seen.entry(leaf).or_default() += 1;
        }
        assert_eq!(seen.len(), 5, "grouping {:?}", grouping);
        assert!(seen.values().all(|&count| count == 1));
    }
}

#[test]
fn test_depth_follows_parent() {
    let tree = compute_row_tree(
        &baseline_rows(),
        &baseline_columns(),
        &GroupingConfig::by_columns(&["category1", "category2"]),
    )
    .unwrap();
    for node in tree.nodes() {
        let Some(parent_id) = &node.parent else {
            assert_eq!(node.depth, -1);
            continue;
        };
        let parent = tree.node(parent_id).unwrap();
        assert_eq!(node.depth, parent.depth + 1, "node {}", node.id);
    }
}

#[test]
fn test_missing_grouping_value_is_bucketed() {
    let mut rows = baseline_rows();
    rows.push(Row::new("5").with("id", 5.0));
    let mut harness = GridHarness::new(rows, baseline_columns()).grouped_by(&["category1"]);
    let snapshot = harness.run();
    let bucket = snapshot
        .tree
        .node("auto-generated-row-category1/(blank)")
        .unwrap();
    assert_eq!(bucket.children.as_slice(), &["5".to_string()]);
    let bucket_row = snapshot
        .rows
        .rows()
        .iter()
        .find(|row| row.id() == bucket.id)
        .unwrap();
    assert_eq!(snapshot.group_label(bucket_row).as_deref(), Some("(blank)"));
}

// ============================================================================
// AGGREGATION ON GROUPS
// ============================================================================

#[test]
fn test_default_policy_places_footers_everywhere() {
    let mut harness = GridHarness::baseline().grouped_by(&["category1"]).aggregate("id", "max");
    assert_eq!(
        harness.column_values("id"),
        vec!["", "0", "1", "2", "2", "", "3", "4", "4", "4"]
    );
    let ids = harness.row_ids();
    assert_eq!(ids[4], "auto-generated-group-footer-auto-generated-row-category1/Cat A");
    assert_eq!(ids[9], "auto-generated-group-footer-auto-generated-group-node-root");
}

#[test]
fn test_inline_groups_policy() {
    let mut harness = GridHarness::baseline()
        .grouped_by(&["category1"])
        .aggregate("id", "max")
        .policy(PositionPolicy::inline_groups());
    assert_eq!(
        harness.column_values("id"),
        vec!["2", "0", "1", "2", "4", "3", "4", "4"]
    );
}

#[test]
fn test_root_only_policy() {
    let mut harness = GridHarness::baseline()
        .grouped_by(&["category1"])
        .aggregate("id", "size")
        .policy(PositionPolicy::new(|node| match node {
            None => Some(AggregationPosition::Footer),
            Some(_) => None,
        }));
    let snapshot = harness.run();
    assert_eq!(snapshot.aggregated.len(), 1);
    let total = snapshot.rows.rows().last().unwrap();
    assert_eq!(snapshot.rows.cell_value(total, "id"), CellValue::Number(5.0));
    assert!(!snapshot.aggregated.get(ROOT_NODE_ID).unwrap().cell("id").unwrap().has_cell_unit);
}

#[test]
fn test_policy_change_recomputes_on_same_pipeline() {
    let mut harness = GridHarness::baseline().grouped_by(&["category1"]).aggregate("id", "max");

    harness.input.position_policy = PositionPolicy::new(|node| match node {
        Some(group) if group.grouping_key == CellValue::text("Cat A") => Some(AggregationPosition::Inline),
        _ => Some(AggregationPosition::Footer),
    });
    assert_eq!(
        harness.column_values("id"),
        vec!["2", "0", "1", "2", "", "3", "4", "4", "4"]
    );

    // An inline root has no row of its own, so no grand total is shown.
    harness.input.position_policy = PositionPolicy::new(|_| Some(AggregationPosition::Inline));
    assert_eq!(harness.column_values("id"), vec!["2", "0", "1", "2", "4", "3", "4"]);

    harness.input.position_policy = PositionPolicy::new(|node| node.map(|_| AggregationPosition::Footer));
    assert_eq!(
        harness.column_values("id"),
        vec!["", "0", "1", "2", "2", "", "3", "4", "4"]
    );

    harness.input.position_policy = PositionPolicy::default();
    assert_eq!(
        harness.column_values("id"),
        vec!["", "0", "1", "2", "2", "", "3", "4", "4", "4"]
    );

    harness.input.position_policy = PositionPolicy::new(|_| None);
    assert_eq!(harness.column_values("id"), vec!["", "0", "1", "2", "", "3", "4"]);
    assert!(harness.run().aggregated.is_empty());
}

#[test]
fn test_root_sum_independent_of_grouping() {
    for fields in [vec![], vec!["category1"], vec!["category2", "category1"]] {
        let mut harness = GridHarness::baseline().grouped_by(&fields).aggregate("id", "sum");
        let snapshot = harness.run();
        let root = snapshot.aggregated.get(ROOT_NODE_ID).unwrap();
        assert_eq!(root.cell("id").unwrap().value, CellValue::Number(10.0));
    }
}

#[test]
fn test_nested_groups_aggregate_their_own_leaves() {
    let mut harness = GridHarness::baseline()
        .grouped_by(&["category1", "category2"])
        .aggregate("id", "sum");
    let snapshot = harness.run();
    let nested = snapshot
        .aggregated
        .get("auto-generated-row-category1/Cat A-category2/Cat 2")
        .unwrap();
    assert_eq!(nested.cell("id").unwrap().value, CellValue::Number(3.0));
    let outer = snapshot.aggregated.get("auto-generated-row-category1/Cat B").unwrap();
    assert_eq!(outer.cell("id").unwrap().value, CellValue::Number(7.0));
}
