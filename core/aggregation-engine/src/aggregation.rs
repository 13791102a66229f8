//! FILENAME: core/aggregation-engine/src/aggregation.rs
//! Aggregation Evaluator - bottom-up aggregation over the row tree.
//!
//! The aggregation model is first sanitized against the columns and the
//! active function set. Each group (and the root) is then asked for its
//! position; nodes with no position are skipped entirely, so nothing stale
//! survives a policy change. Values come only from leaf nodes.

use std::fmt;
use std::sync::Arc;

use grid_model::{log_debug, log_enter, log_exit, CellValue, Row};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{AggregationModel, AggregationRowsScope};
use crate::filtering::FilteredRows;
use crate::functions::{AggregationFunction, AggregationFunctionSet, AggregationParams};
use crate::row_tree::{GroupNode, NodeId, RowTree};
use grid_model::ColumnSet;

// ============================================================================
// RULES
// ============================================================================

/// One usable entry of the aggregation model.
#[derive(Clone, Debug)]
pub struct AggregationRule {
    pub field: String,
    pub function_name: String,
    pub function: Arc<AggregationFunction>,
}

/// The aggregation model after dropping everything that cannot be applied.
#[derive(Clone, Debug, Default)]
pub struct AggregationRules {
    rules: FxHashMap<String, AggregationRule>,
}

impl AggregationRules {
    pub fn get(&self, field: &str) -> Option<&AggregationRule> {
        self.rules.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregationRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Same fields, same function names and the very same function objects.
    /// A function swapped for another with the same name counts as a change.
    pub fn same_as(&self, other: &AggregationRules) -> bool {
        self.rules.len() == other.rules.len()
            && self.rules.iter().all(|(field, rule)| {
                other.rules.get(field).map_or(false, |o| {
                    o.function_name == rule.function_name && Arc::ptr_eq(&o.function, &rule.function)
                })
            })
    }
}

/// Drops model entries for unknown or non-aggregable columns, unknown
/// function names, and names outside the column's allow-list.
pub fn sanitize_aggregation_model(
    model: &AggregationModel,
    columns: &ColumnSet,
    functions: &AggregationFunctionSet,
) -> AggregationRules {
    let mut rules = FxHashMap::default();

    for (field, function_name) in model.iter() {
        let Some(column) = columns.get(field) else {
            log_debug!("AGG", "ignoring {}: unknown column", field);
            continue;
        };
        if !column.aggregable {
            log_debug!("AGG", "ignoring {}: column is not aggregable", field);
            continue;
        }
        if !column.allows_function(function_name) {
            log_debug!("AGG", "ignoring {}: {} not allowed on this column", field, function_name);
            continue;
        }
        let Some(function) = functions.get(function_name) else {
            log_debug!("AGG", "ignoring {}: unknown function {}", field, function_name);
            continue;
        };
        rules.insert(
            field.to_string(),
            AggregationRule {
                field: field.to_string(),
                function_name: function_name.to_string(),
                function: Arc::clone(function),
            },
        );
    }

    AggregationRules { rules }
}

// ============================================================================
// POSITION POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationPosition {
    /// Aggregates replace the values of the group's own row.
    Inline,
    /// Aggregates go to a synthetic row after the group's last descendant.
    Footer,
}

type PolicyFn = dyn Fn(Option<&GroupNode>) -> Option<AggregationPosition> + Send + Sync;

/// Decides where each node's aggregate goes. The root is passed as `None`;
/// returning `None` suppresses aggregation for that node.
#[derive(Clone)]
pub struct PositionPolicy(Arc<PolicyFn>);

impl PositionPolicy {
    pub fn new<F>(policy: F) -> Self
    where
        F: Fn(Option<&GroupNode>) -> Option<AggregationPosition> + Send + Sync + 'static,
    {
        PositionPolicy(Arc::new(policy))
    }

    /// Inline on group rows, footer for the grand total.
    pub fn inline_groups() -> Self {
        PositionPolicy::new(|node| match node {
            Some(_) => Some(AggregationPosition::Inline),
            None => Some(AggregationPosition::Footer),
        })
    }

    pub fn position_for(&self, node: &GroupNode) -> Option<AggregationPosition> {
        if node.is_root() {
            (self.0)(None)
        } else {
            (self.0)(Some(node))
        }
    }

    pub fn same_as(&self, other: &PositionPolicy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for PositionPolicy {
    /// Footer for every group and for the root.
    fn default() -> Self {
        PositionPolicy::new(|_| Some(AggregationPosition::Footer))
    }
}

impl fmt::Debug for PositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PositionPolicy(..)")
    }
}

// ============================================================================
// CONFIG & OUTPUT
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct AggregationConfig {
    pub rules: AggregationRules,
    pub position_policy: PositionPolicy,
    pub scope: AggregationRowsScope,
}

impl AggregationConfig {
    pub fn new(model: &AggregationModel, columns: &ColumnSet, functions: &AggregationFunctionSet) -> Self {
        AggregationConfig {
            rules: sanitize_aggregation_model(model, columns, functions),
            position_policy: PositionPolicy::default(),
            scope: AggregationRowsScope::default(),
        }
    }

    pub fn with_policy(mut self, policy: PositionPolicy) -> Self {
        self.position_policy = policy;
        self
    }

    pub fn with_scope(mut self, scope: AggregationRowsScope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCell {
    pub value: CellValue,
    pub formatted: String,
    pub has_cell_unit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAggregation {
    pub position: AggregationPosition,
    pub cells: FxHashMap<String, AggregatedCell>,
}

impl NodeAggregation {
    pub fn cell(&self, field: &str) -> Option<&AggregatedCell> {
        self.cells.get(field)
    }
}

/// Aggregates for every node whose position is not suppressed.
#[derive(Debug, Clone)]
pub struct AggregatedTree {
    tree: Arc<RowTree>,
    rules: AggregationRules,
    policy: PositionPolicy,
    scope: AggregationRowsScope,
    aggregations: FxHashMap<NodeId, Arc<NodeAggregation>>,
}

impl AggregatedTree {
    pub fn tree(&self) -> &Arc<RowTree> {
        &self.tree
    }

    pub fn get(&self, node_id: &str) -> Option<&Arc<NodeAggregation>> {
        self.aggregations.get(node_id)
    }

    pub fn position(&self, node_id: &str) -> Option<AggregationPosition> {
        self.aggregations.get(node_id).map(|a| a.position)
    }

    pub fn rules(&self) -> &AggregationRules {
        &self.rules
    }

    pub fn scope(&self) -> AggregationRowsScope {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.aggregations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregations.is_empty()
    }

    /// False when `config` would produce different aggregates.
    pub fn is_current_for(&self, config: &AggregationConfig) -> bool {
        self.rules.same_as(&config.rules)
            && self.policy.same_as(&config.position_policy)
            && self.scope == config.scope
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

pub fn compute_aggregated_tree(
    tree: &Arc<RowTree>,
    config: &AggregationConfig,
    filtered: &FilteredRows,
) -> AggregatedTree {
    log_enter!(
        "AGG",
        "compute_aggregated_tree",
        "rules={} scope={:?}",
        config.rules.len(),
        config.scope
    );

    let mut aggregations = FxHashMap::default();
    if !config.rules.is_empty() {
        let mut walker = Walker {
            tree: tree.as_ref(),
            config,
            filtered,
            out: &mut aggregations,
        };
        walker.visit(tree.root());
    }

    log_exit!("AGG", "compute_aggregated_tree", "aggregated_nodes={}", aggregations.len());
    AggregatedTree {
        tree: Arc::clone(tree),
        rules: config.rules.clone(),
        policy: config.position_policy.clone(),
        scope: config.scope,
        aggregations,
    }
}

struct Walker<'a> {
    tree: &'a RowTree,
    config: &'a AggregationConfig,
    filtered: &'a FilteredRows,
    out: &'a mut FxHashMap<NodeId, Arc<NodeAggregation>>,
}

impl<'a> Walker<'a> {
    /// Post-order walk. Returns the in-scope leaf rows below `node`.
    fn visit(&mut self, node: &'a GroupNode) -> Vec<&'a Row> {
        if node.is_leaf() {
            let in_scope = match self.config.scope {
                AggregationRowsScope::All => true,
                AggregationRowsScope::Filtered => self.filtered.is_leaf_visible(&node.id),
            };
            return match self.tree.node_row(node) {
                Some(row) if in_scope => vec![row],
                _ => Vec::new(),
            };
        }

        let mut leaves = Vec::new();
        for child_id in node.children.iter() {
            if let Some(child) = self.tree.node(child_id) {
                leaves.extend(self.visit(child));
            }
        }

        if let Some(position) = self.config.position_policy.position_for(node) {
            let aggregation = self.aggregate(node, position, &leaves);
            self.out.insert(node.id.clone(), Arc::new(aggregation));
        }
        leaves
    }

    fn aggregate(&self, node: &GroupNode, position: AggregationPosition, leaves: &[&Row]) -> NodeAggregation {
        let columns = self.tree.columns();
        let mut cells = FxHashMap::default();

        for rule in self.config.rules.iter() {
            let Some(column) = columns.get(&rule.field) else {
                continue;
            };
            let values: Vec<CellValue> = leaves.iter().map(|row| column.value(row)).collect();
            let params = AggregationParams {
                values: &values,
                field: &rule.field,
                group_node: node,
            };
            let value = rule.function.call(&params);
            let formatted = match &rule.function.value_formatter {
                Some(formatter) => formatter(&value),
                None => column.format(&value),
            };
            cells.insert(
                rule.field.clone(),
                AggregatedCell {
                    value,
                    formatted,
                    has_cell_unit: rule.function.cell_unit(),
                },
            );
        }

        NodeAggregation { position, cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::{compute_filtered_rows, RowFilter};
    use crate::row_tree::{compute_row_tree, GroupingConfig, ROOT_NODE_ID};
    use grid_model::ColumnDescriptor;

    fn columns() -> ColumnSet {
        ColumnSet::new(vec![
            ColumnDescriptor::new("category"),
            ColumnDescriptor::new("price"),
            ColumnDescriptor::new("name").not_aggregable(),
            ColumnDescriptor::new("qty").with_available_functions(&["sum"]),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new("1").with("category", "A").with("price", 10.0).with("qty", 1.0),
            Row::new("2").with("category", "A").with("price", 5.0).with("qty", 2.0),
            Row::new("3").with("category", "B").with("price", 1.0).with("qty", 3.0),
        ]
    }

    #[test]
    fn test_sanitize_drops_unusable_entries() {
        let model = AggregationModel::new()
            .with("price", "sum")
            .with("name", "size")
            .with("qty", "max")
            .with("ghost", "sum")
            .with("category", "median");
        let rules = sanitize_aggregation_model(&model, &columns(), &AggregationFunctionSet::builtin());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("price").unwrap().function_name, "sum");
    }

    #[test]
    fn test_sum_per_group_and_root() {
        let tree = compute_row_tree(&rows(), &columns(), &GroupingConfig::by_columns(&["category"])).unwrap();
        let config = AggregationConfig::new(
            &AggregationModel::new().with("price", "sum"),
            &columns(),
            &AggregationFunctionSet::builtin(),
        );
        let aggregated = compute_aggregated_tree(&tree, &config, &FilteredRows::default());

        let a = aggregated.get("auto-generated-row-category/A").unwrap();
        assert_eq!(a.position, AggregationPosition::Footer);
        assert_eq!(a.cell("price").unwrap().value, CellValue::Number(15.0));
        assert_eq!(a.cell("price").unwrap().formatted, "15");
        let root = aggregated.get(ROOT_NODE_ID).unwrap();
        assert_eq!(root.cell("price").unwrap().value, CellValue::Number(16.0));
        assert!(aggregated.get("1").is_none());
    }

    #[test]
    fn test_suppressed_nodes_have_no_entry() {
        let tree = compute_row_tree(&rows(), &columns(), &GroupingConfig::by_columns(&["category"])).unwrap();
        let config = AggregationConfig::new(
            &AggregationModel::new().with("price", "max"),
            &columns(),
            &AggregationFunctionSet::builtin(),
        )
        .with_policy(PositionPolicy::new(|node| node.map(|_| AggregationPosition::Inline)));
        let aggregated = compute_aggregated_tree(&tree, &config, &FilteredRows::default());
        assert!(aggregated.get(ROOT_NODE_ID).is_none());
        assert_eq!(
            aggregated.position("auto-generated-row-category/B"),
            Some(AggregationPosition::Inline)
        );
    }

    #[test]
    fn test_function_formatter_wins_over_column_formatter() {
        let columns = ColumnSet::new(vec![
            ColumnDescriptor::new("price").with_formatter(|v| format!("col {}", v.display())),
        ]);
        let rows = vec![Row::new("1").with("price", 2.0)];
        let tree = compute_row_tree(&rows, &columns, &GroupingConfig::flat()).unwrap();
        let functions = AggregationFunctionSet::builtin().with(
            "sum",
            AggregationFunction::new(|p| CellValue::Number(p.values.len() as f64))
                .with_formatter(|v| format!("fn {}", v.display())),
        );
        let config = AggregationConfig::new(&AggregationModel::new().with("price", "sum"), &columns, &functions);
        let aggregated = compute_aggregated_tree(&tree, &config, &FilteredRows::default());
        assert_eq!(aggregated.get(ROOT_NODE_ID).unwrap().cell("price").unwrap().formatted, "fn 1");

        let plain = AggregationConfig::new(
            &AggregationModel::new().with("price", "max"),
            &columns,
            &AggregationFunctionSet::builtin(),
        );
        let aggregated = compute_aggregated_tree(&tree, &plain, &FilteredRows::default());
        assert_eq!(aggregated.get(ROOT_NODE_ID).unwrap().cell("price").unwrap().formatted, "col 2");
    }

    #[test]
    fn test_scope_filtered_vs_all() {
        let tree = compute_row_tree(&rows(), &columns(), &GroupingConfig::flat()).unwrap();
        let filter = RowFilter::none().with_leaf(|row| row.get("category") == CellValue::text("A"));
        let filtered = compute_filtered_rows(&tree, &filter);
        let config = AggregationConfig::new(
            &AggregationModel::new().with("qty", "sum"),
            &columns(),
            &AggregationFunctionSet::builtin(),
        );

        let visible = compute_aggregated_tree(&tree, &config, &filtered);
        assert_eq!(visible.get(ROOT_NODE_ID).unwrap().cell("qty").unwrap().value, CellValue::Number(3.0));

        let all = compute_aggregated_tree(&tree, &config.clone().with_scope(AggregationRowsScope::All), &filtered);
        assert_eq!(all.get(ROOT_NODE_ID).unwrap().cell("qty").unwrap().value, CellValue::Number(6.0));
    }

    #[test]
    fn test_function_identity_change_is_detected() {
        let model = AggregationModel::new().with("price", "sum");
        let first = AggregationConfig::new(&model, &columns(), &AggregationFunctionSet::builtin());
        let tree = compute_row_tree(&rows(), &columns(), &GroupingConfig::flat()).unwrap();
        let aggregated = compute_aggregated_tree(&tree, &first, &FilteredRows::default());
        assert!(aggregated.is_current_for(&first));

        // Same name, new function object.
        let second = AggregationConfig::new(&model, &columns(), &AggregationFunctionSet::builtin())
            .with_policy(first.position_policy.clone());
        assert!(!aggregated.is_current_for(&second));
    }
}
