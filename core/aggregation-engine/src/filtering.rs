//! FILENAME: core/aggregation-engine/src/filtering.rs
//! Filtering lookup - which nodes of a row tree are visible.
//!
//! Leaves are visible when the leaf predicate accepts their row. Groups are
//! visible when the group predicate (if any) accepts them and something below
//! them is visible. Synthetic aggregation rows never pass through here.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use grid_model::{log_debug, CellValue, ColumnSet, Row};
use rustc_hash::FxHashSet;

use crate::definition::{FilterItem, FilterModel, FilterOperator, LogicOperator};
use crate::row_tree::{GroupNode, NodeId, RowTree, ROOT_NODE_ID};

pub type RowPredicate = Arc<dyn Fn(&Row) -> bool + Send + Sync>;
pub type GroupPredicate = Arc<dyn Fn(&GroupNode) -> bool + Send + Sync>;

// ============================================================================
// ROW FILTER
// ============================================================================

#[derive(Clone, Default)]
pub struct RowFilter {
    pub leaf: Option<RowPredicate>,
    pub group: Option<GroupPredicate>,
}

impl RowFilter {
    pub fn none() -> Self {
        RowFilter::default()
    }

    pub fn with_leaf<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        self.leaf = Some(Arc::new(predicate));
        self
    }

    pub fn with_group<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&GroupNode) -> bool + Send + Sync + 'static,
    {
        self.group = Some(Arc::new(predicate));
        self
    }

    /// Compiles a filter model into a leaf predicate. Items naming unknown
    /// columns, or missing the value their operator needs, are ignored.
    pub fn from_model(model: &FilterModel, columns: &ColumnSet) -> Self {
        let items: Vec<FilterItem> = model
            .items
            .iter()
            .filter(|item| {
                if !columns.contains(&item.field) {
                    log_debug!("FILTER", "ignoring filter on unknown column {}", item.field);
                    return false;
                }
                !item.operator.needs_value() || item.value.is_some()
            })
            .cloned()
            .collect();

        if items.is_empty() {
            return RowFilter::none();
        }

        let columns = columns.clone();
        let logic = model.logic_operator;
        RowFilter::none().with_leaf(move |row| {
            let mut results = items
                .iter()
                .map(|item| item_matches(item, &columns.value(row, &item.field)));
            match logic {
                LogicOperator::And => results.all(|r| r),
                LogicOperator::Or => results.any(|r| r),
            }
        })
    }

    pub fn is_active(&self) -> bool {
        self.leaf.is_some() || self.group.is_some()
    }

    /// Identity comparison of both predicates.
    pub fn same_as(&self, other: &RowFilter) -> bool {
        fn same<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }
        same(&self.leaf, &other.leaf) && same(&self.group, &other.group)
    }

    fn accepts_row(&self, row: &Row) -> bool {
        self.leaf.as_ref().map_or(true, |p| p(row))
    }

    fn accepts_group(&self, node: &GroupNode) -> bool {
        self.group.as_ref().map_or(true, |p| p(node))
    }
}

impl fmt::Debug for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowFilter")
            .field("leaf", &self.leaf.is_some())
            .field("group", &self.group.is_some())
            .finish()
    }
}

fn text_of(value: &CellValue) -> String {
    value.display().to_lowercase()
}

fn item_matches(item: &FilterItem, value: &CellValue) -> bool {
    let target = item.value.as_ref().unwrap_or(&CellValue::Empty);
    match item.operator {
        FilterOperator::IsEmpty => value.is_empty(),
        FilterOperator::IsNotEmpty => !value.is_empty(),
        FilterOperator::Contains => text_of(value).contains(&text_of(target)),
        FilterOperator::StartsWith => text_of(value).starts_with(&text_of(target)),
        FilterOperator::EndsWith => text_of(value).ends_with(&text_of(target)),
        FilterOperator::Equals => values_equal(value, target),
        FilterOperator::NotEquals => !values_equal(value, target),
        FilterOperator::LessThan => value.compare(target) == Ordering::Less,
        FilterOperator::LessThanOrEqual => value.compare(target) != Ordering::Greater,
        FilterOperator::GreaterThan => value.compare(target) == Ordering::Greater,
        FilterOperator::GreaterThanOrEqual => value.compare(target) != Ordering::Less,
    }
}

fn values_equal(value: &CellValue, target: &CellValue) -> bool {
    match (value, target) {
        (CellValue::Text(a), CellValue::Text(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => value.compare(target) == Ordering::Equal,
    }
}

// ============================================================================
// FILTERED ROWS
// ============================================================================

/// Visibility lookup for one (tree, filter) pair.
#[derive(Debug, Clone, Default)]
pub struct FilteredRows {
    visible: FxHashSet<NodeId>,
    visible_leaves: FxHashSet<NodeId>,
    active: bool,
}

impl FilteredRows {
    /// Whether `id` (group or leaf) is visible. The root always is.
    pub fn is_visible(&self, id: &str) -> bool {
        !self.active || id == ROOT_NODE_ID || self.visible.contains(id)
    }

    pub fn is_leaf_visible(&self, id: &str) -> bool {
        !self.active || self.visible_leaves.contains(id)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of visible leaves. Only meaningful when a filter is active.
    pub fn visible_leaf_count(&self) -> usize {
        self.visible_leaves.len()
    }
}

pub fn compute_filtered_rows(tree: &RowTree, filter: &RowFilter) -> FilteredRows {
    let mut result = FilteredRows {
        active: filter.is_active(),
        ..FilteredRows::default()
    };
    if !result.active {
        return result;
    }

    for child in tree.children(ROOT_NODE_ID) {
        visit(tree, filter, child, &mut result);
    }

    log_debug!(
        "FILTER",
        "visible nodes={} leaves={}",
        result.visible.len(),
        result.visible_leaves.len()
    );
    result
}

fn visit(tree: &RowTree, filter: &RowFilter, id: &str, result: &mut FilteredRows) -> bool {
    let Some(node) = tree.node(id) else {
        return false;
    };

    if node.is_leaf() {
        let passes = tree.node_row(node).map_or(false, |row| filter.accepts_row(row));
        if passes {
            result.visible.insert(node.id.clone());
            result.visible_leaves.insert(node.id.clone());
        }
        return passes;
    }

    if !filter.accepts_group(node) {
        return false;
    }

    let mut any_child = false;
    for child in node.children.iter() {
        any_child |= visit(tree, filter, child, result);
    }
    // Tree-data groups with their own row stay visible when that row passes.
    let own_row = tree.node_row(node).map_or(false, |row| filter.accepts_row(row));

    let visible = any_child || own_row;
    if visible {
        result.visible.insert(node.id.clone());
    }
    visible
}
