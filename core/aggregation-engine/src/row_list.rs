//! FILENAME: core/aggregation-engine/src/row_list.rs
//! Derived Row List Builder - flattens the aggregated tree for rendering.
//!
//! Pre-order emission: a node's own row (with the inline overlay when its
//! aggregate is inline), then its sorted, visible children when expanded,
//! then its footer row. The grand-total footer is always the last row.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use grid_model::{log_enter, log_exit, CellValue, Row};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregatedTree, AggregationPosition, NodeAggregation};
use crate::definition::{GridOptions, SortDirection, SortModel, TreeDataPlaceholder};
use crate::filtering::FilteredRows;
use crate::row_tree::{GroupNode, NodeId, RowTree, ROOT_NODE_ID};

/// Prefix of synthetic footer row ids.
pub const FOOTER_ID_PREFIX: &str = "auto-generated-group-footer-";

// ============================================================================
// SORTING
// ============================================================================

/// What a sort comparator sees of one sibling.
pub struct SortContext<'a> {
    pub node: &'a GroupNode,
    pub row: Option<&'a Row>,
    tree: &'a RowTree,
}

impl<'a> SortContext<'a> {
    /// Sort value of the node for `field`. Groups sorted by their own
    /// grouping field use their key; groups without a row are Empty.
    pub fn value(&self, field: &str) -> CellValue {
        if self.node.grouping_field.as_deref() == Some(field) {
            return self.node.grouping_key.clone();
        }
        match self.row {
            Some(row) => self.tree.columns().value(row, field),
            None => CellValue::Empty,
        }
    }
}

type SortComparator = dyn Fn(&SortContext<'_>, &SortContext<'_>) -> Ordering + Send + Sync;

/// Sibling comparator. Without one, siblings keep insertion order.
#[derive(Clone, Default)]
pub struct RowSort(Option<Arc<SortComparator>>);

impl RowSort {
    pub fn none() -> Self {
        RowSort(None)
    }

    pub fn new<F>(comparator: F) -> Self
    where
        F: Fn(&SortContext<'_>, &SortContext<'_>) -> Ordering + Send + Sync + 'static,
    {
        RowSort(Some(Arc::new(comparator)))
    }

    /// Compiles a sort model into a multi-key comparator.
    pub fn from_model(model: &SortModel) -> Self {
        if model.0.is_empty() {
            return RowSort::none();
        }
        let items = model.0.clone();
        RowSort::new(move |a, b| {
            for item in &items {
                let ordering = a.value(&item.field).compare(&b.value(&item.field));
                let ordering = match item.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        })
    }

    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for RowSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RowSort").field(&self.0.is_some()).finish()
    }
}

// ============================================================================
// EXPANSION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionState {
    /// Groups with depth below this start expanded. `-1` expands all.
    pub default_depth: i32,
    /// Explicit per-node choices, winning over the default.
    #[serde(default)]
    pub overrides: FxHashMap<NodeId, bool>,
}

impl Default for ExpansionState {
    fn default() -> Self {
        ExpansionState {
            default_depth: -1,
            overrides: FxHashMap::default(),
        }
    }
}

impl ExpansionState {
    pub fn with_default_depth(default_depth: i32) -> Self {
        ExpansionState {
            default_depth,
            overrides: FxHashMap::default(),
        }
    }

    pub fn from_options(options: &GridOptions) -> Self {
        ExpansionState::with_default_depth(options.default_grouping_expansion_depth)
    }

    pub fn is_expanded(&self, node: &GroupNode) -> bool {
        if node.is_root() {
            return true;
        }
        match self.overrides.get(&node.id) {
            Some(&expanded) => expanded,
            None => self.default_depth == -1 || node.depth < self.default_depth,
        }
    }

    pub fn set_expanded(&self, node_id: &str, expanded: bool) -> Self {
        let mut next = self.clone();
        next.overrides.insert(node_id.to_string(), expanded);
        next
    }

    pub fn toggle(&self, node: &GroupNode) -> Self {
        self.set_expanded(&node.id, !self.is_expanded(node))
    }
}

// ============================================================================
// DERIVED ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub node_id: NodeId,
    pub row_id: Option<String>,
    pub depth: i32,
    pub is_group: bool,
    pub is_expanded: bool,
    /// Present when the node's aggregate is placed inline.
    pub inline_aggregation: Option<Arc<NodeAggregation>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRow {
    pub id: String,
    /// Node whose aggregate this row shows.
    pub owner: NodeId,
    pub depth: i32,
    pub aggregation: Arc<NodeAggregation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DerivedRow {
    Data(DataRow),
    Aggregation(AggregationRow),
}

impl DerivedRow {
    pub fn id(&self) -> &str {
        match self {
            DerivedRow::Data(row) => &row.node_id,
            DerivedRow::Aggregation(row) => &row.id,
        }
    }

    pub fn depth(&self) -> i32 {
        match self {
            DerivedRow::Data(row) => row.depth,
            DerivedRow::Aggregation(row) => row.depth,
        }
    }

    pub fn is_aggregation(&self) -> bool {
        matches!(self, DerivedRow::Aggregation(_))
    }
}

pub fn footer_row_id(node_id: &str) -> String {
    format!("{}{}", FOOTER_ID_PREFIX, node_id)
}

/// Ordered rows for the renderer.
#[derive(Debug, Clone)]
pub struct DerivedRowList {
    tree: Arc<RowTree>,
    rows: Vec<DerivedRow>,
}

impl DerivedRowList {
    pub fn rows(&self) -> &[DerivedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id()).collect()
    }

    pub fn tree(&self) -> &Arc<RowTree> {
        &self.tree
    }

    /// Value the renderer shows for `field` on `row`.
    pub fn cell_value(&self, row: &DerivedRow, field: &str) -> CellValue {
        self.cell(row, field).0
    }

    /// Display text for `field` on `row`.
    pub fn cell_text(&self, row: &DerivedRow, field: &str) -> String {
        self.cell(row, field).1
    }

    /// Display text of `field` for every row, in list order.
    pub fn column_display_values(&self, field: &str) -> Vec<String> {
        self.rows.iter().map(|row| self.cell_text(row, field)).collect()
    }

    fn cell(&self, row: &DerivedRow, field: &str) -> (CellValue, String) {
        let aggregated = |aggregation: &NodeAggregation| {
            aggregation
                .cell(field)
                .map(|c| (c.value.clone(), c.formatted.clone()))
        };

        match row {
            DerivedRow::Aggregation(footer) => {
                aggregated(footer.aggregation.as_ref()).unwrap_or((CellValue::Empty, String::new()))
            }
            DerivedRow::Data(data) => {
                if let Some(cell) = data.inline_aggregation.as_deref().and_then(aggregated) {
                    return cell;
                }
                if data.is_group && !self.tree.is_tree_data() {
                    return (CellValue::Empty, String::new());
                }
                let Some(source) = data.row_id.as_deref().and_then(|id| self.tree.row(id)) else {
                    return (CellValue::Empty, String::new());
                };
                let columns = self.tree.columns();
                let value = columns.value(source, field);
                let text = match columns.get(field) {
                    Some(column) => column.format(&value),
                    None => value.display(),
                };
                (value, text)
            }
        }
    }

    /// Grouping-column label of a data row. `None` for plain leaves in
    /// column grouping and for footers.
    pub fn group_label(&self, row: &DerivedRow, placeholder: TreeDataPlaceholder) -> Option<String> {
        let DerivedRow::Data(data) = row else {
            return None;
        };
        let node = self.tree.node(&data.node_id)?;
        if self.tree.is_tree_data() {
            if node.is_auto_generated && placeholder == TreeDataPlaceholder::Blank {
                return Some(String::new());
            }
            return Some(node.grouping_label());
        }
        if node.is_group() {
            Some(node.grouping_label())
        } else {
            None
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub fn compute_derived_row_list(
    aggregated: &AggregatedTree,
    sort: &RowSort,
    filtered: &FilteredRows,
    expansion: &ExpansionState,
) -> DerivedRowList {
    log_enter!("ROWLIST", "compute_derived_row_list", "sorted={}", sort.is_active());

    let tree = Arc::clone(aggregated.tree());
    let mut builder = ListBuilder {
        tree: tree.as_ref(),
        aggregated,
        sort,
        filtered,
        expansion,
        rows: Vec::new(),
    };
    builder.emit_children(tree.root());

    // Grand total goes last, whatever the sort.
    let root = tree.root();
    if let Some(aggregation) = aggregated.get(ROOT_NODE_ID) {
        if aggregation.position == AggregationPosition::Footer {
            builder.rows.push(DerivedRow::Aggregation(AggregationRow {
                id: footer_row_id(&root.id),
                owner: root.id.clone(),
                depth: 0,
                aggregation: Arc::clone(aggregation),
            }));
        }
    }

    let rows = builder.rows;
    log_exit!("ROWLIST", "compute_derived_row_list", "rows={}", rows.len());
    DerivedRowList { tree, rows }
}

struct ListBuilder<'a> {
    tree: &'a RowTree,
    aggregated: &'a AggregatedTree,
    sort: &'a RowSort,
    filtered: &'a FilteredRows,
    expansion: &'a ExpansionState,
    rows: Vec<DerivedRow>,
}

impl<'a> ListBuilder<'a> {
    fn sorted_children(&self, node: &'a GroupNode) -> Vec<&'a GroupNode> {
        let tree = self.tree;
        let mut children: Vec<&GroupNode> = node
            .children
            .iter()
            .filter(|id| self.filtered.is_visible(id))
            .filter_map(|id| tree.node(id))
            .collect();

        if let Some(comparator) = &self.sort.0 {
            children.sort_by(|a, b| {
                let left = SortContext {
                    node: a,
                    row: tree.node_row(a),
                    tree,
                };
                let right = SortContext {
                    node: b,
                    row: tree.node_row(b),
                    tree,
                };
                comparator(&left, &right)
            });
        }
        children
    }

    /// Emits every visible child of `node`, with their subtrees and footers.
    fn emit_children(&mut self, node: &'a GroupNode) -> usize {
        let children = self.sorted_children(node);
        let count = children.len();
        for child in children {
            self.emit_node(child);
        }
        count
    }

    fn emit_node(&mut self, node: &'a GroupNode) {
        let aggregation = self.aggregated.get(&node.id);
        let is_group = node.is_group();
        let is_expanded = is_group && self.expansion.is_expanded(node);

        self.rows.push(DerivedRow::Data(DataRow {
            node_id: node.id.clone(),
            row_id: node.row_id.clone(),
            depth: node.depth,
            is_group,
            is_expanded,
            inline_aggregation: aggregation
                .filter(|a| a.position == AggregationPosition::Inline)
                .cloned(),
        }));

        if !is_expanded {
            return;
        }
        let emitted = self.emit_children(node);

        if let Some(footer) = aggregation.filter(|a| a.position == AggregationPosition::Footer) {
            if emitted > 0 {
                self.rows.push(DerivedRow::Aggregation(AggregationRow {
                    id: footer_row_id(&node.id),
                    owner: node.id.clone(),
                    depth: node.depth + 1,
                    aggregation: Arc::clone(footer),
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{compute_aggregated_tree, AggregationConfig, PositionPolicy};
    use crate::definition::AggregationModel;
    use crate::filtering::{compute_filtered_rows, RowFilter};
    use crate::functions::AggregationFunctionSet;
    use crate::row_tree::{compute_row_tree, GroupingConfig};
    use grid_model::{ColumnDescriptor, ColumnSet};

    fn columns() -> ColumnSet {
        ColumnSet::new(vec![ColumnDescriptor::new("category"), ColumnDescriptor::new("price")])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new("1").with("category", "A").with("price", 1.0),
            Row::new("2").with("category", "B").with("price", 2.0),
            Row::new("3").with("category", "A").with("price", 3.0),
        ]
    }

    fn derive(policy: PositionPolicy, sort: RowSort, expansion: ExpansionState) -> DerivedRowList {
        let tree = compute_row_tree(&rows(), &columns(), &GroupingConfig::by_columns(&["category"])).unwrap();
        let config = AggregationConfig::new(
            &AggregationModel::new().with("price", "sum"),
            &columns(),
            &AggregationFunctionSet::builtin(),
        )
        .with_policy(policy);
        let filtered = compute_filtered_rows(&tree, &RowFilter::none());
        let aggregated = compute_aggregated_tree(&tree, &config, &filtered);
        compute_derived_row_list(&aggregated, &sort, &filtered, &expansion)
    }

    #[test]
    fn test_footer_rows_follow_last_descendant() {
        let list = derive(PositionPolicy::default(), RowSort::none(), ExpansionState::default());
        assert_eq!(
            list.ids(),
            vec![
                "auto-generated-row-category/A",
                "1",
                "3",
                "auto-generated-group-footer-auto-generated-row-category/A",
                "auto-generated-row-category/B",
                "2",
                "auto-generated-group-footer-auto-generated-row-category/B",
                "auto-generated-group-footer-auto-generated-group-node-root",
            ]
        );
        assert_eq!(list.column_display_values("price")[3], "4");
        assert_eq!(list.column_display_values("price")[7], "6");
    }

    #[test]
    fn test_inline_policy_overlays_group_rows() {
        let list = derive(PositionPolicy::inline_groups(), RowSort::none(), ExpansionState::default());
        assert_eq!(list.len(), 6);
        let first = &list.rows()[0];
        assert_eq!(list.cell_value(first, "price"), CellValue::Number(4.0));
        assert_eq!(list.cell_text(&list.rows()[1], "price"), "1");
        assert!(list.rows()[5].is_aggregation());
    }

    #[test]
    fn test_sort_reorders_siblings_but_total_stays_last() {
        let sort = RowSort::from_model(&SortModel::by("price", SortDirection::Desc));
        let list = derive(PositionPolicy::default(), sort, ExpansionState::default());
        let ids = list.ids();
        assert_eq!(ids[1], "3");
        assert_eq!(ids[2], "1");
        assert_eq!(*ids.last().unwrap(), "auto-generated-group-footer-auto-generated-group-node-root");
    }

    #[test]
    fn test_collapsed_group_hides_children_and_footer() {
        let expansion = ExpansionState::default().set_expanded("auto-generated-row-category/A", false);
        let list = derive(PositionPolicy::default(), RowSort::none(), expansion);
        assert_eq!(
            list.ids(),
            vec![
                "auto-generated-row-category/A",
                "auto-generated-row-category/B",
                "2",
                "auto-generated-group-footer-auto-generated-row-category/B",
                "auto-generated-group-footer-auto-generated-group-node-root",
            ]
        );
    }

    #[test]
    fn test_default_depth_collapses_everything() {
        let list = derive(PositionPolicy::default(), RowSort::none(), ExpansionState::with_default_depth(0));
        assert_eq!(list.len(), 3);
        let DerivedRow::Data(first) = &list.rows()[0] else {
            panic!("expected a data row");
        };
        assert!(first.is_group);
        assert!(!first.is_expanded);
    }

    #[test]
    fn test_toggle_flips_default() {
        let state = ExpansionState::default();
        let tree = compute_row_tree(&rows(), &columns(), &GroupingConfig::by_columns(&["category"])).unwrap();
        let node = tree.node("auto-generated-row-category/B").unwrap();
        let toggled = state.toggle(node);
        assert!(!toggled.is_expanded(node));
        assert!(toggled.toggle(node).is_expanded(node));
    }
}
