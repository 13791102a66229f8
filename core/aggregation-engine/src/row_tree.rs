//! FILENAME: core/aggregation-engine/src/row_tree.rs
//! RowTree Builder - turns flat rows into the group hierarchy.
//!
//! Two modes are supported:
//! - Column grouping: each row's path is the list of its values for the
//!   grouping fields. Groups are created on demand, once per path prefix.
//! - Tree data: the path is read from the row by a host callback. Rows become
//!   nodes at their own path; missing intermediate segments are filled with
//!   auto-generated placeholder groups.
//!
//! The tree never looks at filtering or sorting. Those apply later.

use std::fmt;
use std::sync::Arc;

use grid_model::{log_debug, log_enter, log_exit, log_warn};
use grid_model::{CellValue, ColumnSet, Row, RowId, BLANK_LABEL};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::GroupingModel;
use crate::error::{GridError, Result};

/// Identifier of a node in the row tree.
pub type NodeId = String;

/// Id of the synthetic root node.
pub const ROOT_NODE_ID: &str = "auto-generated-group-node-root";

/// Prefix shared by all auto-generated group ids.
pub const GROUP_ID_PREFIX: &str = "auto-generated-row-";

/// Reads the hierarchy path of a row in tree-data mode.
pub type PathGetter = Arc<dyn Fn(&Row) -> Vec<String> + Send + Sync>;

/// Child lists are short in practice; most groups have a handful of children.
pub type ChildIds = SmallVec<[NodeId; 8]>;

// ============================================================================
// GROUPING CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub enum GroupingConfig {
    /// Group by the values of these fields, outermost first.
    ByColumns(Vec<String>),
    /// Read an explicit path from each row.
    TreeData(PathGetter),
}

impl GroupingConfig {
    /// No grouping: every row is a leaf directly under the root.
    pub fn flat() -> Self {
        GroupingConfig::ByColumns(Vec::new())
    }

    pub fn by_columns(fields: &[&str]) -> Self {
        GroupingConfig::ByColumns(fields.iter().map(|f| f.to_string()).collect())
    }

    pub fn tree_data<F>(getter: F) -> Self
    where
        F: Fn(&Row) -> Vec<String> + Send + Sync + 'static,
    {
        GroupingConfig::TreeData(Arc::new(getter))
    }

    pub fn is_tree_data(&self) -> bool {
        matches!(self, GroupingConfig::TreeData(_))
    }

    /// Structural equality for field lists, identity for path getters.
    pub fn same_as(&self, other: &GroupingConfig) -> bool {
        match (self, other) {
            (GroupingConfig::ByColumns(a), GroupingConfig::ByColumns(b)) => a == b,
            (GroupingConfig::TreeData(a), GroupingConfig::TreeData(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<GroupingModel> for GroupingConfig {
    fn from(model: GroupingModel) -> Self {
        GroupingConfig::ByColumns(model.0)
    }
}

impl fmt::Debug for GroupingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingConfig::ByColumns(fields) => f.debug_tuple("ByColumns").field(fields).finish(),
            GroupingConfig::TreeData(_) => f.write_str("TreeData(..)"),
        }
    }
}

// ============================================================================
// NODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Group,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub id: NodeId,
    pub kind: NodeKind,

    /// -1 for the root, parent depth + 1 otherwise.
    pub depth: i32,

    /// Back-reference used for upward walks. `None` only for the root.
    pub parent: Option<NodeId>,

    /// Children in insertion order.
    pub children: ChildIds,

    /// Field this group was built from (column grouping only).
    pub grouping_field: Option<String>,

    /// Value shared by the rows of this group, or the path segment in tree data.
    pub grouping_key: CellValue,

    /// Row backing this node. Always set for leaves; set for tree-data groups
    /// whose exact path exists in the input.
    pub row_id: Option<RowId>,

    /// True for the root, column groups and tree-data placeholders.
    pub is_auto_generated: bool,
}

impl GroupNode {
    pub fn is_root(&self) -> bool {
        self.depth == -1
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// Text shown in the grouping column for this node.
    pub fn grouping_label(&self) -> String {
        self.grouping_key.group_key()
    }

    fn root() -> Self {
        GroupNode {
            id: ROOT_NODE_ID.to_string(),
            kind: NodeKind::Group,
            depth: -1,
            parent: None,
            children: ChildIds::new(),
            grouping_field: None,
            grouping_key: CellValue::Empty,
            row_id: None,
            is_auto_generated: true,
        }
    }
}

// ============================================================================
// ROW TREE
// ============================================================================

/// Immutable result of one tree build.
#[derive(Debug, Clone)]
pub struct RowTree {
    nodes: FxHashMap<NodeId, GroupNode>,
    rows: Vec<Row>,
    row_index: FxHashMap<RowId, usize>,
    columns: ColumnSet,
    tree_data: bool,
    max_depth: i32,
}

impl RowTree {
    pub fn root(&self) -> &GroupNode {
        // The root is inserted before anything else and never removed.
        &self.nodes[ROOT_NODE_ID]
    }

    pub fn node(&self, id: &str) -> Option<&GroupNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: &str) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Leaf nodes below `id`, in tree order. A leaf is its own descendant.
    pub fn leaf_descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if node.is_leaf() {
                out.push(node.id.clone());
            }
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Ancestors of `id`, nearest first, ending with the root.
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent.as_ref());
        while let Some(parent_id) = current {
            out.push(parent_id.clone());
            current = self.nodes.get(parent_id).and_then(|n| n.parent.as_ref());
        }
        out
    }

    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.row_index.get(row_id).map(|&i| &self.rows[i])
    }

    /// Row backing a node, if any.
    pub fn node_row(&self, node: &GroupNode) -> Option<&Row> {
        node.row_id.as_deref().and_then(|id| self.row(id))
    }

    /// Input rows in their original order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn is_tree_data(&self) -> bool {
        self.tree_data
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GroupNode> {
        self.nodes.values()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

struct TreeBuilder {
    nodes: FxHashMap<NodeId, GroupNode>,
    max_depth: i32,
}

impl TreeBuilder {
    fn new() -> Self {
        let mut nodes = FxHashMap::default();
        nodes.insert(ROOT_NODE_ID.to_string(), GroupNode::root());
        TreeBuilder { nodes, max_depth: -1 }
    }

    /// Adds `node` under its parent. Ids are never overwritten: a row id
    /// equal to a generated node id is a collision.
    fn insert(&mut self, node: GroupNode) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GridError::RowIdCollision(node.id));
        }
        self.max_depth = self.max_depth.max(node.depth);
        if let Some(parent) = node.parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Replaces the id of an existing node, fixing the parent's child list
    /// and the children's back-references.
    fn rename(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        if old_id == new_id {
            return Ok(());
        }
        if self.nodes.contains_key(new_id) {
            return Err(GridError::RowIdCollision(new_id.to_string()));
        }
        let Some(mut node) = self.nodes.remove(old_id) else {
            return Ok(());
        };
        node.id = new_id.to_string();
        if let Some(parent) = node.parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            for child in parent.children.iter_mut() {
                if child == old_id {
                    *child = new_id.to_string();
                }
            }
        }
        for child_id in node.children.iter() {
            if let Some(child) = self.nodes.get_mut(child_id) {
                child.parent = Some(new_id.to_string());
            }
        }
        self.nodes.insert(new_id.to_string(), node);
        Ok(())
    }
}

/// Builds the row tree for `rows` under `grouping`.
///
/// Fails only on programmer errors: an empty or duplicated row id, or a row
/// id equal to a generated node id.
pub fn compute_row_tree(
    rows: &[Row],
    columns: &ColumnSet,
    grouping: &GroupingConfig,
) -> Result<Arc<RowTree>> {
    log_enter!(
        "ROWTREE",
        "compute_row_tree",
        "rows={} grouping={:?}",
        rows.len(),
        grouping
    );

    let mut row_index = FxHashMap::default();
    for (i, row) in rows.iter().enumerate() {
        if row.id.is_empty() {
            return Err(GridError::EmptyRowId(i));
        }
        if row_index.insert(row.id.clone(), i).is_some() {
            return Err(GridError::DuplicateRowId(row.id.clone()));
        }
    }

    let builder = match grouping {
        GroupingConfig::ByColumns(fields) => build_by_columns(rows, columns, fields)?,
        GroupingConfig::TreeData(getter) => build_tree_data(rows, getter.as_ref())?,
    };

    let tree = RowTree {
        nodes: builder.nodes,
        rows: rows.to_vec(),
        row_index,
        columns: columns.clone(),
        tree_data: grouping.is_tree_data(),
        max_depth: builder.max_depth,
    };

    log_exit!(
        "ROWTREE",
        "compute_row_tree",
        "nodes={} max_depth={}",
        tree.len(),
        tree.max_depth
    );
    Ok(Arc::new(tree))
}

fn build_by_columns(rows: &[Row], columns: &ColumnSet, fields: &[String]) -> Result<TreeBuilder> {
    let mut builder = TreeBuilder::new();
    let leaf_depth = fields.len() as i32;

    for row in rows {
        let mut parent_id = ROOT_NODE_ID.to_string();
        let mut segments: Vec<String> = Vec::with_capacity(fields.len());

        for (level, field) in fields.iter().enumerate() {
            let value = columns.value(row, field);
            let key = value.group_key();
            segments.push(format!("{}/{}", field, key));
            let group_id = format!("{}{}", GROUP_ID_PREFIX, segments.join("-"));

            if !builder.nodes.contains_key(&group_id) {
                if value.is_empty() {
                    log_debug!("ROWTREE", "row {} has no value for {}; using {}", row.id, field, BLANK_LABEL);
                }
                builder.insert(GroupNode {
                    id: group_id.clone(),
                    kind: NodeKind::Group,
                    depth: level as i32,
                    parent: Some(parent_id.clone()),
                    children: ChildIds::new(),
                    grouping_field: Some(field.clone()),
                    grouping_key: if value.is_empty() { CellValue::Empty } else { value },
                    row_id: None,
                    is_auto_generated: true,
                })?;
            } else if builder.nodes.get(&group_id).map_or(false, |n| n.is_leaf()) {
                return Err(GridError::RowIdCollision(group_id));
            }
            parent_id = group_id;
        }

        builder.insert(GroupNode {
            id: row.id.clone(),
            kind: NodeKind::Leaf,
            depth: leaf_depth,
            parent: Some(parent_id),
            children: ChildIds::new(),
            grouping_field: None,
            grouping_key: CellValue::Empty,
            row_id: Some(row.id.clone()),
            is_auto_generated: false,
        })?;
    }

    Ok(builder)
}

fn placeholder_id(path: &[String]) -> NodeId {
    format!("{}{}", GROUP_ID_PREFIX, path.join("/"))
}

fn build_tree_data(
    rows: &[Row],
    getter: &(dyn Fn(&Row) -> Vec<String> + Send + Sync),
) -> Result<TreeBuilder> {
    let mut builder = TreeBuilder::new();
    // Path -> node id for every path that has a node.
    let mut by_path: FxHashMap<Vec<String>, NodeId> = FxHashMap::default();
    // Paths whose node is backed by a row.
    let mut real_paths: FxHashSet<Vec<String>> = FxHashSet::default();

    for row in rows {
        let mut path = getter(row);
        if path.is_empty() {
            log_warn!("ROWTREE", "row {} has an empty path; using {}", row.id, BLANK_LABEL);
            path = vec![BLANK_LABEL.to_string(), row.id.clone()];
        }

        // Connect the path to the root, creating placeholders as needed.
        let mut parent_id = ROOT_NODE_ID.to_string();
        for depth in 0..path.len() - 1 {
            let prefix = path[..=depth].to_vec();
            if let Some(existing) = by_path.get(&prefix) {
                parent_id = existing.clone();
                continue;
            }
            let id = placeholder_id(&prefix);
            builder.insert(GroupNode {
                id: id.clone(),
                kind: NodeKind::Group,
                depth: depth as i32,
                parent: Some(parent_id.clone()),
                children: ChildIds::new(),
                grouping_field: None,
                grouping_key: CellValue::text(prefix[depth].clone()),
                row_id: None,
                is_auto_generated: true,
            })?;
            by_path.insert(prefix, id.clone());
            parent_id = id;
        }

        let depth = (path.len() - 1) as i32;
        let segment = CellValue::text(path[path.len() - 1].clone());

        if real_paths.contains(&path) {
            // Same path twice: keep the row as a separate sibling leaf.
            log_warn!("ROWTREE", "duplicate path {:?} for row {}", path, row.id);
            builder.insert(GroupNode {
                id: row.id.clone(),
                kind: NodeKind::Leaf,
                depth,
                parent: Some(parent_id),
                children: ChildIds::new(),
                grouping_field: None,
                grouping_key: segment,
                row_id: Some(row.id.clone()),
                is_auto_generated: false,
            })?;
            continue;
        }

        match by_path.get(&path).cloned() {
            Some(placeholder) => {
                // A descendant arrived first; the row takes over its placeholder.
                builder.rename(&placeholder, &row.id)?;
                if let Some(node) = builder.nodes.get_mut(&row.id) {
                    node.row_id = Some(row.id.clone());
                    node.is_auto_generated = false;
                }
                by_path.insert(path.clone(), row.id.clone());
            }
            None => {
                builder.insert(GroupNode {
                    id: row.id.clone(),
                    kind: NodeKind::Leaf,
                    depth,
                    parent: Some(parent_id),
                    children: ChildIds::new(),
                    grouping_field: None,
                    grouping_key: segment,
                    row_id: Some(row.id.clone()),
                    is_auto_generated: false,
                })?;
                by_path.insert(path.clone(), row.id.clone());
            }
        }
        real_paths.insert(path);
    }

    // A row node is a group as soon as something hangs below it.
    for node in builder.nodes.values_mut() {
        if node.row_id.is_some() {
            node.kind = if node.children.is_empty() {
                NodeKind::Leaf
            } else {
                NodeKind::Group
            };
        }
    }

    Ok(builder)
}
