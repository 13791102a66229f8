//! FILENAME: core/aggregation-engine/src/definition.rs
//! Grid Definition - The serializable configuration.
//!
//! This module contains the plain models the host application hands in and
//! out: grouping, aggregation, sorting, filtering and grid-wide options.
//! These structures are designed to be:
//! - Serializable (JSON in camelCase)
//! - Free of callbacks; they are compiled into `RowSort`, `RowFilter` and
//!   `AggregationRules` before use
//! - Immutable snapshots of user intent

use grid_model::CellValue;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// GROUPING
// ============================================================================

/// Ordered list of fields used for row grouping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupingModel(pub Vec<String>);

impl GroupingModel {
    pub fn new(fields: &[&str]) -> Self {
        GroupingModel(fields.iter().map(|f| f.to_string()).collect())
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Maps a column field to the name of its aggregation function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregationModel(pub FxHashMap<String, String>);

impl AggregationModel {
    pub fn new() -> Self {
        AggregationModel::default()
    }

    pub fn with(mut self, field: impl Into<String>, function: impl Into<String>) -> Self {
        self.0.insert(field.into(), function.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which leaves feed the aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationRowsScope {
    /// Only leaves that pass the active filter.
    Filtered,
    /// Every leaf, regardless of filtering.
    All,
}

impl Default for AggregationRowsScope {
    fn default() -> Self {
        AggregationRowsScope::Filtered
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortItem {
    pub field: String,
    pub sort: SortDirection,
}

/// Multi-key sort applied to siblings. Earlier items take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortModel(pub Vec<SortItem>);

impl SortModel {
    pub fn by(field: impl Into<String>, sort: SortDirection) -> Self {
        SortModel(vec![SortItem {
            field: field.into(),
            sort,
        }])
    }

    pub fn then(mut self, field: impl Into<String>, sort: SortDirection) -> Self {
        self.0.push(SortItem {
            field: field.into(),
            sort,
        });
        self
    }
}

// ============================================================================
// FILTERING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "isEmpty")]
    IsEmpty,
    #[serde(rename = "isNotEmpty")]
    IsNotEmpty,
}

impl FilterOperator {
    /// Whether the operator compares against `FilterItem::value`.
    pub fn needs_value(&self) -> bool {
        !matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterItem {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<CellValue>,
}

impl FilterItem {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<CellValue>) -> Self {
        FilterItem {
            field: field.into(),
            operator,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicOperator {
    And,
    Or,
}

impl Default for LogicOperator {
    fn default() -> Self {
        LogicOperator::And
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterModel {
    #[serde(default)]
    pub items: Vec<FilterItem>,
    #[serde(default)]
    pub logic_operator: LogicOperator,
}

// ============================================================================
// GRID OPTIONS
// ============================================================================

/// How auto-generated tree-data groups (path segments without a row) are
/// labelled in the grouping column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeDataPlaceholder {
    /// Show the path segment.
    GroupingKey,
    /// Show nothing; the group is a pure structural container.
    Blank,
}

impl Default for TreeDataPlaceholder {
    fn default() -> Self {
        TreeDataPlaceholder::GroupingKey
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOptions {
    #[serde(default)]
    pub aggregation_rows_scope: AggregationRowsScope,

    /// Groups deeper than this start collapsed. `-1` expands everything.
    #[serde(default = "default_expansion_depth")]
    pub default_grouping_expansion_depth: i32,

    #[serde(default)]
    pub tree_data_placeholder: TreeDataPlaceholder,
}

fn default_expansion_depth() -> i32 {
    -1
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            aggregation_rows_scope: AggregationRowsScope::Filtered,
            default_grouping_expansion_depth: default_expansion_depth(),
            tree_data_placeholder: TreeDataPlaceholder::GroupingKey,
        }
    }
}
