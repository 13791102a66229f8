//! FILENAME: core/aggregation-engine/src/lib.rs
//! Grouping & aggregation engine for the data grid.
//!
//! This crate turns flat rows into a grouped, aggregated and flattened row
//! list. It depends on `grid-model` only for shared types (CellValue, Row,
//! ColumnSet) and the logging macros.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the grid IS)
//! - `row_tree`: Group hierarchy built from rows
//! - `filtering`: Visibility lookup over the tree
//! - `functions`: Aggregation functions and the per-grid function set
//! - `aggregation`: Bottom-up aggregation with position policy
//! - `row_list`: Flattened rows handed to the renderer
//! - `pipeline`: One atomic pass producing an immutable snapshot

pub mod aggregation;
pub mod definition;
pub mod error;
pub mod filtering;
pub mod functions;
pub mod pipeline;
pub mod row_list;
pub mod row_tree;

pub use aggregation::{
    compute_aggregated_tree, sanitize_aggregation_model, AggregatedCell, AggregatedTree,
    AggregationConfig, AggregationPosition, AggregationRule, AggregationRules, NodeAggregation,
    PositionPolicy,
};
pub use definition::*;
pub use error::{GridError, Result};
pub use filtering::{compute_filtered_rows, FilteredRows, GroupPredicate, RowFilter, RowPredicate};
pub use functions::{
    Accumulator, AggregationApply, AggregationFunction, AggregationFunctionSet, AggregationParams,
    BuiltinAggregation,
};
pub use pipeline::{GridInput, GridPipeline, GridSnapshot};
pub use row_list::{
    compute_derived_row_list, footer_row_id, AggregationRow, DataRow, DerivedRow, DerivedRowList,
    ExpansionState, RowSort, SortContext, FOOTER_ID_PREFIX,
};
pub use row_tree::{
    compute_row_tree, GroupNode, GroupingConfig, NodeId, NodeKind, PathGetter, RowTree,
    GROUP_ID_PREFIX, ROOT_NODE_ID,
};
