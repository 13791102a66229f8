//! FILENAME: core/grid-model/src/lib.rs
//! Shared grid model types.
//!
//! This crate holds the types every grid engine agrees on. It carries no
//! grouping or aggregation logic itself.
//!
//! Layers:
//! - `cell`: The value held by one cell
//! - `row`: Input records keyed by stable ids
//! - `column`: Column descriptors with accessor/formatter callbacks
//! - `logging`: Category logging macros used across the engines

pub mod cell;
pub mod column;
pub mod logging;
pub mod row;

pub use cell::{CellValue, BLANK_LABEL};
pub use column::{ColumnDescriptor, ColumnSet, ValueFormatter, ValueGetter};
pub use row::{Row, RowId};
