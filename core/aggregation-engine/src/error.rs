//! FILENAME: core/aggregation-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Duplicate row id: {0}")]
    DuplicateRowId(String),

    #[error("Row at index {0} has an empty id")]
    EmptyRowId(usize),

    #[error("Row id collides with a generated node id: {0}")]
    RowIdCollision(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
