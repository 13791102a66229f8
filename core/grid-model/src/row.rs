//! FILENAME: core/grid-model/src/row.rs
//! PURPOSE: Input rows handed to the grid by the host application.
//! CONTEXT: Rows are opaque records keyed by a stable id. The engines never
//! mutate them; every derived structure refers back to rows by id.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// Stable, unique identifier of an input row.
pub type RowId = String;

/// One record of the data set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default)]
    pub values: FxHashMap<String, CellValue>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Row {
            id: id.into(),
            values: FxHashMap::default(),
        }
    }

    /// Builder-style setter used by fixtures and hosts alike.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(field.into(), value.into());
    }

    /// Raw value stored under `field`, `Empty` when absent.
    pub fn get(&self, field: &str) -> CellValue {
        self.values.get(field).cloned().unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }
}
