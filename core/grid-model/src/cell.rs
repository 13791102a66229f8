//! FILENAME: core/grid-model/src/cell.rs
//! PURPOSE: Defines the value a single grid cell can hold.
//! CONTEXT: Rows store `CellValue`s by field. Grouping keys, aggregation
//! inputs and aggregation results are all expressed as `CellValue` so the
//! rendering layer only ever deals with one value type.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Label used for grouping keys that have no value.
pub const BLANK_LABEL: &str = "(blank)";

/// Represents the raw data within a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Returns true for `Empty` and for blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value. Only `Number` converts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the display value of the cell as a String.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Key used to identify a group built from this value.
    /// Empty values share the `(blank)` bucket.
    pub fn group_key(&self) -> String {
        if self.is_empty() {
            BLANK_LABEL.to_string()
        } else {
            self.display()
        }
    }

    /// Total order used for sorting and for min/max.
    /// Empty < Number < Date < Text < Boolean.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Less,
            (_, CellValue::Empty) => Ordering::Greater,

            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,

            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Date(_), _) => Ordering::Less,
            (_, CellValue::Date(_)) => Ordering::Greater,

            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Text(_), _) => Ordering::Less,
            (_, CellValue::Text(_)) => Ordering::Greater,

            (CellValue::Boolean(a), CellValue::Boolean(b)) => a.cmp(b),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}
