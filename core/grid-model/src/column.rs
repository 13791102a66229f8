//! FILENAME: core/grid-model/src/column.rs
//! PURPOSE: Column descriptors: value access, formatting and aggregation rules.
//! CONTEXT: Accessors and formatters are host callbacks. They are held as
//! shared closures so a descriptor can be cloned into every snapshot cheaply.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::cell::CellValue;
use crate::row::Row;

/// Computes a column value from a row.
pub type ValueGetter = Arc<dyn Fn(&Row) -> CellValue + Send + Sync>;

/// Renders a value for display.
pub type ValueFormatter = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

// ============================================================================
// COLUMN DESCRIPTOR
// ============================================================================

#[derive(Clone)]
pub struct ColumnDescriptor {
    /// Field name, also the key used by the aggregation and sort models.
    pub field: String,

    /// Custom accessor. When unset the row's own `field` entry is read.
    pub value_getter: Option<ValueGetter>,

    /// Whether aggregation functions may be applied to this column.
    pub aggregable: bool,

    /// Restricts the functions usable on this column. `None` allows all.
    pub available_aggregation_functions: Option<Vec<String>>,

    pub value_formatter: Option<ValueFormatter>,
}

impl ColumnDescriptor {
    pub fn new(field: impl Into<String>) -> Self {
        ColumnDescriptor {
            field: field.into(),
            value_getter: None,
            aggregable: true,
            available_aggregation_functions: None,
            value_formatter: None,
        }
    }

    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Row) -> CellValue + Send + Sync + 'static,
    {
        self.value_getter = Some(Arc::new(getter));
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&CellValue) -> String + Send + Sync + 'static,
    {
        self.value_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn not_aggregable(mut self) -> Self {
        self.aggregable = false;
        self
    }

    pub fn with_available_functions(mut self, names: &[&str]) -> Self {
        self.available_aggregation_functions =
            Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Value of this column for `row`.
    pub fn value(&self, row: &Row) -> CellValue {
        match &self.value_getter {
            Some(getter) => getter(row),
            None => row.get(&self.field),
        }
    }

    /// Display text for a value of this column.
    pub fn format(&self, value: &CellValue) -> String {
        match &self.value_formatter {
            Some(formatter) => formatter(value),
            None => value.display(),
        }
    }

    /// Whether the column's allow-list (if any) admits `function_name`.
    pub fn allows_function(&self, function_name: &str) -> bool {
        match &self.available_aggregation_functions {
            Some(names) => names.iter().any(|n| n == function_name),
            None => true,
        }
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("field", &self.field)
            .field("has_value_getter", &self.value_getter.is_some())
            .field("aggregable", &self.aggregable)
            .field(
                "available_aggregation_functions",
                &self.available_aggregation_functions,
            )
            .field("has_value_formatter", &self.value_formatter.is_some())
            .finish()
    }
}

// ============================================================================
// COLUMN SET
// ============================================================================

/// Ordered columns with lookup by field.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
    index: FxHashMap<String, usize>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let mut set = ColumnSet::default();
        for column in columns {
            set.push(column);
        }
        set
    }

    /// Appends a column. A column with an existing field replaces it in place.
    pub fn push(&mut self, column: ColumnDescriptor) {
        match self.index.get(&column.field) {
            Some(&i) => self.columns[i] = column,
            None => {
                self.index.insert(column.field.clone(), self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.index.get(field).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value of `field` for `row`; falls back to the raw row entry for
    /// fields that have no descriptor.
    pub fn value(&self, row: &Row, field: &str) -> CellValue {
        match self.get(field) {
            Some(column) => column.value(row),
            None => row.get(field),
        }
    }
}
