//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for aggregation engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use aggregation_engine::{
    AggregationModel, GridInput, GridPipeline, GridSnapshot, GroupingConfig, PositionPolicy,
    RowFilter, RowSort,
};
use grid_model::{CellValue, ColumnDescriptor, ColumnSet, Row};

/// Test harness wrapping a pipeline and the input it is fed.
pub struct GridHarness {
    pub input: GridInput,
    pub pipeline: GridPipeline,
}

impl GridHarness {
    pub fn new(rows: Vec<Row>, columns: ColumnSet) -> Self {
        GridHarness {
            input: GridInput::new(rows, columns),
            pipeline: GridPipeline::new(),
        }
    }

    /// Five rows over two category columns.
    pub fn baseline() -> Self {
        Self::new(baseline_rows(), baseline_columns())
    }

    pub fn grouped_by(mut self, fields: &[&str]) -> Self {
        self.input.grouping = GroupingConfig::by_columns(fields);
        self
    }

    pub fn tree_data(mut self) -> Self {
        self.input.grouping = path_grouping();
        self
    }

    pub fn aggregate(mut self, field: &str, function: &str) -> Self {
        self.input.aggregation_model = std::mem::take(&mut self.input.aggregation_model).with(field, function);
        self
    }

    pub fn policy(mut self, policy: PositionPolicy) -> Self {
        self.input.position_policy = policy;
        self
    }

    pub fn filter(mut self, filter: RowFilter) -> Self {
        self.input.filter = filter;
        self
    }

    pub fn sort(mut self, sort: RowSort) -> Self {
        self.input.sort = sort;
        self
    }

    pub fn run(&mut self) -> Arc<GridSnapshot> {
        self.pipeline.update(&self.input).expect("pipeline update")
    }

    /// Display text of `field` for every derived row.
    pub fn column_values(&mut self, field: &str) -> Vec<String> {
        self.run().rows.column_display_values(field)
    }

    pub fn row_ids(&mut self) -> Vec<String> {
        self.run().rows.ids().into_iter().map(String::from).collect()
    }
}

pub fn baseline_columns() -> ColumnSet {
    ColumnSet::new(vec![
        ColumnDescriptor::new("id"),
        ColumnDescriptor::new("category1"),
        ColumnDescriptor::new("category2"),
    ])
}

pub fn baseline_rows() -> Vec<Row> {
    [
        (0.0, "Cat A", "Cat 1"),
        (1.0, "Cat A", "Cat 2"),
        (2.0, "Cat A", "Cat 2"),
        (3.0, "Cat B", "Cat 2"),
        (4.0, "Cat B", "Cat 1"),
    ]
    .iter()
    .map(|(id, c1, c2)| {
        Row::new(format!("{}", id))
            .with("id", *id)
            .with("category1", *c1)
            .with("category2", *c2)
    })
    .collect()
}

/// Tree-data rows: id is the `/`-joined path, `value` holds the number.
pub fn tree_rows(entries: &[(&str, f64)]) -> Vec<Row> {
    entries
        .iter()
        .map(|(path, value)| Row::new(*path).with("path", *path).with("value", *value))
        .collect()
}

pub fn tree_columns() -> ColumnSet {
    ColumnSet::new(vec![ColumnDescriptor::new("path"), ColumnDescriptor::new("value")])
}

pub fn path_grouping() -> GroupingConfig {
    GroupingConfig::tree_data(|row| match row.get("path") {
        CellValue::Text(path) if !path.is_empty() => path.split('/').map(String::from).collect(),
        _ => Vec::new(),
    })
}

pub fn empty_model() -> AggregationModel {
    AggregationModel::new()
}
