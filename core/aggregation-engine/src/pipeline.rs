//! FILENAME: core/aggregation-engine/src/pipeline.rs
//! Grid pipeline - one atomic pass from rows to the derived row list.
//!
//! Each update produces a new immutable `GridSnapshot`. The previous row tree
//! is reused only when rows, columns and grouping are the very same objects;
//! the previous aggregation only when its rules, policy, scope and inputs are
//! unchanged.

use std::sync::Arc;

use grid_model::{log_debug, log_enter, log_exit, ColumnSet, Row};

use crate::aggregation::{compute_aggregated_tree, AggregatedTree, AggregationConfig, PositionPolicy};
use crate::definition::{AggregationModel, AggregationRowsScope, GridOptions};
use crate::error::Result;
use crate::filtering::{compute_filtered_rows, FilteredRows, RowFilter};
use crate::functions::AggregationFunctionSet;
use crate::row_list::{compute_derived_row_list, DerivedRow, DerivedRowList, ExpansionState, RowSort};
use crate::row_tree::{compute_row_tree, GroupingConfig, RowTree};

/// Everything one pass needs.
#[derive(Clone, Debug)]
pub struct GridInput {
    pub rows: Arc<Vec<Row>>,
    pub columns: Arc<ColumnSet>,
    pub grouping: GroupingConfig,
    pub aggregation_model: AggregationModel,
    pub functions: AggregationFunctionSet,
    pub position_policy: PositionPolicy,
    pub filter: RowFilter,
    pub sort: RowSort,
    pub expansion: ExpansionState,
    pub options: GridOptions,
}

impl GridInput {
    pub fn new(rows: Vec<Row>, columns: ColumnSet) -> Self {
        let options = GridOptions::default();
        GridInput {
            rows: Arc::new(rows),
            columns: Arc::new(columns),
            grouping: GroupingConfig::flat(),
            aggregation_model: AggregationModel::default(),
            functions: AggregationFunctionSet::builtin(),
            position_policy: PositionPolicy::default(),
            filter: RowFilter::none(),
            sort: RowSort::none(),
            expansion: ExpansionState::from_options(&options),
            options,
        }
    }

    pub fn scope(&self) -> AggregationRowsScope {
        self.options.aggregation_rows_scope
    }
}

/// Result of one pass. Never mutated after creation.
#[derive(Debug)]
pub struct GridSnapshot {
    pub tree: Arc<RowTree>,
    pub filtered: Arc<FilteredRows>,
    pub aggregated: Arc<AggregatedTree>,
    pub rows: DerivedRowList,
    pub options: GridOptions,
    /// Increases by one per update.
    pub generation: u64,
}

impl GridSnapshot {
    pub fn group_label(&self, row: &DerivedRow) -> Option<String> {
        self.rows.group_label(row, self.options.tree_data_placeholder)
    }
}

#[derive(Default)]
pub struct GridPipeline {
    last: Option<Arc<GridSnapshot>>,
    last_input: Option<GridInput>,
    generation: u64,
}

impl GridPipeline {
    pub fn new() -> Self {
        GridPipeline::default()
    }

    pub fn snapshot(&self) -> Option<&Arc<GridSnapshot>> {
        self.last.as_ref()
    }

    /// Runs build, filter, aggregate and derive for `input`.
    pub fn update(&mut self, input: &GridInput) -> Result<Arc<GridSnapshot>> {
        log_enter!("PIPELINE", "update", "generation={}", self.generation + 1);

        let previous = self.last.as_ref().zip(self.last_input.as_ref());

        let tree_reusable = previous.map_or(false, |(_, last)| {
            Arc::ptr_eq(&last.rows, &input.rows)
                && Arc::ptr_eq(&last.columns, &input.columns)
                && last.grouping.same_as(&input.grouping)
        });
        let tree = match previous {
            Some((snapshot, _)) if tree_reusable => {
                log_debug!("PIPELINE", "reusing row tree");
                Arc::clone(&snapshot.tree)
            }
            _ => compute_row_tree(&input.rows, &input.columns, &input.grouping)?,
        };

        let filter_unchanged = previous.map_or(false, |(_, last)| last.filter.same_as(&input.filter));
        let filtered = match previous {
            Some((snapshot, _)) if tree_reusable && filter_unchanged => Arc::clone(&snapshot.filtered),
            _ => Arc::new(compute_filtered_rows(&tree, &input.filter)),
        };

        let config = AggregationConfig::new(&input.aggregation_model, &input.columns, &input.functions)
            .with_policy(input.position_policy.clone())
            .with_scope(input.scope());

        let aggregated = match previous {
            Some((snapshot, _))
                if tree_reusable
                    && snapshot.aggregated.is_current_for(&config)
                    && (filter_unchanged || config.scope == AggregationRowsScope::All) =>
            {
                log_debug!("PIPELINE", "reusing aggregation");
                Arc::clone(&snapshot.aggregated)
            }
            _ => Arc::new(compute_aggregated_tree(&tree, &config, &filtered)),
        };

        let rows = compute_derived_row_list(&aggregated, &input.sort, &filtered, &input.expansion);

        self.generation += 1;
        let snapshot = Arc::new(GridSnapshot {
            tree,
            filtered,
            aggregated,
            rows,
            options: input.options.clone(),
            generation: self.generation,
        });
        self.last = Some(Arc::clone(&snapshot));
        self.last_input = Some(input.clone());

        log_exit!("PIPELINE", "update", "rows={}", snapshot.rows.len());
        Ok(snapshot)
    }
}
