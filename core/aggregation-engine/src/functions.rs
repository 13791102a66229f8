//! FILENAME: core/aggregation-engine/src/functions.rs
//! Aggregation functions and the per-grid function set.
//!
//! Built-in functions share one `Accumulator` pass over the values:
//! - `sum`: numeric values only, 0 when there are none
//! - `avg`: mean of numeric values, empty when there are none
//! - `min` / `max`: numbers and dates, empty when there are none
//! - `size`: number of values

use std::fmt;
use std::sync::Arc;

use grid_model::{CellValue, ValueFormatter};
use rustc_hash::FxHashMap;

use crate::row_tree::GroupNode;

/// Everything an aggregation function sees for one (node, column) pair.
pub struct AggregationParams<'a> {
    /// Column values of the leaves in scope, in tree order.
    pub values: &'a [CellValue],
    pub field: &'a str,
    /// Node being aggregated. The root for the grand total.
    pub group_node: &'a GroupNode,
}

pub type AggregationApply = Arc<dyn Fn(&AggregationParams<'_>) -> CellValue + Send + Sync>;

// ============================================================================
// AGGREGATION FUNCTION
// ============================================================================

#[derive(Clone)]
pub struct AggregationFunction {
    pub apply: AggregationApply,

    /// Takes precedence over the column's own formatter.
    pub value_formatter: Option<ValueFormatter>,

    /// Whether the rendered cell is decorated as a computed summary.
    /// Unset means true.
    pub has_cell_unit: Option<bool>,

    pub label: Option<String>,
}

impl AggregationFunction {
    pub fn new<F>(apply: F) -> Self
    where
        F: Fn(&AggregationParams<'_>) -> CellValue + Send + Sync + 'static,
    {
        AggregationFunction {
            apply: Arc::new(apply),
            value_formatter: None,
            has_cell_unit: None,
            label: None,
        }
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&CellValue) -> String + Send + Sync + 'static,
    {
        self.value_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_cell_unit(mut self, has_cell_unit: bool) -> Self {
        self.has_cell_unit = Some(has_cell_unit);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn call(&self, params: &AggregationParams<'_>) -> CellValue {
        (self.apply)(params)
    }

    pub fn cell_unit(&self) -> bool {
        self.has_cell_unit.unwrap_or(true)
    }
}

impl fmt::Debug for AggregationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationFunction")
            .field("label", &self.label)
            .field("has_cell_unit", &self.has_cell_unit)
            .field("has_value_formatter", &self.value_formatter.is_some())
            .finish()
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state for the built-in functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<CellValue>,
    pub max: Option<CellValue>,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator::default()
    }

    pub fn from_values(values: &[CellValue]) -> Self {
        let mut acc = Accumulator::new();
        for value in values {
            acc.add(value);
        }
        acc
    }

    pub fn add(&mut self, value: &CellValue) {
        self.count += 1;
        match value {
            CellValue::Number(n) => {
                self.sum += n;
                self.count_numbers += 1;
                self.track_extremes(value);
            }
            CellValue::Date(_) => self.track_extremes(value),
            _ => {}
        }
    }

    fn track_extremes(&mut self, value: &CellValue) {
        let smaller = self.min.as_ref().map_or(true, |m| value.compare(m).is_lt());
        if smaller {
            self.min = Some(value.clone());
        }
        let larger = self.max.as_ref().map_or(true, |m| value.compare(m).is_gt());
        if larger {
            self.max = Some(value.clone());
        }
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &Accumulator) {
        self.sum += other.sum;
        self.count += other.count;
        self.count_numbers += other.count_numbers;
        if let Some(min) = &other.min {
            self.track_extremes(min);
        }
        if let Some(max) = &other.max {
            self.track_extremes(max);
        }
    }

    pub fn compute(&self, kind: BuiltinAggregation) -> CellValue {
        match kind {
            BuiltinAggregation::Sum => CellValue::Number(self.sum),
            BuiltinAggregation::Avg => {
                if self.count_numbers > 0 {
                    CellValue::Number(self.sum / self.count_numbers as f64)
                } else {
                    CellValue::Empty
                }
            }
            BuiltinAggregation::Min => self.min.clone().unwrap_or_default(),
            BuiltinAggregation::Max => self.max.clone().unwrap_or_default(),
            BuiltinAggregation::Size => CellValue::Number(self.count as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAggregation {
    Sum,
    Avg,
    Min,
    Max,
    Size,
}

impl BuiltinAggregation {
    pub const ALL: [BuiltinAggregation; 5] = [
        BuiltinAggregation::Sum,
        BuiltinAggregation::Avg,
        BuiltinAggregation::Min,
        BuiltinAggregation::Max,
        BuiltinAggregation::Size,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAggregation::Sum => "sum",
            BuiltinAggregation::Avg => "avg",
            BuiltinAggregation::Min => "min",
            BuiltinAggregation::Max => "max",
            BuiltinAggregation::Size => "size",
        }
    }

    pub fn function(self) -> AggregationFunction {
        let function = AggregationFunction::new(move |params| {
            Accumulator::from_values(params.values).compute(self)
        });
        match self {
            // A count is not expressed in the column's unit.
            BuiltinAggregation::Size => function.with_cell_unit(false),
            _ => function,
        }
    }
}

// ============================================================================
// FUNCTION SET
// ============================================================================

/// Functions available to one grid instance, by name.
#[derive(Clone, Debug, Default)]
pub struct AggregationFunctionSet {
    functions: FxHashMap<String, Arc<AggregationFunction>>,
    order: Vec<String>,
}

impl AggregationFunctionSet {
    pub fn empty() -> Self {
        AggregationFunctionSet::default()
    }

    /// `sum`, `avg`, `min`, `max` and `size`.
    pub fn builtin() -> Self {
        BuiltinAggregation::ALL
            .iter()
            .fold(AggregationFunctionSet::empty(), |set, kind| {
                set.with(kind.name(), kind.function())
            })
    }

    /// Registers `function` under `name`, shadowing any existing entry.
    pub fn with(self, name: impl Into<String>, function: AggregationFunction) -> Self {
        self.with_shared(name, Arc::new(function))
    }

    /// Like `with`, keeping the caller's `Arc` so identity can be compared.
    pub fn with_shared(mut self, name: impl Into<String>, function: Arc<AggregationFunction>) -> Self {
        let name = name.into();
        if self.functions.insert(name.clone(), function).is_none() {
            self.order.push(name);
        }
        self
    }

    /// Keeps only the named functions.
    pub fn only(mut self, names: &[&str]) -> Self {
        self.functions.retain(|name, _| names.contains(&name.as_str()));
        self.order.retain(|name| names.contains(&name.as_str()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<AggregationFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|n| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
