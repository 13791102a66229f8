//! FILENAME: core/date-field/src/validation.rs
//! Date validation against min/max bounds, past/future flags and a
//! host-supplied disable callback.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::DateAdapter;
use crate::section::CompositeValue;

pub type DisableDatePredicate<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationError {
    /// Partial entry or a date that does not exist.
    InvalidDate,
    MinDate,
    MaxDate,
    DisablePast,
    DisableFuture,
    ShouldDisableDate,
    /// Range start is after range end.
    InvalidRange,
}

impl ValidationError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationError::InvalidDate => "invalidDate",
            ValidationError::MinDate => "minDate",
            ValidationError::MaxDate => "maxDate",
            ValidationError::DisablePast => "disablePast",
            ValidationError::DisableFuture => "disableFuture",
            ValidationError::ShouldDisableDate => "shouldDisableDate",
            ValidationError::InvalidRange => "invalidRange",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PROPS
// ============================================================================

/// Constraints on a picked date. Unset bounds fall back to the adapter's
/// default min/max dates.
pub struct DateValidationProps<D> {
    pub min_date: Option<D>,
    pub max_date: Option<D>,
    pub disable_past: bool,
    pub disable_future: bool,
    pub should_disable_date: Option<DisableDatePredicate<D>>,
}

impl<D> Default for DateValidationProps<D> {
    fn default() -> Self {
        DateValidationProps {
            min_date: None,
            max_date: None,
            disable_past: false,
            disable_future: false,
            should_disable_date: None,
        }
    }
}

impl<D: Clone> Clone for DateValidationProps<D> {
    fn clone(&self) -> Self {
        DateValidationProps {
            min_date: self.min_date.clone(),
            max_date: self.max_date.clone(),
            disable_past: self.disable_past,
            disable_future: self.disable_future,
            should_disable_date: self.should_disable_date.clone(),
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for DateValidationProps<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateValidationProps")
            .field("min_date", &self.min_date)
            .field("max_date", &self.max_date)
            .field("disable_past", &self.disable_past)
            .field("disable_future", &self.disable_future)
            .field("should_disable_date", &self.should_disable_date.is_some())
            .finish()
    }
}

impl<D> DateValidationProps<D> {
    pub fn new() -> Self {
        DateValidationProps::default()
    }

    pub fn with_min_date(mut self, date: D) -> Self {
        self.min_date = Some(date);
        self
    }

    pub fn with_max_date(mut self, date: D) -> Self {
        self.max_date = Some(date);
        self
    }

    pub fn with_disable_past(mut self, disable_past: bool) -> Self {
        self.disable_past = disable_past;
        self
    }

    pub fn with_disable_future(mut self, disable_future: bool) -> Self {
        self.disable_future = disable_future;
        self
    }

    pub fn with_should_disable_date<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        self.should_disable_date = Some(Arc::new(predicate));
        self
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// First failing check for `date`, in order: disable callback, future,
/// past, min, max. Comparisons are by day.
pub fn validate_date<A: DateAdapter>(
    adapter: &A,
    date: &A::Date,
    props: &DateValidationProps<A::Date>,
) -> Option<ValidationError> {
    if props.should_disable_date.as_ref().map_or(false, |p| p(date)) {
        return Some(ValidationError::ShouldDisableDate);
    }
    let now = adapter.now();
    if props.disable_future && adapter.is_after_day(date, &now) {
        return Some(ValidationError::DisableFuture);
    }
    if props.disable_past && adapter.is_before_day(date, &now) {
        return Some(ValidationError::DisablePast);
    }
    let min = props.min_date.clone().unwrap_or_else(|| adapter.default_min_date());
    if adapter.is_before_day(date, &min) {
        return Some(ValidationError::MinDate);
    }
    let max = props.max_date.clone().unwrap_or_else(|| adapter.default_max_date());
    if adapter.is_after_day(date, &max) {
        return Some(ValidationError::MaxDate);
    }
    None
}

pub fn is_date_disabled<A: DateAdapter>(
    adapter: &A,
    date: &A::Date,
    props: &DateValidationProps<A::Date>,
) -> bool {
    validate_date(adapter, date, props).is_some()
}

/// Empty is valid; partial or impossible entries are `InvalidDate`.
pub fn validate_composite<A: DateAdapter>(
    adapter: &A,
    value: &CompositeValue<A::Date>,
    props: &DateValidationProps<A::Date>,
) -> Option<ValidationError> {
    match value {
        CompositeValue::Empty => None,
        CompositeValue::Incomplete(_) | CompositeValue::Invalid(_) => Some(ValidationError::InvalidDate),
        CompositeValue::Date(date) => validate_date(adapter, date, props),
    }
}

/// Per-endpoint errors for a date range. A start after the end marks both
/// endpoints `InvalidRange`.
pub fn validate_date_range<A: DateAdapter>(
    adapter: &A,
    start: Option<&A::Date>,
    end: Option<&A::Date>,
    props: &DateValidationProps<A::Date>,
) -> [Option<ValidationError>; 2] {
    let start_error = start.and_then(|d| validate_date(adapter, d, props));
    let end_error = end.and_then(|d| validate_date(adapter, d, props));
    if start_error.is_some() || end_error.is_some() {
        return [start_error, end_error];
    }
    match (start, end) {
        (Some(s), Some(e)) if adapter.is_after_day(s, e) => {
            [Some(ValidationError::InvalidRange), Some(ValidationError::InvalidRange)]
        }
        _ => [None, None],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ChronoAdapter, DateParts};
    use chrono::{Datelike, NaiveDateTime, Weekday};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        ChronoAdapter::date(y, m, d).unwrap()
    }

    fn adapter() -> ChronoAdapter {
        ChronoAdapter::with_now(at(2020, 6, 15))
    }

    #[test]
    fn test_check_order() {
        let adapter = adapter();
        let props = DateValidationProps::new()
            .with_disable_past(true)
            .with_min_date(at(2020, 7, 1))
            .with_should_disable_date(|d: &NaiveDateTime| d.weekday() == Weekday::Sun);
        // 2020-06-07 is a Sunday in the past, before min.
        assert_eq!(validate_date(&adapter, &at(2020, 6, 7), &props), Some(ValidationError::ShouldDisableDate));
        assert_eq!(validate_date(&adapter, &at(2020, 6, 8), &props), Some(ValidationError::DisablePast));
        assert_eq!(validate_date(&adapter, &at(2020, 6, 16), &props), Some(ValidationError::MinDate));
        assert_eq!(validate_date(&adapter, &at(2020, 7, 1), &props), None);
    }

    #[test]
    fn test_today_is_neither_past_nor_future() {
        let adapter = adapter();
        let props = DateValidationProps::new().with_disable_past(true).with_disable_future(true);
        let later_today = at(2020, 6, 15).date().and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(validate_date(&adapter, &later_today, &props), None);
        assert_eq!(validate_date(&adapter, &at(2020, 6, 16), &props), Some(ValidationError::DisableFuture));
    }

    #[test]
    fn test_default_bounds() {
        let adapter = adapter();
        let props = DateValidationProps::new();
        assert_eq!(validate_date(&adapter, &at(1899, 12, 31), &props), Some(ValidationError::MinDate));
        assert_eq!(validate_date(&adapter, &at(2100, 1, 1), &props), Some(ValidationError::MaxDate));
    }

    #[test]
    fn test_composite_validation() {
        let adapter = adapter();
        let props = DateValidationProps::new();
        assert_eq!(validate_composite(&adapter, &CompositeValue::Empty, &props), None);
        assert_eq!(
            validate_composite(&adapter, &CompositeValue::Incomplete(DateParts::default()), &props),
            Some(ValidationError::InvalidDate)
        );
    }

    #[test]
    fn test_range_start_after_end() {
        let adapter = adapter();
        let props = DateValidationProps::new();
        let start = at(2020, 3, 2);
        let end = at(2020, 3, 1);
        assert_eq!(
            validate_date_range(&adapter, Some(&start), Some(&end), &props),
            [Some(ValidationError::InvalidRange), Some(ValidationError::InvalidRange)]
        );
        assert_eq!(validate_date_range(&adapter, Some(&end), Some(&start), &props), [None, None]);
        assert_eq!(validate_date_range(&adapter, Some(&start), None, &props), [None, None]);
    }
}
