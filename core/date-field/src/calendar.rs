//! FILENAME: core/date-field/src/calendar.rs
//! Keyboard focus movement in a day calendar.
//!
//! - ArrowLeft / ArrowRight: one day, skipping disabled days up to the
//!   neighbouring month
//! - ArrowUp / ArrowDown: one week
//! - Home / End: first / last day of the week
//! - PageUp / PageDown: next / previous month
//!
//! Any other move onto a disabled day leaves focus where it is.

use grid_model::log_debug;
use serde::{Deserialize, Serialize};

use crate::adapter::DateAdapter;
use crate::validation::{is_date_disabled, DateValidationProps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarKey {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Nearest enabled day to `date` within `[min_date, max_date]`, searching
/// forward and backward one day at a time (forward first on ties).
/// `disable_past` / `disable_future` narrow the window to today.
pub fn find_closest_enabled_date<A: DateAdapter>(
    adapter: &A,
    date: &A::Date,
    min_date: &A::Date,
    max_date: &A::Date,
    props: &DateValidationProps<A::Date>,
) -> Option<A::Date> {
    let today = adapter.start_of_day(&adapter.now());
    let mut min_date = min_date.clone();
    let mut max_date = max_date.clone();
    if props.disable_past && adapter.is_before_day(&min_date, &today) {
        min_date = today.clone();
    }
    if props.disable_future && adapter.is_after_day(&max_date, &today) {
        max_date = today.clone();
    }

    let mut forward = Some(date.clone());
    let mut backward = Some(date.clone());
    if adapter.is_before_day(date, &min_date) {
        forward = Some(min_date.clone());
        backward = None;
    }
    if adapter.is_after_day(date, &max_date) {
        if backward.is_some() {
            backward = Some(max_date.clone());
        }
        forward = None;
    }

    while forward.is_some() || backward.is_some() {
        if forward.as_ref().map_or(false, |d| adapter.is_after_day(d, &max_date)) {
            forward = None;
        }
        if backward.as_ref().map_or(false, |d| adapter.is_before_day(d, &min_date)) {
            backward = None;
        }
        if let Some(day) = forward.take() {
            if !is_date_disabled(adapter, &day, props) {
                return Some(day);
            }
            forward = Some(adapter.add_days(&day, 1));
        }
        if let Some(day) = backward.take() {
            if !is_date_disabled(adapter, &day, props) {
                return Some(day);
            }
            backward = Some(adapter.add_days(&day, -1));
        }
    }
    None
}

/// Next focused day for `key`. Returns `focused` unchanged when the move
/// would land on a disabled day.
pub fn move_focus<A: DateAdapter>(
    adapter: &A,
    focused: &A::Date,
    key: CalendarKey,
    props: &DateValidationProps<A::Date>,
) -> A::Date {
    let target = match key {
        CalendarKey::ArrowLeft => {
            let previous = adapter.add_days(focused, -1);
            let window_start = adapter.start_of_month(&adapter.add_months(focused, -1));
            find_closest_enabled_date(adapter, &previous, &window_start, &previous, props)
                .unwrap_or(previous)
        }
        CalendarKey::ArrowRight => {
            let next = adapter.add_days(focused, 1);
            let window_end = adapter.end_of_month(&adapter.add_months(focused, 1));
            find_closest_enabled_date(adapter, &next, &next, &window_end, props).unwrap_or(next)
        }
        CalendarKey::ArrowUp => adapter.add_days(focused, -7),
        CalendarKey::ArrowDown => adapter.add_days(focused, 7),
        CalendarKey::Home => adapter.start_of_week(focused),
        CalendarKey::End => adapter.end_of_week(focused),
        CalendarKey::PageUp => adapter.add_months(focused, 1),
        CalendarKey::PageDown => adapter.add_months(focused, -1),
    };

    if is_date_disabled(adapter, &target, props) {
        log_debug!("CALENDAR", "{:?} blocked at {:?}", key, target);
        return focused.clone();
    }
    target
}
