//! FILENAME: tests/test_calendar_navigation.rs
//! PURPOSE: Tests for day calendar keyboard focus around disabled days.

mod common;

use chrono::NaiveDateTime;
use common::{adapter, at};
use date_field::{move_focus, CalendarKey, DateValidationProps};

fn january_props() -> DateValidationProps<NaiveDateTime> {
    let disabled = vec![
        at(2019, 12, 31),
        at(2020, 1, 1),
        at(2020, 1, 2),
        at(2020, 1, 10),
        at(2020, 1, 31),
        at(2020, 2, 1),
    ];
    DateValidationProps::new().with_should_disable_date(move |d: &NaiveDateTime| disabled.contains(d))
}

#[test]
fn test_horizontal_moves_skip_disabled_days() {
    let adapter = adapter();
    let props = january_props();
    assert_eq!(move_focus(&adapter, &at(2020, 1, 11), CalendarKey::ArrowLeft, &props), at(2020, 1, 9));
    assert_eq!(move_focus(&adapter, &at(2020, 1, 9), CalendarKey::ArrowRight, &props), at(2020, 1, 11));
}

#[test]
fn test_horizontal_moves_cross_month_boundaries() {
    let adapter = adapter();
    let props = january_props();
    assert_eq!(move_focus(&adapter, &at(2020, 1, 3), CalendarKey::ArrowLeft, &props), at(2019, 12, 30));
    assert_eq!(move_focus(&adapter, &at(2020, 1, 30), CalendarKey::ArrowRight, &props), at(2020, 2, 2));
}

#[test]
fn test_vertical_move_onto_disabled_day_is_ignored() {
    let adapter = adapter();
    let props = january_props();
    assert_eq!(move_focus(&adapter, &at(2020, 1, 17), CalendarKey::ArrowUp, &props), at(2020, 1, 17));
    assert_eq!(move_focus(&adapter, &at(2020, 1, 17), CalendarKey::ArrowDown, &props), at(2020, 1, 24));
}

#[test]
fn test_page_keys_move_by_month() {
    let adapter = adapter();
    let props = DateValidationProps::new();
    assert_eq!(move_focus(&adapter, &at(2020, 1, 31), CalendarKey::PageUp, &props), at(2020, 2, 29));
    assert_eq!(move_focus(&adapter, &at(2020, 3, 31), CalendarKey::PageDown, &props), at(2020, 2, 29));
}

#[test]
fn test_disable_past_blocks_moves_before_today() {
    let adapter = adapter();
    let props = DateValidationProps::new().with_disable_past(true);
    assert_eq!(move_focus(&adapter, &at(2022, 6, 15), CalendarKey::ArrowLeft, &props), at(2022, 6, 15));
    assert_eq!(move_focus(&adapter, &at(2022, 6, 15), CalendarKey::ArrowRight, &props), at(2022, 6, 16));
}
