//! FILENAME: tests/test_reconciliation.rs
//! PURPOSE: Tests for syncing host-controlled values with edited sections.

mod common;

use common::{at, FieldHarness};
use date_field::{DateValidationProps, FieldKey, Reconciliation, SectionSelection, ValidationError};

#[test]
fn test_echo_of_emitted_value_keeps_sections() {
    let mut harness = FieldHarness::new("MM/DD/YYYY").value(at(2024, 3, 7));
    harness.select(1).press(FieldKey::ArrowDown);
    let emitted = harness.last_change().unwrap().value;
    assert_eq!(emitted, Some(at(2024, 3, 6)));

    assert_eq!(harness.field.set_value(emitted), Reconciliation::Unchanged);
    assert_eq!(harness.selection(), SectionSelection::Single(1));
    assert_eq!(harness.text(), "03/06/2024");
}

#[test]
fn test_new_external_value_overwrites_partial_entry() {
    let mut harness = FieldHarness::new("MM/DD/YYYY");
    harness.select(0).type_text("12");
    assert_eq!(harness.text(), "12/DD/YYYY");

    assert_eq!(harness.field.set_value(Some(at(2021, 5, 9))), Reconciliation::Rebuilt);
    assert_eq!(harness.text(), "05/09/2021");
    assert_eq!(harness.field.error(), None);
}

#[test]
fn test_emitting_again_after_rebuild() {
    let mut harness = FieldHarness::new("MM/DD/YYYY").value(at(2024, 3, 7));
    harness.select(1).press(FieldKey::ArrowUp);
    harness.field.set_value(Some(at(2020, 1, 1)));
    // A value equal to an emission from before the rebuild is a real change.
    assert_eq!(harness.field.set_value(Some(at(2024, 3, 8))), Reconciliation::Rebuilt);
    assert_eq!(harness.text(), "03/08/2024");
}

#[test]
fn test_unchanged_edit_emits_nothing() {
    let mut harness = FieldHarness::new("MM/DD/YYYY").value(at(2024, 3, 7));
    harness.select(0).press(FieldKey::ArrowLeft).press(FieldKey::ArrowRight);
    assert!(harness.changes.is_empty());
}

#[test]
fn test_validation_error_reported_with_value() {
    let mut harness = FieldHarness::new("MM/DD/YYYY")
        .validation(DateValidationProps::new().with_disable_past(true))
        .value(at(2022, 6, 15));
    assert_eq!(harness.field.error(), None);
    harness.select(1).press(FieldKey::ArrowDown);
    let change = harness.last_change().unwrap();
    assert_eq!(change.value, Some(at(2022, 6, 14)));
    assert_eq!(change.error, Some(ValidationError::DisablePast));
}
