//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for date field integration tests.

#![allow(dead_code)]

use chrono::NaiveDateTime;
use date_field::{
    ChronoAdapter, DateField, DateValidationProps, FieldChange, FieldKey, FieldOptions,
    SectionSelection,
};

/// Fixed "now" used by every harness: 2022-06-15.
pub fn reference_now() -> NaiveDateTime {
    at(2022, 6, 15)
}

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    ChronoAdapter::date(year, month, day).expect("valid fixture date")
}

pub fn at_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    at(year, month, day)
        .date()
        .and_hms_opt(hour, minute, 0)
        .expect("valid fixture time")
}

pub fn adapter() -> ChronoAdapter {
    ChronoAdapter::with_now(reference_now())
}

/// Test harness wrapping a field and the changes it emitted.
pub struct FieldHarness {
    pub field: DateField<ChronoAdapter>,
    pub changes: Vec<FieldChange<NaiveDateTime>>,
}

impl FieldHarness {
    pub fn new(format: &str) -> Self {
        Self::with_options(format, FieldOptions::default())
    }

    pub fn with_options(format: &str, options: FieldOptions) -> Self {
        FieldHarness {
            field: DateField::new(adapter(), format, options).expect("valid format"),
            changes: Vec::new(),
        }
    }

    pub fn value(mut self, value: NaiveDateTime) -> Self {
        self.field.set_value(Some(value));
        self
    }

    pub fn validation(mut self, props: DateValidationProps<NaiveDateTime>) -> Self {
        self.field = self.field.with_validation(props);
        self
    }

    pub fn select(&mut self, index: usize) -> &mut Self {
        self.field.set_selection(SectionSelection::Single(index));
        self
    }

    pub fn press(&mut self, key: FieldKey) -> &mut Self {
        if let Some(change) = self.field.handle_key(key) {
            self.changes.push(change);
        }
        self
    }

    /// Types every character of `text` as a key press.
    pub fn type_text(&mut self, text: &str) -> &mut Self {
        for ch in text.chars() {
            self.press(FieldKey::Char(ch));
        }
        self
    }

    pub fn text(&self) -> String {
        self.field.text().to_string()
    }

    pub fn selection(&self) -> SectionSelection {
        self.field.selection()
    }

    pub fn last_change(&self) -> Option<&FieldChange<NaiveDateTime>> {
        self.changes.last()
    }
}
