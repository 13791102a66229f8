//! FILENAME: core/date-field/src/lib.rs
//! Sectioned date field state machine.
//!
//! A format string such as `MM/DD/YYYY` is split into editable sections.
//! Keys edit one section at a time; the sections compose into a date that is
//! validated after every edit and reconciled with a host-controlled value.
//! Date arithmetic goes through the `DateAdapter` trait; `ChronoAdapter` is
//! the stock implementation.
//!
//! Layers:
//! - `adapter`: Date library seam and the format token table
//! - `format`: Format string tokenizer
//! - `section`: Section set, rendering and composition
//! - `editor`: Key handling over a section set
//! - `validation`: Min/max, past/future and disable checks
//! - `calendar`: Day calendar keyboard focus
//! - `field`: Stateful field with value reconciliation

pub mod adapter;
pub mod calendar;
pub mod editor;
pub mod error;
pub mod field;
pub mod format;
pub mod section;
pub mod validation;

pub use adapter::{
    default_token_meta, is_leap_year, ChronoAdapter, DateAdapter, DateParts, SectionContent,
    SectionType, TokenMeta,
};
pub use calendar::{find_closest_enabled_date, move_focus, CalendarKey};
pub use editor::{
    apply_key, select_at_position, selection_span, FieldKey, FieldOptions, KeyOutcome,
    SectionSelection,
};
pub use error::{DateFieldError, Result};
pub use field::{DateField, FieldChange, Reconciliation};
pub use format::{tokenize, FormatPiece};
pub use section::{parse_sections, CompositeValue, Section, SectionSet};
pub use validation::{
    is_date_disabled, validate_composite, validate_date, validate_date_range, DateValidationProps,
    DisableDatePredicate, ValidationError,
};
