//! FILENAME: core/date-field/src/field.rs
//! PURPOSE: A date field: section state plus controlled-value reconciliation.
//! CONTEXT: The host pushes values in with `set_value` and receives
//! `FieldChange`s from `handle_key`. A value the field emitted itself, or one
//! the sections already show, never rebuilds them; any other external value
//! overwrites them completely.

use grid_model::{log_debug, log_info};

use crate::adapter::{DateAdapter, DateParts};
use crate::editor::{
    apply_key, select_at_position, selection_span, FieldKey, FieldOptions, SectionSelection,
};
use crate::error::Result;
use crate::section::{parse_sections, CompositeValue, SectionSet};
use crate::validation::{validate_composite, DateValidationProps, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Sections were overwritten from the new value.
    Rebuilt,
    /// The value was already reflected by the sections.
    Unchanged,
}

/// Emitted when an edit changes the composed value or its validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange<D> {
    /// `None` while the entry is empty, partial or invalid.
    pub value: Option<D>,
    pub composite: CompositeValue<D>,
    pub error: Option<ValidationError>,
}

pub struct DateField<A: DateAdapter> {
    adapter: A,
    format: String,
    sections: SectionSet,
    selection: SectionSelection,
    options: FieldOptions,
    validation: DateValidationProps<A::Date>,
    composite: CompositeValue<A::Date>,
    error: Option<ValidationError>,
    last_emitted: Option<Option<A::Date>>,
}

impl<A: DateAdapter> DateField<A> {
    /// Empty field. Fails when `format` is malformed.
    pub fn new(adapter: A, format: &str, options: FieldOptions) -> Result<Self> {
        let sections = parse_sections(format, &adapter)?;
        log_info!("FIELD", "created field '{}' with {} sections", format, sections.len());
        Ok(DateField {
            adapter,
            format: format.to_string(),
            sections,
            selection: SectionSelection::None,
            options,
            validation: DateValidationProps::default(),
            composite: CompositeValue::Empty,
            error: None,
            last_emitted: None,
        })
    }

    pub fn with_value(mut self, value: Option<A::Date>) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_validation(mut self, validation: DateValidationProps<A::Date>) -> Self {
        self.validation = validation;
        self.refresh();
        self
    }

    // ========================================================================
    // RECONCILIATION
    // ========================================================================

    /// Applies an externally supplied value.
    pub fn set_value(&mut self, value: Option<A::Date>) -> Reconciliation {
        let echoed = self.last_emitted.as_ref() == Some(&value)
            || (self.composite.is_valid() && self.composite.to_option() == value);
        if echoed {
            return Reconciliation::Unchanged;
        }

        let parts = value
            .as_ref()
            .map_or_else(DateParts::default, |date| self.adapter.parts(date));
        self.sections.apply_parts(&self.adapter, &parts);
        self.last_emitted = None;
        self.refresh();
        log_debug!("FIELD", "rebuilt from external value -> '{}'", self.sections.render());
        Reconciliation::Rebuilt
    }

    /// Applies one key press. Returns the change to report to the host, if any.
    pub fn handle_key(&mut self, key: FieldKey) -> Option<FieldChange<A::Date>> {
        let outcome = apply_key(&self.adapter, &self.sections, &self.selection, key, &self.options);
        self.sections = outcome.sections;
        self.selection = outcome.selection;

        let error = validate_composite(&self.adapter, &outcome.value, &self.validation);
        let changed = outcome.value != self.composite || error != self.error;
        self.composite = outcome.value;
        self.error = error;
        if !changed {
            return None;
        }

        let value = self.composite.to_option();
        self.last_emitted = Some(value.clone());
        Some(FieldChange {
            value,
            composite: self.composite.clone(),
            error,
        })
    }

    /// Switches format, carrying entered values over by section type.
    pub fn set_format(&mut self, format: &str) -> Result<()> {
        self.sections = self.sections.reparse(format, &self.adapter)?;
        self.format = format.to_string();
        let len = self.sections.len();
        let out_of_range = match self.selection {
            SectionSelection::Single(i) => i >= len,
            SectionSelection::Range { start, end } => start.max(end) >= len,
            _ => false,
        };
        if out_of_range {
            self.selection = SectionSelection::None;
        }
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.composite = self.sections.to_composite(&self.adapter);
        self.error = validate_composite(&self.adapter, &self.composite, &self.validation);
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    pub fn select_at_position(&mut self, position: usize) -> SectionSelection {
        self.set_selection(select_at_position(&self.sections, position));
        self.selection
    }

    pub fn set_selection(&mut self, selection: SectionSelection) {
        if selection != self.selection {
            self.sections.clear_queries();
        }
        self.selection = selection;
    }

    pub fn selection(&self) -> SectionSelection {
        self.selection
    }

    pub fn selection_span(&self) -> Option<(usize, usize)> {
        selection_span(&self.sections, &self.selection)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn text(&self) -> &str {
        self.sections.render()
    }

    pub fn value(&self) -> Option<A::Date> {
        self.composite.to_option()
    }

    pub fn composite(&self) -> &CompositeValue<A::Date> {
        &self.composite
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn sections(&self) -> &SectionSet {
        &self.sections
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}
