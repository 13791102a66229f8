//! FILENAME: core/date-field/src/section.rs
//! PURPOSE: Section Set - the editable units of a date field and their text.
//! CONTEXT: Built from a format string, rebuilt on every format change.
//! Section values are stored the way they are displayed (2-digit years for
//! `YY`, 1-12 hours on a 12-hour clock, 0/1 for AM/PM); `to_parts` and
//! `apply_parts` convert to and from the normalized `DateParts`.

use grid_model::log_debug;
use serde::Serialize;
use smallvec::SmallVec;

use crate::adapter::{DateAdapter, DateParts, SectionContent, SectionType, TokenMeta};
use crate::error::{DateFieldError, Result};
use crate::format::{tokenize, FormatPiece};

/// Century used to expand two-digit years.
const TWO_DIGIT_YEAR_BASE: i32 = 2000;

// ============================================================================
// COMPOSITE VALUE
// ============================================================================

/// The date a section set currently describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositeValue<D> {
    /// Every section is empty.
    Empty,
    /// Some sections are filled, others are not.
    Incomplete(DateParts),
    /// Every section is filled but the combination does not exist.
    Invalid(DateParts),
    Date(D),
}

impl<D: Clone> CompositeValue<D> {
    pub fn date(&self) -> Option<&D> {
        match self {
            CompositeValue::Date(d) => Some(d),
            _ => None,
        }
    }

    /// The value as the host sees it: a date or nothing.
    pub fn to_option(&self) -> Option<D> {
        self.date().cloned()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CompositeValue::Empty)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, CompositeValue::Empty | CompositeValue::Date(_))
    }
}

// ============================================================================
// SECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub section_type: SectionType,
    pub token: String,
    pub content: SectionContent,
    pub meta: TokenMeta,

    /// Displayed value. `None` while the section is empty.
    pub value: Option<i32>,

    /// Characters typed into the section since it was selected.
    pub query: Option<String>,

    /// Character span `[start, end)` in the rendered text.
    pub start: usize,
    pub end: usize,

    pub separator_before: String,
    /// Only set on the last section: trailing literal text.
    pub separator_after: String,

    pub placeholder: String,
}

impl Section {
    fn new(token: String, meta: TokenMeta, separator_before: String) -> Self {
        Section {
            section_type: meta.section_type,
            token,
            content: meta.content,
            meta,
            value: None,
            query: None,
            start: 0,
            end: 0,
            separator_before,
            separator_after: String::new(),
            placeholder: meta.placeholder.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Inclusive `(min, max)` for this section. Day bounds follow the month
    /// and year currently entered: 31 when the month is unknown, 29 for
    /// February of an unknown year.
    pub fn bounds<A: DateAdapter>(&self, set: &SectionSet, adapter: &A) -> (i32, i32) {
        match self.section_type {
            SectionType::Year if self.meta.max_length == 2 => (0, 99),
            SectionType::Year => (1, 9999),
            SectionType::Month => (1, 12),
            SectionType::Day => {
                let parts = set.to_parts();
                let max = match parts.month.filter(|m| (1..=12).contains(m)) {
                    Some(month) => {
                        // 2000 is a leap year, so February allows 29 until a year is known.
                        let year = parts.year.filter(|y| *y > 0).unwrap_or(TWO_DIGIT_YEAR_BASE);
                        adapter.days_in_month(year, month as u32) as i32
                    }
                    None => 31,
                };
                (1, max)
            }
            SectionType::Hours if self.meta.hour12 => (1, 12),
            SectionType::Hours => (0, 23),
            SectionType::Minutes | SectionType::Seconds => (0, 59),
            SectionType::Meridiem => (0, 1),
        }
    }

    fn display<A: DateAdapter>(&self, adapter: &A) -> String {
        let Some(value) = self.value else {
            return self.placeholder.clone();
        };
        match (self.section_type, self.content) {
            (SectionType::Meridiem, _) => adapter.meridiem_text(value == 1, self.token == "a"),
            (SectionType::Month, SectionContent::Letter) => {
                adapter.month_name(value.max(0) as u32, self.token == "MMM")
            }
            _ if self.meta.padded => format!("{:0width$}", value, width = self.meta.max_length),
            _ => value.to_string(),
        }
    }
}

// ============================================================================
// SECTION SET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSet {
    format: String,
    sections: SmallVec<[Section; 7]>,
    text: String,
}

/// Decomposes `format` into sections. Fails on malformed formats.
pub fn parse_sections<A: DateAdapter>(format: &str, adapter: &A) -> Result<SectionSet> {
    let pieces = tokenize(format, adapter)?;
    let mut sections: SmallVec<[Section; 7]> = SmallVec::new();
    let mut pending = String::new();

    for piece in pieces {
        match piece {
            FormatPiece::Literal(text) => pending.push_str(&text),
            FormatPiece::Token { token, meta, .. } => {
                if sections.iter().any(|s| s.section_type == meta.section_type) {
                    return Err(DateFieldError::DuplicateSection(meta.section_type));
                }
                sections.push(Section::new(token, meta, std::mem::take(&mut pending)));
            }
        }
    }

    let Some(last) = sections.last_mut() else {
        return Err(DateFieldError::NoSections(format.to_string()));
    };
    last.separator_after = pending;

    let mut set = SectionSet {
        format: format.to_string(),
        sections,
        text: String::new(),
    };
    set.layout(adapter);
    log_debug!("SECTIONS", "parsed '{}' into {} sections", format, set.len());
    Ok(set)
}

impl SectionSet {
    /// Parses `format` and fills every section from `date`.
    pub fn from_date<A: DateAdapter>(adapter: &A, format: &str, date: &A::Date) -> Result<SectionSet> {
        let mut set = parse_sections(format, adapter)?;
        set.apply_parts(adapter, &adapter.parts(date));
        Ok(set)
    }

    /// Parses `format` and carries this set's values over by section type.
    /// Types missing from the new format are dropped; new types start empty.
    pub fn reparse<A: DateAdapter>(&self, format: &str, adapter: &A) -> Result<SectionSet> {
        let mut next = parse_sections(format, adapter)?;
        next.apply_parts(adapter, &self.to_parts());
        Ok(next)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn index_of(&self, section_type: SectionType) -> Option<usize> {
        self.sections.iter().position(|s| s.section_type == section_type)
    }

    /// Field text: separators, values and placeholders for empty sections.
    pub fn render(&self) -> &str {
        &self.text
    }

    pub fn all_empty(&self) -> bool {
        self.sections.iter().all(Section::is_empty)
    }

    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(|s| !s.is_empty())
    }

    pub fn bounds<A: DateAdapter>(&self, index: usize, adapter: &A) -> Option<(i32, i32)> {
        self.sections.get(index).map(|s| s.bounds(self, adapter))
    }

    // ------------------------------------------------------------------------
    // Mutation (always followed by `layout`)
    // ------------------------------------------------------------------------

    pub(crate) fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)
    }

    pub(crate) fn clear_queries(&mut self) {
        for section in self.sections.iter_mut() {
            section.query = None;
        }
    }

    pub(crate) fn clear_range(&mut self, start: usize, end: usize) {
        for section in self.sections.iter_mut().skip(start).take(end + 1 - start) {
            section.value = None;
            section.query = None;
        }
    }

    /// Recomputes the rendered text and every section span.
    pub(crate) fn layout<A: DateAdapter>(&mut self, adapter: &A) {
        let mut text = String::new();
        let mut position = 0;
        for section in self.sections.iter_mut() {
            text.push_str(&section.separator_before);
            position += section.separator_before.chars().count();
            let shown = section.display(adapter);
            section.start = position;
            position += shown.chars().count();
            section.end = position;
            text.push_str(&shown);
            text.push_str(&section.separator_after);
            position += section.separator_after.chars().count();
        }
        self.text = text;
    }

    // ------------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------------

    /// Normalized parts: full years, 24-hour clock. Missing or empty
    /// sections are `None`. A 12-hour value without a meridiem counts as AM.
    pub fn to_parts(&self) -> DateParts {
        let mut parts = DateParts::default();
        let pm = self
            .index_of(SectionType::Meridiem)
            .and_then(|i| self.sections[i].value)
            .map_or(false, |m| m == 1);

        for section in self.sections.iter() {
            let Some(value) = section.value else {
                continue;
            };
            match section.section_type {
                SectionType::Year if section.meta.max_length == 2 => {
                    parts.year = Some(TWO_DIGIT_YEAR_BASE + value)
                }
                SectionType::Year => parts.year = Some(value),
                SectionType::Month => parts.month = Some(value),
                SectionType::Day => parts.day = Some(value),
                SectionType::Hours if section.meta.hour12 => {
                    parts.hours = Some(value % 12 + if pm { 12 } else { 0 })
                }
                SectionType::Hours => parts.hours = Some(value),
                SectionType::Minutes => parts.minutes = Some(value),
                SectionType::Seconds => parts.seconds = Some(value),
                SectionType::Meridiem => {}
            }
        }
        parts
    }

    /// Overwrites every section from `parts`; unknown parts empty the section.
    pub fn apply_parts<A: DateAdapter>(&mut self, adapter: &A, parts: &DateParts) {
        for section in self.sections.iter_mut() {
            section.query = None;
            section.value = match section.section_type {
                SectionType::Year if section.meta.max_length == 2 => {
                    parts.year.map(|y| y.rem_euclid(100))
                }
                SectionType::Hours if section.meta.hour12 => parts.hours.map(|h| match h % 12 {
                    0 => 12,
                    other => other,
                }),
                other => parts.get(other),
            };
        }
        self.layout(adapter);
    }

    /// Composes the sections into a value. Parts the format does not cover
    /// come from today at midnight.
    pub fn to_composite<A: DateAdapter>(&self, adapter: &A) -> CompositeValue<A::Date> {
        if self.all_empty() {
            return CompositeValue::Empty;
        }
        let parts = self.to_parts();
        if !self.is_complete() {
            return CompositeValue::Incomplete(parts);
        }
        let out_of_bounds = self.sections.iter().any(|section| {
            let (min, max) = section.bounds(self, adapter);
            section.value.map_or(false, |v| v < min || v > max)
        });
        if out_of_bounds {
            return CompositeValue::Invalid(parts);
        }

        let today = adapter.parts(&adapter.start_of_day(&adapter.now()));
        match adapter.from_parts(&parts.or(&today)) {
            Some(date) => CompositeValue::Date(date),
            None => CompositeValue::Invalid(parts),
        }
    }
}
