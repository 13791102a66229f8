//! FILENAME: core/date-field/src/editor.rs
//! PURPOSE: Keyboard editing of a section set.
//! CONTEXT: `apply_key` is a pure transition: it takes the current sections
//! and selection and returns the next ones together with the composed value
//! and its validity. Nothing here holds state between keys except the
//! per-section `query` buffer carried inside the section set.

use grid_model::log_debug;
use serde::{Deserialize, Serialize};

use crate::adapter::{DateAdapter, SectionContent, SectionType};
use crate::section::{CompositeValue, SectionSet};
use crate::validation::ValidationError;

// ============================================================================
// SELECTION AND KEYS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionSelection {
    #[default]
    None,
    Single(usize),
    Range { start: usize, end: usize },
    All,
}

impl SectionSelection {
    /// Ordered, clamped `(first, last)` section indexes, or `None` when
    /// nothing is selected.
    pub fn indexes(&self, len: usize) -> Option<(usize, usize)> {
        if len == 0 {
            return None;
        }
        let last = len - 1;
        match *self {
            SectionSelection::None => None,
            SectionSelection::Single(i) => Some((i.min(last), i.min(last))),
            SectionSelection::Range { start, end } => {
                Some((start.min(end).min(last), start.max(end).min(last)))
            }
            SectionSelection::All => Some((0, last)),
        }
    }

    fn is_multi(&self) -> bool {
        matches!(self, SectionSelection::Range { .. } | SectionSelection::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Char(char),
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    Backspace,
    Delete,
    SelectAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    /// Up/Down past a bound wraps to the other bound instead of stopping.
    #[serde(default)]
    pub wrap_around: bool,
    /// Step used by PageUp/PageDown.
    #[serde(default = "default_page_step")]
    pub page_step: i32,
}

fn default_page_step() -> i32 {
    5
}

impl Default for FieldOptions {
    fn default() -> Self {
        FieldOptions {
            wrap_around: false,
            page_step: default_page_step(),
        }
    }
}

/// Result of one key press.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyOutcome<D> {
    pub sections: SectionSet,
    pub selection: SectionSelection,
    pub value: CompositeValue<D>,
    pub is_valid: bool,
    /// `InvalidDate` for partial or impossible entries.
    pub error: Option<ValidationError>,
}

// ============================================================================
// SELECTION HELPERS
// ============================================================================

/// Section under a caret position. Positions in a separator belong to the
/// section that follows it; positions past the end select the last section.
pub fn select_at_position(sections: &SectionSet, position: usize) -> SectionSelection {
    let found = sections
        .sections()
        .iter()
        .position(|s| position <= s.end)
        .or_else(|| sections.len().checked_sub(1));
    found.map_or(SectionSelection::None, SectionSelection::Single)
}

/// Character span `[start, end)` covered by `selection`.
pub fn selection_span(sections: &SectionSet, selection: &SectionSelection) -> Option<(usize, usize)> {
    let (first, last) = selection.indexes(sections.len())?;
    Some((sections.get(first)?.start, sections.get(last)?.end))
}

// ============================================================================
// KEY HANDLING
// ============================================================================

pub fn apply_key<A: DateAdapter>(
    adapter: &A,
    sections: &SectionSet,
    selection: &SectionSelection,
    key: FieldKey,
    options: &FieldOptions,
) -> KeyOutcome<A::Date> {
    let mut next = sections.clone();
    let last = next.len().saturating_sub(1);
    let selected = selection.indexes(next.len());

    let next_selection = match key {
        FieldKey::SelectAll => {
            next.clear_queries();
            SectionSelection::All
        }
        FieldKey::ArrowLeft => {
            next.clear_queries();
            match selected {
                Some((first, _)) if selection.is_multi() => SectionSelection::Single(first),
                Some((first, _)) => SectionSelection::Single(first.saturating_sub(1)),
                None => SectionSelection::Single(0),
            }
        }
        FieldKey::ArrowRight => {
            next.clear_queries();
            match selected {
                Some((_, end)) if selection.is_multi() => SectionSelection::Single(end),
                Some((_, end)) => SectionSelection::Single((end + 1).min(last)),
                None => SectionSelection::Single(last),
            }
        }
        FieldKey::ArrowUp
        | FieldKey::ArrowDown
        | FieldKey::PageUp
        | FieldKey::PageDown
        | FieldKey::Home
        | FieldKey::End => match selected {
            Some((first, _)) => {
                next.clear_queries();
                adjust_section(adapter, &mut next, first, key, options);
                SectionSelection::Single(first)
            }
            None => *selection,
        },
        FieldKey::Backspace | FieldKey::Delete => match selected {
            Some((first, end)) => {
                next.clear_range(first, end);
                if selection.is_multi() {
                    SectionSelection::Single(first)
                } else {
                    *selection
                }
            }
            None => *selection,
        },
        FieldKey::Char(ch) => match selected {
            Some((first, end)) => {
                if selection.is_multi() {
                    next.clear_range(first, end);
                }
                match type_char(adapter, &mut next, first, ch) {
                    Some(index) => SectionSelection::Single(index),
                    None if selection.is_multi() => SectionSelection::Single(first),
                    None => *selection,
                }
            }
            None => *selection,
        },
    };

    next.layout(adapter);
    let value = next.to_composite(adapter);
    let error = match value {
        CompositeValue::Incomplete(_) | CompositeValue::Invalid(_) => Some(ValidationError::InvalidDate),
        _ => None,
    };
    log_debug!("FIELD", "{:?} -> '{}' {:?}", key, next.render(), next_selection);

    KeyOutcome {
        sections: next,
        selection: next_selection,
        value,
        is_valid: error.is_none(),
        error,
    }
}

/// Up/Down, PageUp/PageDown and Home/End on one section.
fn adjust_section<A: DateAdapter>(
    adapter: &A,
    sections: &mut SectionSet,
    index: usize,
    key: FieldKey,
    options: &FieldOptions,
) {
    let Some((min, max)) = sections.bounds(index, adapter) else {
        return;
    };
    let Some(section) = sections.get(index) else {
        return;
    };
    let section_type = section.section_type;
    let current = section.value;

    let value = if section_type == SectionType::Meridiem {
        match key {
            FieldKey::Home => min,
            FieldKey::End => max,
            // An empty meridiem starts from the current time.
            _ => current.map_or_else(|| today_value(adapter, sections, index), |m| 1 - m),
        }
    } else {
        let step = match key {
            FieldKey::ArrowUp => 1,
            FieldKey::ArrowDown => -1,
            FieldKey::PageUp => options.page_step,
            FieldKey::PageDown => -options.page_step,
            _ => 0,
        };
        match (key, current) {
            (FieldKey::Home, _) => min,
            (FieldKey::End, _) => max,
            // An empty section starts from the current date.
            (_, None) => today_value(adapter, sections, index).clamp(min, max),
            (_, Some(value)) => step_value(value, step, min, max, options.wrap_around),
        }
    };

    if let Some(section) = sections.section_mut(index) {
        section.value = Some(value);
    }
}

fn step_value(value: i32, step: i32, min: i32, max: i32, wrap_around: bool) -> i32 {
    let target = value + step;
    if !wrap_around {
        return target.clamp(min, max);
    }
    let span = max - min + 1;
    (target - min).rem_euclid(span) + min
}

/// The section's value for the adapter's current time.
fn today_value<A: DateAdapter>(adapter: &A, sections: &SectionSet, index: usize) -> i32 {
    let mut today = sections.clone();
    today.apply_parts(adapter, &adapter.parts(&adapter.now()));
    today.get(index).and_then(|s| s.value).unwrap_or(0)
}

/// Types `ch` into section `index`. Returns the section to select next, or
/// `None` when the character is not accepted.
fn type_char<A: DateAdapter>(adapter: &A, sections: &mut SectionSet, index: usize, ch: char) -> Option<usize> {
    let section = sections.get(index)?;
    let last = sections.len() - 1;
    let advance = (index + 1).min(last);

    if section.section_type == SectionType::Meridiem {
        if !ch.is_alphabetic() {
            return None;
        }
        let value = match ch.to_ascii_lowercase() {
            'a' => 0,
            'p' => 1,
            _ => section.value.map_or(0, |m| 1 - m),
        };
        let section = sections.section_mut(index)?;
        section.value = Some(value);
        section.query = None;
        return Some(advance);
    }

    if ch.is_ascii_digit() {
        return type_digit(adapter, sections, index, ch).then_some(advance).or(Some(index));
    }

    if section.content == SectionContent::Letter && ch.is_alphabetic() {
        return type_month_letter(adapter, sections, index, ch);
    }
    None
}

/// Appends a digit to the section's buffer. Returns true when the section
/// is complete and the caret should move on.
fn type_digit<A: DateAdapter>(adapter: &A, sections: &mut SectionSet, index: usize, ch: char) -> bool {
    let Some((min, max)) = sections.bounds(index, adapter) else {
        return false;
    };
    let Some(section) = sections.section_mut(index) else {
        return false;
    };
    let max_length = section.meta.max_length;
    let named = section.content == SectionContent::Letter;

    let mut query = section.query.take().unwrap_or_default();
    query.push(ch);
    let mut value: i32 = query.parse().unwrap_or(0);
    if value > max || query.len() > max_length {
        // Overflow restarts the buffer with the digit just typed.
        query = ch.to_string();
        value = query.parse().unwrap_or(0);
    }

    let done = query.len() >= max_length || value * 10 > max;
    // A name cannot show a partial number, so it holds the nearest month.
    section.value = Some(if named { value.max(min) } else { value });
    section.query = if done { None } else { Some(query) };
    done
}

/// Prefix match against month names. Advances once the match is unique.
fn type_month_letter<A: DateAdapter>(
    adapter: &A,
    sections: &mut SectionSet,
    index: usize,
    ch: char,
) -> Option<usize> {
    let last = sections.len() - 1;
    let section = sections.section_mut(index)?;
    let previous = section.query.take().unwrap_or_default();
    // A digit buffer does not combine with letters.
    let previous = if previous.chars().all(|c| c.is_ascii_digit()) { String::new() } else { previous };

    let matches_for = |query: &str| -> Vec<i32> {
        (1..=12)
            .filter(|m| adapter.month_name(*m as u32, false).to_lowercase().starts_with(query))
            .collect()
    };

    let mut query = format!("{}{}", previous, ch.to_lowercase());
    let mut candidates = matches_for(&query);
    if candidates.is_empty() {
        query = ch.to_lowercase().to_string();
        candidates = matches_for(&query);
    }

    match candidates.as_slice() {
        [] => {
            section.query = None;
            None
        }
        [month] => {
            section.value = Some(*month);
            section.query = None;
            Some((index + 1).min(last))
        }
        [first, ..] => {
            section.value = Some(*first);
            section.query = Some(query);
            Some(index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ChronoAdapter;
    use crate::section::parse_sections;

    fn adapter() -> ChronoAdapter {
        ChronoAdapter::with_now(ChronoAdapter::date(2022, 6, 15).unwrap())
    }

    fn press(
        adapter: &ChronoAdapter,
        sections: SectionSet,
        selection: SectionSelection,
        keys: &[FieldKey],
    ) -> (SectionSet, SectionSelection) {
        keys.iter().fold((sections, selection), |(sections, selection), key| {
            let outcome = apply_key(adapter, &sections, &selection, *key, &FieldOptions::default());
            (outcome.sections, outcome.selection)
        })
    }

    #[test]
    fn test_digit_overflow_restarts_and_advances() {
        let adapter = adapter();
        let set = parse_sections("MM/DD/YYYY", &adapter).unwrap();
        // "1" may still become 10-12, so the month stays selected.
        let (set, sel) = press(&adapter, set, SectionSelection::Single(0), &[FieldKey::Char('1')]);
        assert_eq!(sel, SectionSelection::Single(0));
        // "13" exceeds 12: restart with "3", which cannot grow.
        let (set, sel) = press(&adapter, set, sel, &[FieldKey::Char('3')]);
        assert_eq!(set.get(0).unwrap().value, Some(3));
        assert_eq!(sel, SectionSelection::Single(1));
        assert_eq!(set.render(), "03/DD/YYYY");
    }

    #[test]
    fn test_year_needs_four_digits() {
        let adapter = adapter();
        let set = parse_sections("YYYY", &adapter).unwrap();
        let keys: Vec<FieldKey> = "202".chars().map(FieldKey::Char).collect();
        let (set, _) = press(&adapter, set, SectionSelection::Single(0), &keys);
        assert_eq!(set.render(), "0202");
        let (set, _) = press(&adapter, set, SectionSelection::Single(0), &[FieldKey::Char('4')]);
        assert_eq!(set.get(0).unwrap().value, Some(2024));
    }

    #[test]
    fn test_arrow_up_on_empty_section_uses_today() {
        let adapter = adapter();
        let set = parse_sections("MM/DD/YYYY", &adapter).unwrap();
        let (set, _) = press(&adapter, set, SectionSelection::Single(1), &[FieldKey::ArrowUp]);
        assert_eq!(set.get(1).unwrap().value, Some(15));
        let (set, _) = press(&adapter, set, SectionSelection::Single(1), &[FieldKey::ArrowUp]);
        assert_eq!(set.get(1).unwrap().value, Some(16));
    }

    #[test]
    fn test_clamp_and_wrap() {
        assert_eq!(step_value(12, 1, 1, 12, false), 12);
        assert_eq!(step_value(12, 1, 1, 12, true), 1);
        assert_eq!(step_value(2, -5, 1, 12, true), 9);
        assert_eq!(step_value(2, -5, 1, 12, false), 1);
    }

    #[test]
    fn test_select_all_then_backspace_clears_everything() {
        let adapter = adapter();
        let date = ChronoAdapter::date(2024, 3, 7).unwrap();
        let set = SectionSet::from_date(&adapter, "MM/DD/YYYY", &date).unwrap();
        let outcome = apply_key(&adapter, &set, &SectionSelection::All, FieldKey::Backspace, &FieldOptions::default());
        assert_eq!(outcome.sections.render(), "MM/DD/YYYY");
        assert_eq!(outcome.selection, SectionSelection::Single(0));
        assert_eq!(outcome.value, CompositeValue::Empty);
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_month_name_prefix() {
        let adapter = adapter();
        let set = parse_sections("MMMM YYYY", &adapter).unwrap();
        let (set, sel) = press(&adapter, set, SectionSelection::Single(0), &[FieldKey::Char('j')]);
        assert_eq!(set.get(0).unwrap().value, Some(1));
        assert_eq!(sel, SectionSelection::Single(0));
        let (set, sel) = press(&adapter, set, sel, &[FieldKey::Char('u'), FieldKey::Char('l')]);
        assert_eq!(set.get(0).unwrap().value, Some(7));
        assert_eq!(sel, SectionSelection::Single(1));
    }

    #[test]
    fn test_meridiem_keys() {
        let adapter = adapter();
        let set = parse_sections("hh:mm A", &adapter).unwrap();
        let (set, _) = press(&adapter, set, SectionSelection::Single(2), &[FieldKey::Char('p')]);
        assert_eq!(set.render(), "hh:mm PM");
        let (set, _) = press(&adapter, set, SectionSelection::Single(2), &[FieldKey::ArrowUp]);
        assert_eq!(set.get(2).unwrap().value, Some(0));
    }

    #[test]
    fn test_empty_meridiem_steps_from_current_time() {
        let morning = adapter();
        let set = parse_sections("hh:mm A", &morning).unwrap();
        let (set, _) = press(&morning, set, SectionSelection::Single(2), &[FieldKey::ArrowDown]);
        assert_eq!(set.get(2).unwrap().value, Some(0));

        let afternoon = ChronoAdapter::with_now(
            chrono::NaiveDate::from_ymd_opt(2022, 6, 15).unwrap().and_hms_opt(15, 0, 0).unwrap(),
        );
        let set = parse_sections("hh:mm A", &afternoon).unwrap();
        let (set, _) = press(&afternoon, set, SectionSelection::Single(2), &[FieldKey::ArrowUp]);
        assert_eq!(set.get(2).unwrap().value, Some(1));
        assert_eq!(set.render(), "hh:mm PM");
    }

    #[test]
    fn test_zero_in_month_name_holds_january() {
        let adapter = adapter();
        let set = parse_sections("MMMM YYYY", &adapter).unwrap();
        let (set, sel) = press(&adapter, set, SectionSelection::Single(0), &[FieldKey::Char('0')]);
        assert_eq!(set.get(0).unwrap().value, Some(1));
        assert!(set.render().starts_with("January"));
        assert_eq!(sel, SectionSelection::Single(0));
        let (set, sel) = press(&adapter, set, sel, &[FieldKey::Char('3')]);
        assert_eq!(set.get(0).unwrap().value, Some(3));
        assert_eq!(sel, SectionSelection::Single(1));
    }

    #[test]
    fn test_select_at_position() {
        let adapter = adapter();
        let set = parse_sections("MM/DD/YYYY", &adapter).unwrap();
        assert_eq!(select_at_position(&set, 0), SectionSelection::Single(0));
        assert_eq!(select_at_position(&set, 3), SectionSelection::Single(1));
        assert_eq!(select_at_position(&set, 8), SectionSelection::Single(2));
        assert_eq!(select_at_position(&set, 40), SectionSelection::Single(2));
        assert_eq!(selection_span(&set, &SectionSelection::All), Some((0, 10)));
    }
}
