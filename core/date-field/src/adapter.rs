//! FILENAME: core/date-field/src/adapter.rs
//! PURPOSE: Date capability set consumed by the field and calendar logic.
//! CONTEXT: The field never touches a concrete date type. Everything it needs
//! (decomposition, arithmetic, comparisons, month names, format tokens) goes
//! through `DateAdapter`. `ChronoAdapter` is the stock implementation over
//! `chrono::NaiveDateTime`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

// ============================================================================
// SECTION VOCABULARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
    Meridiem,
}

/// How a section is edited: by typing digits or by picking a named value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionContent {
    Digit,
    Letter,
}

/// What a format token means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMeta {
    pub section_type: SectionType,
    pub content: SectionContent,
    /// Digits accepted before the section is complete.
    pub max_length: usize,
    /// Rendered with leading zeros up to `max_length`.
    pub padded: bool,
    /// 12-hour clock hours.
    pub hour12: bool,
    /// Text shown while the section is empty.
    pub placeholder: &'static str,
}

const fn digit(section_type: SectionType, max_length: usize, padded: bool, placeholder: &'static str) -> TokenMeta {
    TokenMeta {
        section_type,
        content: SectionContent::Digit,
        max_length,
        padded,
        hour12: false,
        placeholder,
    }
}

const fn letter(section_type: SectionType, placeholder: &'static str) -> TokenMeta {
    TokenMeta {
        section_type,
        content: SectionContent::Letter,
        max_length: 2,
        padded: false,
        hour12: false,
        placeholder,
    }
}

/// Token table shared by the stock adapters.
pub fn default_token_meta(token: &str) -> Option<TokenMeta> {
    let meta = match token {
        "YYYY" => digit(SectionType::Year, 4, true, "YYYY"),
        "YY" => digit(SectionType::Year, 2, true, "YY"),
        "M" => digit(SectionType::Month, 2, false, "MM"),
        "MM" => digit(SectionType::Month, 2, true, "MM"),
        "MMM" => letter(SectionType::Month, "MMM"),
        "MMMM" => letter(SectionType::Month, "MMMM"),
        "D" => digit(SectionType::Day, 2, false, "DD"),
        "DD" => digit(SectionType::Day, 2, true, "DD"),
        "H" => digit(SectionType::Hours, 2, false, "hh"),
        "HH" => digit(SectionType::Hours, 2, true, "hh"),
        "h" => TokenMeta { hour12: true, ..digit(SectionType::Hours, 2, false, "hh") },
        "hh" => TokenMeta { hour12: true, ..digit(SectionType::Hours, 2, true, "hh") },
        "m" => digit(SectionType::Minutes, 2, false, "mm"),
        "mm" => digit(SectionType::Minutes, 2, true, "mm"),
        "s" => digit(SectionType::Seconds, 2, false, "ss"),
        "ss" => digit(SectionType::Seconds, 2, true, "ss"),
        "a" => letter(SectionType::Meridiem, "aa"),
        "A" => letter(SectionType::Meridiem, "AA"),
        _ => return None,
    };
    Some(meta)
}

// ============================================================================
// DATE PARTS
// ============================================================================

/// Decomposed date/time. Hours are on the 24-hour clock; `None` marks a part
/// that is not known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateParts {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub hours: Option<i32>,
    pub minutes: Option<i32>,
    pub seconds: Option<i32>,
}

impl DateParts {
    pub fn ymd(year: i32, month: i32, day: i32) -> Self {
        DateParts {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            hours: Some(0),
            minutes: Some(0),
            seconds: Some(0),
        }
    }

    pub fn get(&self, section_type: SectionType) -> Option<i32> {
        match section_type {
            SectionType::Year => self.year,
            SectionType::Month => self.month,
            SectionType::Day => self.day,
            SectionType::Hours => self.hours,
            SectionType::Minutes => self.minutes,
            SectionType::Seconds => self.seconds,
            SectionType::Meridiem => self.hours.map(|h| i32::from(h >= 12)),
        }
    }

    /// Fills unknown parts from `fallback`.
    pub fn or(self, fallback: &DateParts) -> DateParts {
        DateParts {
            year: self.year.or(fallback.year),
            month: self.month.or(fallback.month),
            day: self.day.or(fallback.day),
            hours: self.hours.or(fallback.hours),
            minutes: self.minutes.or(fallback.minutes),
            seconds: self.seconds.or(fallback.seconds),
        }
    }
}

// ============================================================================
// ADAPTER TRAIT
// ============================================================================

pub trait DateAdapter {
    type Date: Clone + PartialEq + fmt::Debug;

    /// Current date-time. Used for empty-section stepping and past/future checks.
    fn now(&self) -> Self::Date;

    fn parts(&self, date: &Self::Date) -> DateParts;

    /// Builds a date when every part is known and the combination exists.
    fn from_parts(&self, parts: &DateParts) -> Option<Self::Date>;

    fn add_days(&self, date: &Self::Date, days: i64) -> Self::Date;
    fn add_months(&self, date: &Self::Date, months: i32) -> Self::Date;

    fn start_of_day(&self, date: &Self::Date) -> Self::Date;
    fn start_of_week(&self, date: &Self::Date) -> Self::Date;
    fn end_of_week(&self, date: &Self::Date) -> Self::Date;
    fn start_of_month(&self, date: &Self::Date) -> Self::Date;
    fn end_of_month(&self, date: &Self::Date) -> Self::Date;

    fn compare(&self, a: &Self::Date, b: &Self::Date) -> Ordering;
    fn is_before_day(&self, a: &Self::Date, b: &Self::Date) -> bool;
    fn is_after_day(&self, a: &Self::Date, b: &Self::Date) -> bool;
    fn is_same_day(&self, a: &Self::Date, b: &Self::Date) -> bool;

    fn days_in_month(&self, year: i32, month: u32) -> u32;
    fn month_name(&self, month: u32, short: bool) -> String;

    /// Earliest and latest dates accepted when no explicit bound is given.
    fn default_min_date(&self) -> Self::Date;
    fn default_max_date(&self) -> Self::Date;

    fn meridiem_text(&self, pm: bool, lowercase: bool) -> String {
        let text = if pm { "PM" } else { "AM" };
        if lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    fn token_meta(&self, token: &str) -> Option<TokenMeta> {
        default_token_meta(token)
    }

    /// Renders `date` with a field format string such as `MM/DD/YYYY`.
    fn format(&self, date: &Self::Date, format: &str) -> crate::error::Result<String>
    where
        Self: Sized,
    {
        let sections = crate::section::SectionSet::from_date(self, format, date)?;
        Ok(sections.render().to_string())
    }
}

// ============================================================================
// CHRONO ADAPTER
// ============================================================================

/// Calculate if year is a leap year.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn month_name_short(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "",
    }
}

fn month_name_full(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "",
    }
}

/// `DateAdapter` over `NaiveDateTime` with Sunday-based weeks.
#[derive(Debug, Clone, Default)]
pub struct ChronoAdapter {
    reference_now: Option<NaiveDateTime>,
}

impl ChronoAdapter {
    pub fn new() -> Self {
        ChronoAdapter::default()
    }

    /// Adapter whose `now()` always returns `now`.
    pub fn with_now(now: NaiveDateTime) -> Self {
        ChronoAdapter {
            reference_now: Some(now),
        }
    }

    /// Convenience constructor for midnight on a calendar day.
    pub fn date(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn end_of_day(date: &NaiveDateTime) -> NaiveDateTime {
        date.date().and_hms_opt(23, 59, 59).unwrap_or(*date)
    }
}

impl DateAdapter for ChronoAdapter {
    type Date = NaiveDateTime;

    fn now(&self) -> NaiveDateTime {
        self.reference_now.unwrap_or_else(|| Local::now().naive_local())
    }

    fn parts(&self, date: &NaiveDateTime) -> DateParts {
        DateParts {
            year: Some(date.year()),
            month: Some(date.month() as i32),
            day: Some(date.day() as i32),
            hours: Some(date.hour() as i32),
            minutes: Some(date.minute() as i32),
            seconds: Some(date.second() as i32),
        }
    }

    fn from_parts(&self, parts: &DateParts) -> Option<NaiveDateTime> {
        let to_u32 = |v: Option<i32>| v.and_then(|v| u32::try_from(v).ok());
        NaiveDate::from_ymd_opt(parts.year?, to_u32(parts.month)?, to_u32(parts.day)?)?.and_hms_opt(
            to_u32(parts.hours)?,
            to_u32(parts.minutes)?,
            to_u32(parts.seconds)?,
        )
    }

    fn add_days(&self, date: &NaiveDateTime, days: i64) -> NaiveDateTime {
        let shifted = if days >= 0 {
            date.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.unwrap_or(*date)
    }

    fn add_months(&self, date: &NaiveDateTime, months: i32) -> NaiveDateTime {
        let shifted = if months >= 0 {
            date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            date.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.unwrap_or(*date)
    }

    fn start_of_day(&self, date: &NaiveDateTime) -> NaiveDateTime {
        date.date().and_hms_opt(0, 0, 0).unwrap_or(*date)
    }

    fn start_of_week(&self, date: &NaiveDateTime) -> NaiveDateTime {
        let offset = date.weekday().num_days_from_sunday() as i64;
        self.start_of_day(&self.add_days(date, -offset))
    }

    fn end_of_week(&self, date: &NaiveDateTime) -> NaiveDateTime {
        let start = self.start_of_week(date);
        Self::end_of_day(&self.add_days(&start, 6))
    }

    fn start_of_month(&self, date: &NaiveDateTime) -> NaiveDateTime {
        date.date()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(*date)
    }

    fn end_of_month(&self, date: &NaiveDateTime) -> NaiveDateTime {
        let last = self.days_in_month(date.year(), date.month());
        date.date()
            .with_day(last)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .unwrap_or(*date)
    }

    fn compare(&self, a: &NaiveDateTime, b: &NaiveDateTime) -> Ordering {
        a.cmp(b)
    }

    fn is_before_day(&self, a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
        a.date() < b.date()
    }

    fn is_after_day(&self, a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
        a.date() > b.date()
    }

    fn is_same_day(&self, a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
        a.date() == b.date()
    }

    fn days_in_month(&self, year: i32, month: u32) -> u32 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(year) => 29,
            2 => 28,
            _ => 31,
        }
    }

    fn month_name(&self, month: u32, short: bool) -> String {
        if short {
            month_name_short(month).to_string()
        } else {
            month_name_full(month).to_string()
        }
    }

    fn default_min_date(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN)
    }

    fn default_max_date(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2099, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .unwrap_or(NaiveDateTime::MAX)
    }
}
