//! FILENAME: core/date-field/src/error.rs

use thiserror::Error;

use crate::adapter::SectionType;

/// Malformed format strings. These indicate a host misconfiguration and are
/// reported immediately instead of degrading to a broken field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateFieldError {
    #[error("Unterminated literal starting at position {0}")]
    UnterminatedLiteral(usize),

    #[error("Unknown format token '{token}' at position {position}")]
    UnknownToken { token: String, position: usize },

    #[error("Section {0:?} appears more than once in the format")]
    DuplicateSection(SectionType),

    #[error("Format '{0}' has no editable sections")]
    NoSections(String),
}

pub type Result<T> = std::result::Result<T, DateFieldError>;
