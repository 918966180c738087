//! Error types for the Election Store Core.

use thiserror::Error;

/// Validation errors for caller-supplied values.
///
/// Raised before anything reaches storage. Voter names and counties are
/// never rejected for length; they are truncated instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is {len} characters, maximum is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid zip code: {0}")]
    InvalidZip(String),

    #[error("invalid date: day {day}, month {month}, stored year {year}")]
    InvalidDate { day: u32, month: u32, year: i32 },

    #[error("unknown election status code: {0}")]
    UnknownStatus(i64),
}
