//! Storage representation of calendar dates.
//!
//! Dates are persisted as three integer columns: day of month, month
//! (1-12) and year as an offset from 1900. The offset is the on-disk
//! format shared with existing databases and must not change; every
//! conversion between [`NaiveDate`] and the columns goes through
//! [`DateColumns`].

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;

/// Offset added to the stored year column to obtain the calendar year.
pub const YEAR_OFFSET: i32 = 1900;

/// A date as it is laid out in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateColumns {
    /// Day of month, 1-31.
    pub day: u32,
    /// Month, 1-12.
    pub month: u32,
    /// Calendar year minus [`YEAR_OFFSET`].
    pub year: i32,
}

impl DateColumns {
    /// Split a calendar date into storage columns.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year() - YEAR_OFFSET,
        }
    }

    /// Reassemble a calendar date from storage columns.
    pub fn to_date(self) -> Result<NaiveDate, ValidationError> {
        NaiveDate::from_ymd_opt(self.year + YEAR_OFFSET, self.month, self.day).ok_or(
            ValidationError::InvalidDate {
                day: self.day,
                month: self.month,
                year: self.year,
            },
        )
    }

    /// `YYYY-MM-DD`, with the year computed as stored year + 1900.
    pub fn iso_string(self) -> String {
        format!(
            "{}-{:02}-{:02}",
            self.year + YEAR_OFFSET,
            self.month,
            self.day
        )
    }
}

impl From<NaiveDate> for DateColumns {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}
