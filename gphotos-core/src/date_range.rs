//! Inclusive calendar date range driving the per-day sync loop.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;

/// Date format accepted on the command line.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Inclusive range of calendar dates. Both endpoints are part of the range
/// and `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to < from {
            return Err(ValidationError::EmptyRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    /// Build a range from optional CLI bounds, each defaulting to `today`.
    pub fn from_args(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        Self::new(from.unwrap_or(today), to.unwrap_or(today))
    }

    /// A range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        DateRange { from: day, to: day }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Number of calendar days in the range (never zero).
    pub fn len(&self) -> usize {
        (self.to - self.from).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every date in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }

    /// Years touched by the range, used to scope the local inventory walk.
    pub fn years(&self) -> BTreeSet<i32> {
        (self.from.year()..=self.to.year()).collect()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Parse a `YYYY/MM/DD` command line date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}
