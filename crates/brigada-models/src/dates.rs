//! Inclusive date ranges for roster and schedule queries.

use chrono::{Days, NaiveDate};
use std::fmt;

/// Longest range a roster query or rotation may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Span used when a query gives a start date but no end date.
pub const DEFAULT_SPAN_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeError {
    Inverted { from: NaiveDate, to: NaiveDate },
    TooLong { days: i64 },
}

impl std::error::Error for DateRangeError {}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inverted { from, to } => {
                write!(f, "'from' ({}) must not be after 'to' ({})", from, to)
            }
            Self::TooLong { days } => write!(
                f,
                "Date range covers {} days, the maximum is {}",
                days, MAX_RANGE_DAYS
            ),
        }
    }
}

/// A closed interval `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DateRangeError> {
        if from > to {
            return Err(DateRangeError::Inverted { from, to });
        }
        let range = Self { from, to };
        let days = range.len_days();
        if days > MAX_RANGE_DAYS {
            return Err(DateRangeError::TooLong { days });
        }
        Ok(range)
    }

    /// Fills in missing bounds: `from` defaults to `today`, `to` to
    /// `from + 30 days`.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        let from = from.unwrap_or(today);
        let to = match to {
            Some(to) => to,
            None => from
                .checked_add_days(Days::new(DEFAULT_SPAN_DAYS))
                .unwrap_or(NaiveDate::MAX),
        };
        Self::new(from, to)
    }

    /// Number of days in the range, both ends included.
    pub fn len_days(&self) -> i64 {
        inclusive_days(self.from, self.to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

/// Days between two dates counting both ends. Zero when `end < start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// `date + 1`, saturating at the calendar maximum.
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
