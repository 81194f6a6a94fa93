//! Calendar arithmetic for birthdays.
//!
//! [`BirthDate`] is a validated day/month pair. Validation binds the pair to
//! [`LEAP_REFERENCE_YEAR`] so that February 29th is accepted, and the
//! Feb-29 fallback to the 28th only happens when a concrete year is chosen
//! through [`BirthDate::in_year`].

use std::fmt;

use chrono::{Datelike, Months, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{CoreError, CoreResult};

/// A leap year (divisible by 4, not by 100) used wherever a year is needed
/// only to make a day/month pair parse.
pub const LEAP_REFERENCE_YEAR: i32 = 2004;

/// Timezone the upstream birthday listing uses for its month boundaries.
pub const SOURCE_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Returns true for Gregorian leap years.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// A day and month that exist in at least one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BirthDate {
    day: u32,
    month: u32,
}

impl BirthDate {
    /// Validates a day/month pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBirthDate`] when the pair is not a date in
    /// a leap year (so 31/04 fails and 29/02 passes).
    pub fn new(day: u32, month: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, month, day)
            .map(Self::from_date)
            .ok_or(CoreError::InvalidBirthDate { day, month })
    }

    /// Takes the day and month of an existing date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// True for February 29th.
    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }

    /// The date this birthday falls on in `year`.
    ///
    /// February 29th becomes February 28th when `year` is not a leap year.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::YearOutOfRange`] when `year` is beyond what
    /// chrono can represent.
    pub fn in_year(&self, year: i32) -> CoreResult<NaiveDate> {
        let day = if self.is_leap_day() && !is_leap_year(year) {
            28
        } else {
            self.day
        };
        // day/month were validated against a leap year, so only the year can fail
        NaiveDate::from_ymd_opt(year, self.month, day).ok_or(CoreError::YearOutOfRange(year))
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.day, self.month)
    }
}

/// The year of the next occurrence of a birthday in `month`.
///
/// Only the month is compared: a birthday earlier in the current month
/// still counts as this year's.
pub fn occurrence_year(month: u32, today: NaiveDate) -> i32 {
    if month >= today.month() {
        today.year()
    } else {
        today.year() + 1
    }
}

/// Unix timestamps of midnight on the first of `count` consecutive months,
/// starting with the month of `today`, in [`SOURCE_TIMEZONE`].
///
/// # Errors
///
/// Returns [`CoreError::NonexistentLocalTime`] if a month boundary does not
/// exist as a local time.
pub fn month_start_epochs(today: NaiveDate, count: u32) -> CoreResult<Vec<i64>> {
    let first = today.with_day(1).unwrap_or(today);
    (0..count)
        .map(|offset| {
            let local = first
                .checked_add_months(Months::new(offset))
                .unwrap_or(first)
                .and_time(NaiveTime::MIN);
            SOURCE_TIMEZONE
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.timestamp())
                .ok_or(CoreError::NonexistentLocalTime(local))
        })
        .collect()
}
