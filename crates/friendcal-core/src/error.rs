//! Error types for birthday normalization and calendar projection.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the core pipeline.
///
/// Every variant is fatal for a run; callers are expected to report the
/// message and stop rather than produce a partial calendar.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Day and month do not form a date in any year.
    #[error("invalid birth date: day {day}, month {month}")]
    InvalidBirthDate { day: u32, month: u32 },

    /// A birth year outside the representable calendar range.
    #[error("birth year {0} is out of range")]
    YearOutOfRange(i32),

    /// Locale string is not shaped like `ll_CC`.
    #[error("invalid locale tag `{0}`, expected something like `en_US`")]
    InvalidLocaleTag(String),

    /// Locale tag is well formed but has no known date pattern.
    #[error("unsupported locale `{0}`")]
    UnsupportedLocale(String),

    /// Weekday names could not be derived for the locale.
    #[error("no weekday names available for locale `{0}`")]
    UnknownWeekdayLocale(String),

    /// A tooltip matched neither the locale date pattern nor a weekday name.
    #[error("could not resolve `{raw}` to a date using locale `{locale}`")]
    UnresolvableDate { raw: String, locale: String },

    /// A local wall-clock time does not exist in the source timezone.
    #[error("local time {0} does not exist in the birthday source timezone")]
    NonexistentLocalTime(NaiveDateTime),

    /// Aggregation finished without a single person.
    #[error("no birthdays found")]
    NoBirthdays,

    /// The embedded locale table failed to parse.
    #[error("locale table is malformed: {0}")]
    LocaleTable(String),

    /// Writing the calendar file failed.
    #[error("failed to write calendar to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
