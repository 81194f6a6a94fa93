//! Core types: persons, locales, date normalization, calendar projection
//!
//! ```text
//! tooltip ──▶ DateNormalizer ──▶ Person ──▶ BirthdaySet ──▶ BirthdayCalendar ──▶ .ics
//!               │        │
//!          LocaleTag  WeekdayTable
//! ```

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod locale;
pub mod normalize;
pub mod person;
pub mod time;
pub mod tracing;
pub mod weekday;

pub use aggregate::BirthdaySet;
pub use calendar::{BirthdayCalendar, CalendarEvent, CalendarMetadata, possessive};
pub use error::{CoreError, CoreResult};
pub use locale::{LocaleTag, supported_locales};
pub use normalize::{DateNormalizer, clean_tooltip, decode_entities};
pub use person::Person;
pub use time::{BirthDate, is_leap_year, month_start_epochs, occurrence_year};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use weekday::WeekdayTable;
