//! Projection of persons into yearly all-day birthday events.
//!
//! Projection never mutates a [`Person`]: the Feb-29 fallback and the
//! chosen occurrence year only exist on the resulting [`CalendarEvent`].
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use friendcal_core::calendar::{BirthdayCalendar, CalendarMetadata};
//! use friendcal_core::Person;
//!
//! let today = NaiveDate::from_ymd_opt(2020, 12, 1).unwrap();
//! let people = vec![Person::new("1", "Ann", 29, 2).unwrap()];
//! let calendar =
//!     BirthdayCalendar::project(people.iter(), today, CalendarMetadata::default()).unwrap();
//! assert_eq!(calendar.events()[0].start, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
//! ```

mod ics;


use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::person::Person;
use crate::time::occurrence_year;

/// Default `X-WR-CALNAME`.
pub const DEFAULT_CALENDAR_NAME: &str = "Facebook Birthdays (friendcal)";

/// Clients should refresh the calendar twice a day.
pub const DEFAULT_PUBLISHED_TTL: &str = "PT12H";

/// Page the calendar mirrors.
pub const ORIGINAL_URL: &str = "/events/birthdays/";

/// Calendar-level properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMetadata {
    pub name: String,
    pub product_id: String,
    pub published_ttl: String,
    pub original_url: String,
}

impl Default for CalendarMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_CALENDAR_NAME.to_string(),
            product_id: format!(
                "friendcal v{} [{}]",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_REPOSITORY")
            ),
            published_ttl: DEFAULT_PUBLISHED_TTL.to_string(),
            original_url: ORIGINAL_URL.to_string(),
        }
    }
}

impl CalendarMetadata {
    /// Sets the calendar display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// One all-day, yearly recurring birthday event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Person identifier, stable across runs.
    pub uid: String,
    pub title: String,
    /// First occurrence; recurrence covers the following years.
    pub start: NaiveDate,
    pub description: String,
    pub link: String,
}

impl CalendarEvent {
    /// Builds the event for `person` as seen on `today`.
    ///
    /// With a known birth year the event is anchored on the birth date
    /// itself. Without one it starts in this year's or next year's
    /// occurrence, decided by month only.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::YearOutOfRange`] for a birth year chrono cannot
    /// represent.
    pub fn for_person(person: &Person, today: NaiveDate) -> CoreResult<Self> {
        let year = person
            .year()
            .unwrap_or_else(|| occurrence_year(person.month(), today));

        Ok(Self {
            uid: person.id().to_string(),
            title: format!("{} Birthday", possessive(person.name())),
            start: person.birth_date().in_year(year)?,
            description: format!("{}\n{}", person, person.permalink()),
            link: person.permalink(),
        })
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.start, self.title, self.uid)
    }
}

/// `James'` or `Anna's`.
pub fn possessive(name: &str) -> String {
    if name.ends_with('s') {
        format!("{name}'")
    } else {
        format!("{name}'s")
    }
}

/// A projected calendar ready to render.
#[derive(Debug, Clone)]
pub struct BirthdayCalendar {
    metadata: CalendarMetadata,
    events: Vec<CalendarEvent>,
    stamp: DateTime<Utc>,
}

impl BirthdayCalendar {
    /// Projects every person into an event, ordered by birthday.
    ///
    /// # Errors
    ///
    /// Fails on the first person whose event cannot be built.
    pub fn project<'a>(
        persons: impl IntoIterator<Item = &'a Person>,
        today: NaiveDate,
        metadata: CalendarMetadata,
    ) -> CoreResult<Self> {
        let mut persons: Vec<&Person> = persons.into_iter().collect();
        persons.sort_by(|a, b| a.birthday_key().cmp(&b.birthday_key()));

        Ok(Self {
            metadata,
            events: persons
                .into_iter()
                .map(|p| CalendarEvent::for_person(p, today))
                .collect::<CoreResult<_>>()?,
            stamp: Utc::now(),
        })
    }

    /// Overrides the `DTSTAMP` instant, for reproducible output.
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn metadata(&self) -> &CalendarMetadata {
        &self.metadata
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Renders the RFC 5545 document with CRLF line endings.
    pub fn to_ics(&self) -> String {
        let ics = ics::render(self);
        debug!(events = self.events.len(), ics = %ics, "rendered calendar");
        ics
    }

    /// Writes the rendered document to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Write`] if a directory or the file cannot be
    /// written.
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        let write_err = |source| CoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_ics()).map_err(write_err)?;

        info!(path = %path.display(), events = self.events.len(), "calendar written");
        Ok(())
    }
}
