//! The friend whose birthday ends up in the calendar.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CoreResult;
use crate::time::BirthDate;

const UNKNOWN_YEAR: &str = "????";

/// Base for profile permalinks; the identifier is appended verbatim.
pub const PROFILE_BASE_URL: &str = "https://www.facebook.com/";

/// A friend with a known birthday.
///
/// Identity is the `id` alone: equality and hashing ignore every other
/// field, so two records for the same friend collapse in a set.
#[derive(Debug, Clone)]
pub struct Person {
    id: String,
    name: String,
    profile_url: Option<String>,
    profile_picture_uri: Option<String>,
    birth_date: BirthDate,
    year: Option<i32>,
}

impl Person {
    /// Creates a person, validating the day/month pair.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidBirthDate`] when the pair is not a
    /// calendar date in any year.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        day: u32,
        month: u32,
    ) -> CoreResult<Self> {
        Ok(Self::with_birth_date(id, name, BirthDate::new(day, month)?))
    }

    /// Creates a person from an already validated birth date.
    pub fn with_birth_date(
        id: impl Into<String>,
        name: impl Into<String>,
        birth_date: BirthDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile_url: None,
            profile_picture_uri: None,
            birth_date,
            year: None,
        }
    }

    /// Sets the birth year.
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Sets the vanity profile URL.
    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }

    /// Sets the profile picture URI.
    pub fn with_profile_picture(mut self, uri: impl Into<String>) -> Self {
        self.profile_picture_uri = Some(uri.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile_url(&self) -> Option<&str> {
        self.profile_url.as_deref()
    }

    pub fn profile_picture_uri(&self) -> Option<&str> {
        self.profile_picture_uri.as_deref()
    }

    pub fn birth_date(&self) -> BirthDate {
        self.birth_date
    }

    pub fn day(&self) -> u32 {
        self.birth_date.day()
    }

    pub fn month(&self) -> u32 {
        self.birth_date.month()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// Permalink built from the identifier, stable across vanity renames.
    pub fn permalink(&self) -> String {
        format!("{PROFILE_BASE_URL}{}", self.id)
    }

    /// Total ordering key: month, then day, then identifier.
    pub fn birthday_key(&self) -> (u32, u32, &str) {
        (self.month(), self.day(), &self.id)
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/", self.name, self.birth_date)?;
        match self.year {
            Some(year) => write!(f, "{year:04})"),
            None => write!(f, "{UNKNOWN_YEAR})"),
        }
    }
}
