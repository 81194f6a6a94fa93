//! Account locale tags and their day/month date patterns.
//!
//! The pattern table lives in `locale_formats.toml`, embedded at build time
//! and parsed on first use. A tag missing from the table is an error: there
//! is no default pattern, since guessing day-first versus month-first would
//! silently swap dates.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

static LOCALE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}_[A-Z]{2}$").expect("Invalid locale tag regex"));

static LOCALE_TABLE: LazyLock<Result<LocaleTable, String>> = LazyLock::new(|| {
    toml::from_str(include_str!("locale_formats.toml")).map_err(|e| e.to_string())
});

#[derive(Debug, Deserialize)]
struct LocaleTable {
    formats: HashMap<String, String>,
}

fn table() -> CoreResult<&'static LocaleTable> {
    LOCALE_TABLE
        .as_ref()
        .map_err(|e| CoreError::LocaleTable(e.clone()))
}

/// A validated locale tag such as `en_GB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleTag(String);

impl LocaleTag {
    /// Validates `tag` against the `ll_CC` shape.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLocaleTag`] for anything else, including
    /// surrounding whitespace.
    pub fn new(tag: impl Into<String>) -> CoreResult<Self> {
        let tag = tag.into();
        if LOCALE_TAG_RE.is_match(&tag) {
            Ok(Self(tag))
        } else {
            Err(CoreError::InvalidLocaleTag(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-letter language part, e.g. `en`.
    pub fn language(&self) -> &str {
        &self.0[..2]
    }

    /// Two-letter region part, e.g. `GB`.
    pub fn region(&self) -> &str {
        &self.0[3..]
    }

    /// The chrono pattern birthdays are rendered with for this locale.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedLocale`] when the tag is not in the
    /// table.
    pub fn date_format(&self) -> CoreResult<&'static str> {
        table()?
            .formats
            .get(&self.0)
            .map(String::as_str)
            .ok_or_else(|| CoreError::UnsupportedLocale(self.0.clone()))
    }
}

impl FromStr for LocaleTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of locale tags with a known date pattern.
pub fn supported_locale_count() -> usize {
    table().map(|t| t.formats.len()).unwrap_or(0)
}

/// Every locale tag with a known date pattern, sorted.
pub fn supported_locales() -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = table()
        .map(|t| t.formats.keys().map(String::as_str).collect())
        .unwrap_or_default();
    tags.sort_unstable();
    tags
}
