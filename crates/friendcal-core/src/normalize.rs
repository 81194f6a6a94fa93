//! Tooltip to day/month normalization.
//!
//! A birthday tooltip is either a short localized date ("05/03") or, for
//! the seven days after today, a localized weekday name ("Thursday"). Both
//! arrive wrapped in the person's name and bidirectional text marks.
//!
//! The pipeline is:
//!
//! 1. [`clean_tooltip`] strips the name, parentheses and invisible marks.
//! 2. The locale's day/month pattern is tried against the cleaned string,
//!    with [`LEAP_REFERENCE_YEAR`] bound so February 29th parses.
//! 3. Otherwise the string is entity-decoded, lowercased and looked up in
//!    the locale's [`WeekdayTable`]. The table is built on the first such
//!    miss, so locales without platform weekday names still handle numeric
//!    dates.
//!
//! Anything that survives neither step is an error. The year is never
//! resolved here.

use std::sync::{LazyLock, OnceLock};

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult};
use crate::locale::LocaleTag;
use crate::time::{BirthDate, LEAP_REFERENCE_YEAR};
use crate::weekday::WeekdayTable;

/// Characters that carry no date information: direction marks, embedding
/// controls and zero-width spaces.
const INVISIBLE_MARKS: &[char] = &[
    '\u{200B}', '\u{200E}', '\u{200F}', '\u{061C}', '\u{202A}', '\u{202B}', '\u{202C}',
    '\u{202D}', '\u{202E}',
];

static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);")
        .expect("Invalid HTML entity regex")
});

/// Decodes HTML character references, named and numeric.
///
/// Each reference is decoded on its own. Unknown names and stray
/// ampersands are kept as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let reference = &caps[0];
            quick_xml::escape::unescape_with(reference, quick_xml::escape::resolve_html5_entity)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| reference.to_string())
        })
        .into_owned()
}

/// Removes everything from a tooltip except the date or weekday text.
pub fn clean_tooltip(tooltip: &str, name: &str) -> String {
    let without_name = if name.is_empty() {
        tooltip.to_string()
    } else {
        tooltip.replace(name, "")
    };

    without_name
        .chars()
        .filter(|c| !matches!(c, '(' | ')') && !INVISIBLE_MARKS.contains(c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Converts tooltips into birth dates for one locale and one "today".
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    locale: LocaleTag,
    pattern: &'static str,
    today: NaiveDate,
    weekdays: OnceLock<Option<WeekdayTable>>,
}

impl DateNormalizer {
    /// Prepares the date pattern for `locale`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::UnsupportedLocale`] when the locale has no
    /// date pattern.
    pub fn new(locale: LocaleTag, today: NaiveDate) -> CoreResult<Self> {
        let pattern = locale.date_format()?;
        Ok(Self {
            locale,
            pattern,
            today,
            weekdays: OnceLock::new(),
        })
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    /// Parses one tooltip.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnresolvableDate`] when the cleaned tooltip is
    /// neither a date in the locale's pattern nor an upcoming weekday, and
    /// [`CoreError::UnknownWeekdayLocale`] when a weekday lookup is needed
    /// but the locale has no weekday names.
    pub fn normalize(&self, tooltip: &str, name: &str) -> CoreResult<BirthDate> {
        let cleaned = clean_tooltip(tooltip, name);
        trace!(%tooltip, %cleaned, "normalizing tooltip");

        if let Some(date) = self.parse_date(&cleaned) {
            return Ok(BirthDate::from_date(date));
        }

        let weekdays = self.weekdays()?;
        let weekday = decode_entities(&cleaned).to_lowercase();
        if let Some(date) = weekdays.resolve(&weekday) {
            return Ok(BirthDate::from_date(date));
        }

        debug!(
            locale = %self.locale,
            pattern = self.pattern,
            cleaned = %cleaned,
            weekdays = ?weekdays.names().collect::<Vec<_>>(),
            "tooltip matched neither date pattern nor weekday"
        );
        Err(CoreError::UnresolvableDate {
            raw: cleaned,
            locale: self.locale.to_string(),
        })
    }

    fn weekdays(&self) -> CoreResult<&WeekdayTable> {
        self.weekdays
            .get_or_init(|| {
                WeekdayTable::build(&self.locale, self.today)
                    .inspect_err(|e| debug!(error = %e, "weekday table unavailable"))
                    .ok()
            })
            .as_ref()
            .ok_or_else(|| CoreError::UnknownWeekdayLocale(self.locale.to_string()))
    }

    fn parse_date(&self, cleaned: &str) -> Option<NaiveDate> {
        let input = format!("{cleaned} {LEAP_REFERENCE_YEAR}");
        let format = format!("{} %Y", self.pattern);
        NaiveDate::parse_from_str(&input, &format).ok()
    }
}
