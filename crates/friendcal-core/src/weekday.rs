//! Localized weekday names for the week following "today".
//!
//! The birthday listing renders the next seven days as weekday names
//! ("Thursday") instead of dates. [`WeekdayTable`] maps those names back to
//! a day offset from today.

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::locale::LocaleTag;

/// Network-specific tags mapped to the platform locale with the same
/// weekday spelling.
const PLATFORM_ALIASES: &[(&str, &str)] = &[
    ("ar_AR", "ar_SA"),
    ("en_UD", "en_US"),
    ("eo_EO", "eo"),
    ("es_LA", "es_MX"),
    ("ff_NG", "ff_SN"),
    ("ja_KS", "ja_JP"),
    ("qz_MM", "my_MM"),
    ("sz_PL", "szl_PL"),
    ("tz_MA", "ber_MA"),
];

/// Resolves `tag` to a chrono locale: the exact tag first, then a known
/// alias, then the language's home region (`xx_XX`).
pub fn platform_locale(tag: &LocaleTag) -> Option<chrono::Locale> {
    let alias = PLATFORM_ALIASES
        .iter()
        .find(|(from, _)| *from == tag.as_str())
        .map(|(_, to)| (*to).to_string());
    let home = format!("{}_{}", tag.language(), tag.language().to_uppercase());

    std::iter::once(tag.as_str().to_string())
        .chain(alias)
        .chain(std::iter::once(home))
        .find_map(|candidate| chrono::Locale::try_from(candidate.as_str()).ok())
}

/// Lowercased weekday names keyed to offsets 1..=7 from a fixed day.
#[derive(Debug, Clone)]
pub struct WeekdayTable {
    today: NaiveDate,
    entries: Vec<(String, i64)>,
}

impl WeekdayTable {
    /// Builds the table for `locale` relative to `today`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownWeekdayLocale`] when neither the tag nor
    /// any fallback resolves to a platform locale.
    pub fn build(locale: &LocaleTag, today: NaiveDate) -> CoreResult<Self> {
        let platform = platform_locale(locale)
            .ok_or_else(|| CoreError::UnknownWeekdayLocale(locale.to_string()))?;

        let entries: Vec<(String, i64)> = (1..=7)
            .map(|offset| {
                let day = today + Duration::days(offset);
                let name = day
                    .and_time(NaiveTime::MIN)
                    .and_utc()
                    .format_localized("%A", platform)
                    .to_string()
                    .to_lowercase();
                (name, offset)
            })
            .collect();

        debug!(locale = %locale, %today, weekdays = ?entries, "built weekday table");
        Ok(Self { today, entries })
    }

    /// Offset in days for a lowercased weekday name.
    pub fn offset_of(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, offset)| *offset)
    }

    /// The date a weekday name refers to.
    pub fn resolve(&self, name: &str) -> Option<NaiveDate> {
        self.offset_of(name)
            .map(|offset| self.today + Duration::days(offset))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LocaleTag {
        LocaleTag::new(s).unwrap()
    }

    fn dec_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 12, 1).unwrap()
    }

    #[test]
    fn english_week_after_a_tuesday() {
        let table = WeekdayTable::build(&tag("en_US"), dec_first()).unwrap();
        let names: Vec<_> = table.names().collect();
        assert_eq!(
            names,
            [
                "wednesday",
                "thursday",
                "friday",
                "saturday",
                "sunday",
                "monday",
                "tuesday"
            ]
        );
    }

    #[test]
    fn tomorrow_is_offset_one_and_a_week_is_seven() {
        let table = WeekdayTable::build(&tag("en_GB"), dec_first()).unwrap();
        assert_eq!(table.offset_of("wednesday"), Some(1));
        assert_eq!(table.offset_of("tuesday"), Some(7));
        assert_eq!(
            table.resolve("tuesday"),
            NaiveDate::from_ymd_opt(2020, 12, 8)
        );
    }

    #[test]
    fn localized_names_are_lowercased() {
        let table = WeekdayTable::build(&tag("de_DE"), dec_first()).unwrap();
        assert_eq!(table.offset_of("donnerstag"), Some(2));
        assert_eq!(table.offset_of("Donnerstag"), None);
    }

    #[test]
    fn network_only_tag_uses_alias() {
        assert!(platform_locale(&tag("es_LA")).is_some());
        let table = WeekdayTable::build(&tag("es_LA"), dec_first()).unwrap();
        assert_eq!(table.offset_of("jueves"), Some(2));
    }

    #[test]
    fn every_alias_target_is_a_platform_locale() {
        for (from, to) in PLATFORM_ALIASES {
            assert!(
                chrono::Locale::try_from(*to).is_ok(),
                "{from} maps to unknown locale {to}"
            );
        }
    }

    #[test]
    fn language_home_region_fallback() {
        // no such region, but `pt_PT` exists
        assert!(platform_locale(&tag("pt_ZZ")).is_some());
    }

    #[test]
    fn unknown_language_fails_hard() {
        let err = WeekdayTable::build(&tag("qq_QQ"), dec_first()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownWeekdayLocale(ref t) if t == "qq_QQ"));
    }
}
