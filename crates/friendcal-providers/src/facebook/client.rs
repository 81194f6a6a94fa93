//! Session-owning Facebook client.
//!
//! Holds the HTTP session and memoizes the page tokens and the account
//! locale. Everything is sequential: each method takes `&mut self` and
//! awaits one request at a time.

use std::sync::LazyLock;

use friendcal_core::{DateNormalizer, LocaleTag, Person};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::facebook::auth;
use crate::facebook::config::FacebookConfig;
use crate::facebook::extract::{ProfileToken, decode_guarded_json, extract_entries};
use crate::facebook::graphql;
use crate::session::HttpSession;

const EVENT_PAGE_PATH: &str = "events/birthdays/";
const GRAPHQL_PATH: &str = "api/graphql/";
const ASYNC_BIRTHDAYS_PATH: &str = "async/birthdays/";
const LOCALE_PATH: &str = "ajax/settings/language/account.php";
const COMPOSER_QUERY_PATH: &str = "ajax/mercury/composer_query.php";

static DTSG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{"token":"(.*?)""#).expect("Invalid fb_dtsg regex"));

static ASYNC_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{"token":".*?","async_get_token":"(.*?)"\}"#)
        .expect("Invalid async token regex")
});

/// Facebook client over any [`HttpSession`].
pub struct FacebookClient<S> {
    session: S,
    config: FacebookConfig,
    dtsg_token: Option<String>,
    async_token: Option<String>,
    locale: Option<LocaleTag>,
}

impl<S: HttpSession> FacebookClient<S> {
    pub fn new(session: S, config: FacebookConfig) -> Self {
        Self {
            session,
            config,
            dtsg_token: None,
            async_token: None,
            locale: None,
        }
    }

    pub fn config(&self) -> &FacebookConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Logs in with the given credentials and returns the account id.
    pub async fn login(&mut self, email: &str, password: &str) -> ProviderResult<String> {
        auth::login(&self.session, &self.config, email, password).await
    }

    /// The `fb_dtsg` token posted with GraphQL requests.
    pub async fn dtsg_token(&mut self) -> ProviderResult<String> {
        if let Some(token) = &self.dtsg_token {
            return Ok(token.clone());
        }
        let token = self.scrape_event_page(&DTSG_REGEX, "fb_dtsg token").await?;
        self.dtsg_token = Some(token.clone());
        Ok(token)
    }

    /// The `async_get_token` sent as `fb_dtsg_ag` with async GET requests.
    pub async fn async_token(&mut self) -> ProviderResult<String> {
        if let Some(token) = &self.async_token {
            return Ok(token.clone());
        }
        let token = self.scrape_event_page(&ASYNC_TOKEN_REGEX, "async token").await?;
        self.async_token = Some(token.clone());
        Ok(token)
    }

    async fn scrape_event_page(&self, regex: &Regex, what: &str) -> ProviderResult<String> {
        let url = self.config.endpoint(EVENT_PAGE_PATH);
        let page = self
            .session
            .get(&url)
            .await?
            .require_ok("birthday event page")?;
        match regex.captures(&page.body) {
            Some(caps) => {
                debug!(what, "found token on birthday event page");
                Ok(caps[1].to_string())
            }
            None => {
                debug!(body = %page.body, what, "token not found");
                Err(ProviderError::invalid_response(format!(
                    "{what} not found on birthday event page"
                )))
            }
        }
    }

    /// The account locale, e.g. `en_GB`.
    pub async fn locale(&mut self) -> ProviderResult<LocaleTag> {
        if let Some(locale) = &self.locale {
            return Ok(locale.clone());
        }
        let token = self.async_token().await?;
        let url = format!(
            "{}?fb_dtsg_ag={}&__a=1",
            self.config.endpoint(LOCALE_PATH),
            urlencoding::encode(&token)
        );
        let response = self
            .session
            .get(&url)
            .await?
            .require_ok("account locale settings")?;
        let json = decode_guarded_json(&response.body, "locale settings")?;

        let raw = json
            .pointer("/jsmods/require/0/3/1/currentLocale")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                debug!(body = %response.body, "no currentLocale");
                ProviderError::invalid_response("currentLocale missing from locale settings")
            })?;
        let locale = LocaleTag::new(raw)?;
        info!(locale = %locale, "resolved account locale");

        self.locale = Some(locale.clone());
        Ok(locale)
    }

    /// Maps a vanity alias to the numeric profile identifier.
    ///
    /// # Errors
    ///
    /// Returns an unresolved-alias error when no user entry carries exactly
    /// this alias.
    pub async fn resolve_vanity(&mut self, vanity: &str) -> ProviderResult<String> {
        let token = self.async_token().await?;
        let url = format!(
            "{}?value={}&fb_dtsg_ag={}&__a=1",
            self.config.endpoint(COMPOSER_QUERY_PATH),
            urlencoding::encode(vanity),
            urlencoding::encode(&token)
        );
        let response = self
            .session
            .get(&url)
            .await?
            .require_ok("profile alias lookup")?;
        let json = decode_guarded_json(&response.body, "profile alias lookup")?;

        let entries = json
            .pointer("/payload/entries")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                debug!(body = %response.body, vanity, "no entries in alias lookup");
                ProviderError::invalid_response("entries missing from profile alias lookup")
            })?;

        let uid = entries
            .iter()
            .filter(|entry| is_person_entry(entry))
            .filter(|entry| entry.get("alias").and_then(Value::as_str) == Some(vanity))
            .find_map(|entry| uid_of(entry.get("uid")?))
            .ok_or_else(|| ProviderError::unresolved_alias(vanity))?;
        debug!(vanity, uid = %uid, "resolved profile alias");
        Ok(uid)
    }

    /// Fetches one GraphQL window starting at `offset_month`.
    pub async fn fetch_graphql_window(&mut self, offset_month: u32) -> ProviderResult<Vec<Person>> {
        let token = self.dtsg_token().await?;
        let url = self.config.endpoint(GRAPHQL_PATH);
        let form = graphql::request_form(offset_month, &token);
        let response = self
            .session
            .post_form(&url, &form)
            .await?
            .require_ok(graphql::FRIENDLY_NAME)?;
        graphql::parse_window(&response.body)
    }

    /// Fetches the async listing for the month starting at `epoch`.
    ///
    /// Vanity aliases are resolved one by one and tooltips go through
    /// `normalizer`. Years are never known on this path.
    pub async fn fetch_async_window(
        &mut self,
        epoch: i64,
        normalizer: &DateNormalizer,
    ) -> ProviderResult<Vec<Person>> {
        let token = self.async_token().await?;
        let url = format!(
            "{}?date={epoch}&fb_dtsg_ag={}&__a=1",
            self.config.endpoint(ASYNC_BIRTHDAYS_PATH),
            urlencoding::encode(&token)
        );
        let response = self
            .session
            .get(&url)
            .await?
            .require_ok("async birthdays")?;

        let mut persons = Vec::new();
        for entry in extract_entries(&response.body)? {
            let id = match entry.token {
                ProfileToken::Id(id) => id,
                ProfileToken::Vanity(vanity) => self.resolve_vanity(&vanity).await?,
            };
            let date = normalizer.normalize(&entry.tooltip, &entry.name)?;
            persons.push(Person::with_birth_date(id, entry.name, date));
        }
        Ok(persons)
    }
}

fn is_person_entry(entry: &Value) -> bool {
    let vertical = entry.get("vertical_type").and_then(Value::as_str);
    let render = entry.get("render_type").and_then(Value::as_str);
    vertical == Some("USER") || matches!(render, Some("friend" | "non_friend"))
}

fn uid_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::ProviderErrorCode;
    use crate::facebook::extract::fixtures::{entry_html, listing};
    use crate::facebook::graphql::fixtures::{friend, window};
    use crate::session::fake::FakeSession;
    use chrono::NaiveDate;
    use serde_json::json;

    fn client(session: FakeSession) -> FacebookClient<FakeSession> {
        let config = FacebookConfig::new(FacebookConfig::DEFAULT_BASE_URL).unwrap();
        FacebookClient::new(session, config)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 12, 1).unwrap()
    }

    mod tokens {
        use super::*;

        #[tokio::test]
        async fn both_tokens_come_from_event_page() {
            let mut client = client(FakeSession::new().route("events/birthdays/", 200, EVENT_PAGE));
            assert_eq!(client.dtsg_token().await.unwrap(), "DTSG-1");
            assert_eq!(client.async_token().await.unwrap(), "ASYNC-1");
        }

        #[tokio::test]
        async fn tokens_are_cached() {
            let mut client = client(FakeSession::new().route("events/birthdays/", 200, EVENT_PAGE));
            client.dtsg_token().await.unwrap();
            client.dtsg_token().await.unwrap();
            client.async_token().await.unwrap();
            client.async_token().await.unwrap();
            assert_eq!(client.session().count("events/birthdays/"), 2);
        }

        #[tokio::test]
        async fn event_page_status_is_reported() {
            let mut client = client(FakeSession::new().route("events/birthdays/", 404, ""));
            let err = client.dtsg_token().await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::HttpStatus);
            assert!(err.message().contains("birthday event page"));
        }

        #[tokio::test]
        async fn missing_token_is_structural() {
            let mut client = client(FakeSession::new().route("events/birthdays/", 200, "<html/>"));
            let err = client.async_token().await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        }
    }

    mod locale {
        use super::*;

        #[tokio::test]
        async fn reads_current_locale_once() {
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route("language/account.php", 200, locale_settings("en_GB"));
            let mut client = client(session);

            assert_eq!(client.locale().await.unwrap().as_str(), "en_GB");
            assert_eq!(client.locale().await.unwrap().as_str(), "en_GB");
            assert_eq!(client.session().count("language/account.php"), 1);

            let request = &client.session().requests()[1];
            assert!(request.url.contains("fb_dtsg_ag=ASYNC-1"));
            assert!(request.url.ends_with("&__a=1"));
        }

        #[tokio::test]
        async fn malformed_locale_is_rejected() {
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route("language/account.php", 200, locale_settings("english"));
            let err = client(session).locale().await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::InvalidLocale);
        }

        #[tokio::test]
        async fn missing_locale_is_structural() {
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route("language/account.php", 200, "for (;;);{\"jsmods\":{}}");
            let err = client(session).locale().await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        }
    }

    mod vanity {
        use super::*;

        fn lookup(entries: serde_json::Value) -> FacebookClient<FakeSession> {
            client(
                FakeSession::new()
                    .route("events/birthdays/", 200, EVENT_PAGE)
                    .route("composer_query.php", 200, composer_entries(entries)),
            )
        }

        #[tokio::test]
        async fn matches_alias_on_user_entries() {
            let mut client = lookup(json!([
                { "vertical_type": "PAGE", "render_type": "page", "alias": "john.smith", "uid": "999" },
                { "vertical_type": "USER", "render_type": "friend", "alias": "john.smith", "uid": "1001" },
            ]));
            assert_eq!(client.resolve_vanity("john.smith").await.unwrap(), "1001");

            let request = client.session().requests().pop().unwrap();
            assert!(request.url.contains("value=john.smith"));
        }

        #[tokio::test]
        async fn accepts_numeric_uid_and_non_friend() {
            let mut client = lookup(json!([
                { "vertical_type": "OTHER", "render_type": "non_friend", "alias": "ann", "uid": 42 },
            ]));
            assert_eq!(client.resolve_vanity("ann").await.unwrap(), "42");
        }

        #[tokio::test]
        async fn unmatched_alias_is_semantic_error() {
            let mut client = lookup(json!([
                { "vertical_type": "USER", "render_type": "friend", "alias": "someone.else", "uid": "1" },
            ]));
            let err = client.resolve_vanity("john.smith").await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::UnresolvedAlias);
            assert!(err.message().contains("john.smith"));
        }
    }

    mod windows {
        use super::*;

        #[tokio::test]
        async fn graphql_window_posts_token_and_offset() {
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route(
                    "api/graphql/",
                    200,
                    window(vec![vec![friend("7", "Ann Lee", 3, 1, Some(1990))]]),
                );
            let mut client = client(session);
            let people = client.fetch_graphql_window(3).await.unwrap();

            assert_eq!(people.len(), 1);
            assert_eq!(people[0].year(), Some(1990));
            let post = client.session().requests().pop().unwrap();
            assert_eq!(post.method, "POST");
            assert!(post.form.contains(&("fb_dtsg".to_string(), "DTSG-1".to_string())));
        }

        #[tokio::test]
        async fn graphql_status_names_query() {
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route("api/graphql/", 500, "");
            let err = client(session).fetch_graphql_window(0).await.unwrap_err();
            assert!(err.message().contains(graphql::FRIENDLY_NAME));
        }

        #[tokio::test]
        async fn async_window_resolves_and_normalizes() {
            let html = format!(
                "{}{}",
                entry_html("profile.php?id=100000006", "Bob Jones (05/03)", "Bob Jones"),
                entry_html("john.smith", "John Smith (Thursday)", "John Smith"),
            );
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route("composer_query.php", 200, composer_entries(json!([
                    { "vertical_type": "USER", "alias": "john.smith", "uid": "100000001" },
                ])))
                .route("async/birthdays/", 200, listing(&html));
            let mut client = client(session);
            let normalizer = DateNormalizer::new(LocaleTag::new("en_GB").unwrap(), today()).unwrap();

            let people = client.fetch_async_window(1_606_809_600, &normalizer).await.unwrap();

            assert_eq!(people.len(), 2);
            assert_eq!(people[0].id(), "100000006");
            assert_eq!((people[0].day(), people[0].month()), (5, 3));
            assert_eq!(people[1].id(), "100000001");
            assert_eq!((people[1].day(), people[1].month()), (3, 12));
            assert!(people.iter().all(|p| p.year().is_none()));

            let fetch = client
                .session()
                .requests()
                .into_iter()
                .find(|r| r.url.contains("async/birthdays/"))
                .unwrap();
            assert!(fetch.url.contains("date=1606809600&fb_dtsg_ag=ASYNC-1&__a=1"));
        }

        #[tokio::test]
        async fn unresolvable_tooltip_aborts_window() {
            let html = entry_html("profile.php?id=1", "A (someday)", "A");
            let session = FakeSession::new()
                .route("events/birthdays/", 200, EVENT_PAGE)
                .route("async/birthdays/", 200, listing(&html));
            let normalizer = DateNormalizer::new(LocaleTag::new("en_US").unwrap(), today()).unwrap();
            let err = client(session)
                .fetch_async_window(0, &normalizer)
                .await
                .unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::UnresolvableDate);
        }
    }
}
