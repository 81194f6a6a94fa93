//! Facebook source configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Which upstream endpoint birthdays are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BirthdaySource {
    /// Monthly GraphQL query; carries names, ids and sometimes the year.
    #[default]
    GraphQl,
    /// Legacy async HTML fragments; tooltips must be normalized per locale.
    Async,
}

impl BirthdaySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GraphQl => "graphql",
            Self::Async => "async",
        }
    }
}

impl fmt::Display for BirthdaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BirthdaySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graphql" => Ok(Self::GraphQl),
            "async" => Ok(Self::Async),
            other => Err(format!(
                "unknown birthday source `{other}`, expected `graphql` or `async`"
            )),
        }
    }
}

/// Configuration for the Facebook client.
#[derive(Debug, Clone)]
pub struct FacebookConfig {
    /// Site root every endpoint is joined onto.
    pub base_url: Url,

    /// Login page, `login.php` under the base URL.
    pub login_url: Url,

    pub source: BirthdaySource,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string. Upstream serves the classic login form only to
    /// desktop browsers.
    pub user_agent: String,
}

impl FacebookConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.facebook.com/";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/74.0.3729.169 Safari/537.36";

    /// Creates a configuration rooted at `base_url`, with the login page
    /// under the same root.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(base_url.as_ref())?;
        let login_url = base_url.join("login.php")?;
        Ok(Self {
            base_url,
            login_url,
            source: BirthdaySource::default(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Sets the birthday source.
    pub fn with_source(mut self, source: BirthdaySource) -> Self {
        self.source = source;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL of `path` under the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", self.base_url, path))
    }
}
