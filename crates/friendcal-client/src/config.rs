//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/friendcal/config.toml` by default. Every section and key is
//! optional.
//!
//! `[auth]` values support secret references (`env::VAR`, `pass::path`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use friendcal_core::calendar::DEFAULT_CALENDAR_NAME;
use friendcal_providers::{BirthdaySource, FacebookConfig};
use serde::{Deserialize, Serialize};

use crate::secret;

/// Configuration for the friendcal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Facebook credentials.
    pub auth: AuthSettings,

    /// Upstream settings.
    pub facebook: FacebookSettings,

    /// Calendar output.
    pub output: OutputSettings,

    pub logging: LoggingSettings,
}

/// Login credentials, stored inline or as secret references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Resolved login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl AuthSettings {
    /// Resolves both values through [`secret::resolve`].
    pub fn resolve_credentials(&self) -> Result<Credentials, String> {
        let raw_email = self.email.as_deref().ok_or_else(|| {
            format!(
                "Facebook credentials not found. Add to {}:\n  \
                 [auth]\n  \
                 email = \"you@example.com\"\n  \
                 password = \"env::FB_PASSWORD\"",
                ClientConfig::default_path().display()
            )
        })?;
        let raw_password = self
            .password
            .as_deref()
            .ok_or_else(|| "password is missing from [auth] section in config.toml".to_string())?;

        let email =
            secret::resolve(raw_email).map_err(|e| format!("failed to resolve email: {}", e))?;
        let password = secret::resolve(raw_password)
            .map_err(|e| format!("failed to resolve password: {}", e))?;
        if email.is_empty() || password.is_empty() {
            return Err("email and password must not be empty".to_string());
        }

        Ok(Credentials { email, password })
    }
}

/// Facebook endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacebookSettings {
    /// `graphql` or `async`.
    pub source: String,

    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Overrides the desktop browser user agent.
    pub user_agent: Option<String>,
}

impl Default for FacebookSettings {
    fn default() -> Self {
        Self {
            source: BirthdaySource::default().to_string(),
            base_url: FacebookConfig::DEFAULT_BASE_URL.to_string(),
            timeout_secs: FacebookConfig::DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl FacebookSettings {
    /// Converts to provider configuration.
    pub fn to_provider_config(&self) -> Result<FacebookConfig, String> {
        let source: BirthdaySource = self.source.parse()?;
        let mut config = FacebookConfig::new(&self.base_url)
            .map_err(|e| format!("invalid base_url `{}`: {}", self.base_url, e))?
            .with_source(source)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref agent) = self.user_agent {
            config = config.with_user_agent(agent);
        }
        Ok(config)
    }
}

/// Where and how the calendar is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write to `path`; when false the calendar goes to stdout.
    pub save_to_file: bool,

    /// Output file, `~` is expanded.
    pub path: String,

    /// `X-WR-CALNAME` of the generated calendar.
    pub calendar_name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            save_to_file: true,
            path: "~/friendcal/birthdays.ics".to_string(),
            calendar_name: DEFAULT_CALENDAR_NAME.to_string(),
        }
    }
}

impl OutputSettings {
    /// The output path with a leading `~` replaced by the home directory.
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level used when neither `RUST_LOG` nor `--debug` is given.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does
    /// not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("friendcal")
            .join("config.toml")
    }
}

fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}
