//! Error types for birthday source operations.
//!
//! Every failure carries a [`ProviderErrorCode`], and every code belongs to
//! one [`ErrorCategory`]. Nothing is retried: the category exists for
//! reporting, not for recovery.

use std::fmt;

use friendcal_core::CoreError;
use thiserror::Error;

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Login, network and HTTP status failures.
    Transport,
    /// A payload did not have the expected shape.
    Structural,
    /// A payload was well formed but its content could not be used.
    Semantic,
    /// Local configuration or program state.
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Structural => "structural",
            Self::Semantic => "semantic",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The specific kind of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials rejected or a login step failed.
    AuthenticationFailed,
    /// The account is held at a security checkpoint.
    SecurityCheckpoint,
    /// Connection failed, timed out or could not be built.
    NetworkError,
    /// A request returned something other than 200.
    HttpStatus,
    /// Expected markers or fields are missing from a payload.
    InvalidResponse,
    /// A vanity alias did not resolve to an identifier.
    UnresolvedAlias,
    /// The account locale is malformed or unsupported.
    InvalidLocale,
    /// A tooltip could not be turned into a date.
    UnresolvableDate,
    /// All windows were fetched and no birthday was found.
    EmptyResult,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// Unexpected local failure.
    InternalError,
}

impl ProviderErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationFailed
            | Self::SecurityCheckpoint
            | Self::NetworkError
            | Self::HttpStatus => ErrorCategory::Transport,
            Self::InvalidResponse => ErrorCategory::Structural,
            Self::UnresolvedAlias
            | Self::InvalidLocale
            | Self::UnresolvableDate
            | Self::EmptyResult => ErrorCategory::Semantic,
            Self::ConfigurationError | Self::InternalError => ErrorCategory::Internal,
        }
    }

    /// Returns a machine-friendly name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::SecurityCheckpoint => "security_checkpoint",
            Self::NetworkError => "network_error",
            Self::HttpStatus => "http_status",
            Self::InvalidResponse => "invalid_response",
            Self::UnresolvedAlias => "unresolved_alias",
            Self::InvalidLocale => "invalid_locale",
            Self::UnresolvableDate => "unresolvable_date",
            Self::EmptyResult => "empty_result",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a birthday source.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The source that produced this error (e.g. "facebook").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::SecurityCheckpoint, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// A non-200 response during `stage`.
    pub fn http_status(stage: &str, status: u16) -> Self {
        Self::new(
            ProviderErrorCode::HttpStatus,
            format!("{stage} returned status {status}"),
        )
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn unresolved_alias(alias: &str) -> Self {
        Self::new(
            ProviderErrorCode::UnresolvedAlias,
            format!("could not resolve profile alias `{alias}` to an identifier"),
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<CoreError> for ProviderError {
    fn from(err: CoreError) -> Self {
        let code = match err {
            CoreError::InvalidLocaleTag(_)
            | CoreError::UnsupportedLocale(_)
            | CoreError::UnknownWeekdayLocale(_) => ProviderErrorCode::InvalidLocale,
            CoreError::UnresolvableDate { .. } => ProviderErrorCode::UnresolvableDate,
            CoreError::InvalidBirthDate { .. } | CoreError::YearOutOfRange(_) => {
                ProviderErrorCode::InvalidResponse
            }
            CoreError::NoBirthdays => ProviderErrorCode::EmptyResult,
            CoreError::NonexistentLocalTime(_)
            | CoreError::LocaleTable(_)
            | CoreError::Write { .. } => ProviderErrorCode::InternalError,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
