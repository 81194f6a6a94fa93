//! Client error types.

use std::fmt;

use friendcal_core::{CoreError, TracingError};
use friendcal_providers::ProviderError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// A secret reference could not be resolved.
    Secret(String),
    /// Login or fetch failure.
    Provider(ProviderError),
    /// Normalization, projection or file output failure.
    Core(CoreError),
    /// Logging could not be set up.
    Tracing(TracingError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Secret(msg) => write!(f, "secret error: {}", msg),
            Self::Provider(err) => write!(f, "{}", err),
            Self::Core(err) => write!(f, "{}", err),
            Self::Tracing(err) => write!(f, "logging error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Core(err) => Some(err),
            Self::Tracing(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Config(_) | Self::Secret(_) => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<TracingError> for ClientError {
    fn from(err: TracingError) -> Self {
        Self::Tracing(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_display_unchanged() {
        let err: ClientError = ProviderError::unresolved_alias("ann.b")
            .with_provider("facebook")
            .into();
        assert_eq!(
            err.to_string(),
            "[facebook] unresolved_alias: could not resolve profile alias `ann.b` to an identifier"
        );
    }

    #[test]
    fn core_errors_keep_source() {
        use std::error::Error;
        let err: ClientError = CoreError::NoBirthdays.into();
        assert_eq!(err.to_string(), "no birthdays found");
        assert!(err.source().is_some());
    }
}
