//! Error types for calendar source operations.

use std::fmt;
use thiserror::Error;

/// The category of a source error.
///
/// The aggregator treats every category the same way (skip the source for
/// this cycle), but logs and CLI output distinguish them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The source could not be reached: network, IO, HTTP failure.
    SourceUnavailable,
    /// The source refused access to a calendar.
    PermissionDenied,
    /// A calendar does not exist in this source.
    NotFound,
    /// Raw data could not be parsed.
    ParseError,
    /// Source settings are missing or invalid.
    ConfigInvalid,
    /// Unexpected state inside a source.
    Internal,
}

impl ProviderErrorCode {
    /// Returns true if a later cycle may succeed without user action.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable)
    }

    /// Returns a machine-friendly name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "source_unavailable",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::ParseError => "parse_error",
            Self::ConfigInvalid => "config_invalid",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised by a calendar source.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The source that generated this error (e.g. "remote", "local").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::SourceUnavailable, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::PermissionDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ParseError, message)
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigInvalid, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }

    /// Maps an IO error to the matching code.
    pub fn from_io(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ProviderErrorCode::PermissionDenied,
            std::io::ErrorKind::NotFound => ProviderErrorCode::NotFound,
            _ => ProviderErrorCode::SourceUnavailable,
        };
        Self::new(code, context).with_source(err)
    }

    /// Sets the source name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the underlying cause.
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

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
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

/// A specialized Result type for source operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_transient() {
        assert!(ProviderErrorCode::SourceUnavailable.is_transient());
        assert!(!ProviderErrorCode::PermissionDenied.is_transient());
        assert!(!ProviderErrorCode::ParseError.is_transient());
        assert!(!ProviderErrorCode::ConfigInvalid.is_transient());
    }

    #[test]
    fn display_includes_provider_and_code() {
        let err = ProviderError::unavailable("connection refused").with_provider("remote");
        assert_eq!(
            err.to_string(),
            "[remote] source_unavailable: connection refused"
        );
    }

    #[test]
    fn display_without_provider() {
        let err = ProviderError::parse("bad VEVENT");
        assert_eq!(err.to_string(), "parse_error: bad VEVENT");
    }

    #[test]
    fn io_errors_are_classified() {
        use std::io::{Error, ErrorKind};

        let denied = ProviderError::from_io("read", Error::from(ErrorKind::PermissionDenied));
        assert_eq!(denied.code(), ProviderErrorCode::PermissionDenied);

        let missing = ProviderError::from_io("read", Error::from(ErrorKind::NotFound));
        assert_eq!(missing.code(), ProviderErrorCode::NotFound);

        let other = ProviderError::from_io("read", Error::other("disk full"));
        assert_eq!(other.code(), ProviderErrorCode::SourceUnavailable);
    }

    #[test]
    fn keeps_source() {
        use std::error::Error;
        let err = ProviderError::internal("x").with_source(std::io::Error::other("cause"));
        assert!(err.source().is_some());
    }
}
