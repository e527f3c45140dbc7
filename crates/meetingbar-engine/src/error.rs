//! Engine error types.

use meetingbar_providers::ProviderError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine.
///
/// Per-calendar and per-source failures never become an `EngineError`;
/// they are logged and counted in the aggregation report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A calendar source error that could not be absorbed.
    #[error("Calendar source error: {0}")]
    Provider(#[from] ProviderError),

    /// Every configured source failed during the last cycle.
    #[error("All calendar sources failed ({failed} of {total})")]
    AllSourcesFailed { failed: usize, total: usize },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// No meeting matches a join request.
    #[error("No meeting to join: {message}")]
    NoMeeting { message: String },

    /// A meeting link could not be opened.
    #[error("Failed to open link: {message}")]
    Open { message: String },

    /// A reminder could not be delivered.
    #[error("Notification delivery failed: {message}")]
    Notification { message: String },
}

impl EngineError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a notification delivery error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification {
            message: message.into(),
        }
    }

    /// Creates a no-meeting error.
    pub fn no_meeting(message: impl Into<String>) -> Self {
        Self::NoMeeting {
            message: message.into(),
        }
    }

    /// Creates a link-open error.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /// Creates an all-sources-failed error.
    pub fn all_sources_failed(failed: usize, total: usize) -> Self {
        Self::AllSourcesFailed { failed, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            EngineError::all_sources_failed(2, 2).to_string(),
            "All calendar sources failed (2 of 2)"
        );
        assert_eq!(
            EngineError::config("bad interval").to_string(),
            "Configuration error: bad interval"
        );
    }

    #[test]
    fn wraps_provider_errors() {
        let err: EngineError = ProviderError::unavailable("offline").into();
        assert!(matches!(err, EngineError::Provider(_)));
        assert!(err.to_string().contains("offline"));
    }
}
