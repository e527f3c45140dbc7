//! Client error types.

use std::path::PathBuf;

use meetingbar_engine::EngineError;
use meetingbar_providers::ProviderError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors reported by the `meetingbar` command.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Calendar source error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Output could not be produced.
    #[error("output error: {0}")]
    Output(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }
}
