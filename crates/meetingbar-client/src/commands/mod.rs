//! Command implementations.

pub mod calendars;
pub mod config;
pub mod join;
pub mod run;
pub mod status;

use meetingbar_engine::Engine;

use crate::config::ClientConfig;

/// Builds an engine from the client configuration.
pub(crate) fn engine(config: &ClientConfig) -> Engine {
    Engine::new(config.to_engine_config())
}

/// Serializes a value as pretty JSON.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> crate::error::ClientResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| crate::error::ClientError::output(format!("failed to serialize JSON: {e}")))
}
