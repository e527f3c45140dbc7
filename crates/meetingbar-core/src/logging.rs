//! Log setup for the meetingbar binary.
//!
//! Logs go to stderr so stdout stays free for the status line, the agenda
//! and `--json` output. `RUST_LOG` overrides the level picked from flags.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Error)]
#[error("failed to install log subscriber: {0}")]
pub struct LogError(#[from] tracing::subscriber::SetGlobalDefaultError);

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One short human-readable line per event.
    Compact,
    /// One JSON object per event, for `meetingbar --json run` under a supervisor.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Include source file and line.
    pub with_location: bool,
}

impl LogConfig {
    /// Chooses level and format from `--debug` and `--json`.
    ///
    /// Without `--debug` only warnings are shown.
    #[must_use]
    pub fn from_flags(debug: bool, json: bool) -> Self {
        Self {
            level: if debug { Level::DEBUG } else { Level::WARN },
            format: if json { LogFormat::Json } else { LogFormat::Compact },
            with_location: debug,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("meetingbar={}", self.level)))
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.with_location)
        .with_line_number(config.with_location);
    let layer = match config.format {
        LogFormat::Compact => layer.compact().without_time().boxed(),
        LogFormat::Json => layer.json().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(config.filter()).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
