//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// meetingbar - your next meeting in the status bar
#[derive(Debug, Parser)]
#[command(name = "meetingbar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETINGBAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run; `status` when none is given.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Refresh once and print the status line and agenda
    Status,

    /// List calendars and whether they are enabled
    Calendars,

    /// Run the engine in the foreground with reminders
    Run,

    /// Open the next meeting's conference link
    Join {
        /// Meeting ID (defaults to the current or next meeting)
        id: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
