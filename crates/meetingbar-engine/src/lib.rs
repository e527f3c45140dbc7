//! Meeting engine: aggregation, display snapshot, reminders.
//!
//! - [`Aggregator`] merges meetings from every configured calendar source
//! - [`Engine`] runs refresh cycles and publishes immutable [`Snapshot`]s
//! - [`NotificationScheduler`] fires one [`Reminder`] per meeting
//! - [`RefreshLoop`] and [`ReminderWatcher`] drive the engine in the background
//! - [`ActionDispatcher`] turns user [`Action`]s into engine calls
//!
//! # Example
//!
//! ```rust,no_run
//! use meetingbar_engine::{Engine, EngineConfig, RefreshLoop, SignalHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Engine::new(EngineConfig::default());
//!     engine.on_reminder_due(|r| println!("{}", r.body()));
//!
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!     RefreshLoop::new(engine, signals.shutdown_handle()).run().await;
//! }
//! ```

mod actions;
mod aggregator;
mod config;
mod engine;
mod error;
mod notify;
mod scheduler;
mod signals;
#[cfg(test)]
mod testing;

pub use actions::{Action, ActionDispatcher, ActionSender, LinkOpener, action_channel};
pub use aggregator::{AggregateOutcome, Aggregator, SourceCalendars, sort_meetings};
pub use config::{DEFAULT_MAX_MEETINGS, DEFAULT_REFRESH_INTERVAL, EngineConfig};
pub use engine::{Clock, Engine, EngineBuilder, RefreshOutcome, Snapshot};
pub use error::{EngineError, EngineResult};
pub use notify::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_LEAD_TIME, DesktopNotifier, FnSink, NotificationScheduler,
    NotifiedSet, NotifyConfig, REMINDER_SUMMARY, Reminder, ReminderSink,
};
pub use scheduler::{RefreshLoop, ReminderWatcher};
pub use signals::{ReloadSignal, ShutdownHandle, ShutdownSignal, SignalHandler};
