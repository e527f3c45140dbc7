//! Background tasks driving the engine.
//!
//! - [`RefreshLoop`]: one cycle at startup, then one every refresh interval
//! - [`ReminderWatcher`]: re-checks reminders against the last snapshot
//!
//! Both read the interval from the engine configuration before each wait, so
//! a reload takes effect after the current wait. Both stop on shutdown; a
//! cycle in flight at that moment is cancelled.

use std::time::Duration;

use tracing::{debug, info};

use crate::engine::{Engine, RefreshOutcome};
use crate::signals::ShutdownHandle;

/// Drives periodic refresh cycles.
pub struct RefreshLoop {
    engine: Engine,
    shutdown: ShutdownHandle,
}

impl RefreshLoop {
    pub fn new(engine: Engine, shutdown: ShutdownHandle) -> Self {
        Self { engine, shutdown }
    }

    pub async fn run(self) {
        let config = self.engine.config();
        info!(
            interval_secs = config.refresh_interval.as_secs(),
            startup = config.auto_refresh_startup,
            "Refresh loop started"
        );

        if config.auto_refresh_startup && !self.cycle().await {
            return;
        }

        loop {
            let delay = self.engine.config().refresh_interval;
            debug!(delay_secs = delay.as_secs(), "Scheduling next refresh");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if !self.cycle().await {
                        break;
                    }
                }
                _ = self.shutdown.wait().wait() => break,
            }
        }

        info!("Refresh loop stopped");
    }

    /// Runs one cycle. Returns false if shutdown interrupted it.
    async fn cycle(&self) -> bool {
        tokio::select! {
            outcome = self.engine.refresh_now() => {
                if outcome == RefreshOutcome::AlreadyInFlight {
                    debug!("Timer refresh skipped, cycle already running");
                }
                true
            }
            _ = self.shutdown.wait().wait() => {
                info!("Shutdown during refresh, cycle cancelled");
                false
            }
        }
    }
}

/// Re-checks reminders between refreshes.
pub struct ReminderWatcher {
    engine: Engine,
    shutdown: ShutdownHandle,
}

impl ReminderWatcher {
    pub fn new(engine: Engine, shutdown: ShutdownHandle) -> Self {
        Self { engine, shutdown }
    }

    pub async fn run(self) {
        loop {
            let interval = self.check_interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let fired = self.engine.check_reminders().await;
                    if !fired.is_empty() {
                        debug!(count = fired.len(), "Watcher fired reminders");
                    }
                }
                _ = self.shutdown.wait().wait() => break,
            }
        }
        debug!("Reminder watcher stopped");
    }

    fn check_interval(&self) -> Duration {
        self.engine.config().notify.check_interval
    }
}
