//! User actions.
//!
//! Tray menus, key bindings and the CLI send [`Action`]s through one channel;
//! a single [`ActionDispatcher`] drains it and talks to the engine.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::{Engine, RefreshOutcome};
use crate::error::EngineResult;
use crate::signals::ShutdownHandle;

/// A user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Refresh now (dropped if a cycle is running).
    Refresh,
    /// Open a meeting link: the given meeting, or the canonical one.
    Join(Option<String>),
    /// Stop the engine.
    Quit,
}

/// Opens meeting links.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> EngineResult<()>;
}

impl<F> LinkOpener for F
where
    F: Fn(&str) -> EngineResult<()> + Send + Sync,
{
    fn open(&self, url: &str) -> EngineResult<()> {
        self(url)
    }
}

/// Creates the action channel.
pub fn action_channel() -> (ActionSender, mpsc::Receiver<Action>) {
    let (tx, rx) = mpsc::channel(16);
    (ActionSender { tx }, rx)
}

/// Sends actions to the dispatcher.
#[derive(Debug, Clone)]
pub struct ActionSender {
    tx: mpsc::Sender<Action>,
}

impl ActionSender {
    pub async fn send(&self, action: Action) -> Result<(), mpsc::error::SendError<Action>> {
        self.tx.send(action).await
    }

    pub async fn refresh(&self) -> Result<(), mpsc::error::SendError<Action>> {
        self.send(Action::Refresh).await
    }

    pub async fn join(
        &self,
        meeting_id: Option<String>,
    ) -> Result<(), mpsc::error::SendError<Action>> {
        self.send(Action::Join(meeting_id)).await
    }

    pub async fn quit(&self) -> Result<(), mpsc::error::SendError<Action>> {
        self.send(Action::Quit).await
    }

    /// Sends from a thread outside the runtime.
    pub fn blocking_send(&self, action: Action) -> Result<(), mpsc::error::SendError<Action>> {
        self.tx.blocking_send(action)
    }
}

/// Drains the action channel.
pub struct ActionDispatcher {
    engine: Engine,
    opener: Arc<dyn LinkOpener>,
    shutdown: ShutdownHandle,
    rx: mpsc::Receiver<Action>,
}

impl ActionDispatcher {
    pub fn new(
        engine: Engine,
        opener: Arc<dyn LinkOpener>,
        shutdown: ShutdownHandle,
        rx: mpsc::Receiver<Action>,
    ) -> Self {
        Self {
            engine,
            opener,
            shutdown,
            rx,
        }
    }

    /// Handles actions until quit, shutdown, or every sender is gone.
    ///
    /// Refreshes run in their own tasks so a slow backend never delays a
    /// join or a quit. Refreshes still running on exit are cancelled.
    pub async fn run(mut self) {
        let mut refreshes = JoinSet::new();
        loop {
            let action = tokio::select! {
                action = self.rx.recv() => action,
                _ = self.shutdown.wait().wait() => None,
            };
            let Some(action) = action else {
                break;
            };
            debug!(?action, "Dispatching action");
            match action {
                Action::Quit => {
                    info!("Quit requested");
                    self.shutdown.trigger();
                    break;
                }
                Action::Refresh => {
                    while refreshes.try_join_next().is_some() {}
                    let engine = self.engine.clone();
                    refreshes.spawn(async move {
                        if engine.refresh_now().await == RefreshOutcome::AlreadyInFlight {
                            debug!("Manual refresh dropped, cycle already running");
                        }
                    });
                }
                Action::Join(meeting_id) => {
                    if let Err(e) = self.join(meeting_id.as_deref()) {
                        warn!(error = %e, "Action failed");
                    }
                }
            }
        }
        refreshes.shutdown().await;
        debug!("Action dispatcher stopped");
    }

    fn join(&self, meeting_id: Option<&str>) -> EngineResult<()> {
        let snapshot = self.engine.current_state();
        let (meeting, link) = snapshot.join_link(meeting_id, self.engine.now())?;
        info!(title = %meeting.title, provider = link.kind.display_name(), "Joining meeting");
        self.opener.open(&link.url)
    }
}
