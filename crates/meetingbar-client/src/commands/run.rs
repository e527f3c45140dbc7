//! `meetingbar run`: the engine in the foreground.
//!
//! - refresh loop and reminder watcher
//! - desktop notifications
//! - one status line per published snapshot
//! - stdin commands: `refresh`, `join [ID]`, `quit`
//! - SIGTERM/SIGINT stop, SIGHUP reloads the configuration file

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use meetingbar_engine::{
    Action, ActionDispatcher, ActionSender, DesktopNotifier, Engine, RefreshLoop, ReminderWatcher,
    SignalHandler, Snapshot, action_channel,
};
use tracing::{debug, error, info, warn};

use super::join::browser_opener;
use super::status::StatusReport;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Parses one stdin command.
pub fn parse_action(line: &str) -> Option<Action> {
    let mut words = line.split_whitespace();
    match words.next()? {
        "r" | "refresh" => Some(Action::Refresh),
        "j" | "join" => Some(Action::Join(words.next().map(str::to_string))),
        "q" | "quit" => Some(Action::Quit),
        _ => None,
    }
}

pub async fn run(
    config_path: Option<&Path>,
    config: &ClientConfig,
    json: bool,
) -> ClientResult<()> {
    let engine_config = config.to_engine_config();
    if let Err(e) = engine_config.validate() {
        warn!(error = %e, "Configuration problem");
    }

    let engine = Engine::new(engine_config);
    engine.add_reminder_sink(Arc::new(DesktopNotifier::new(engine.config().notify.clone())));

    let signals = SignalHandler::new();
    signals.spawn_listener();
    let shutdown = signals.shutdown_handle();
    let mut reloads = signals.reloads();

    let refresh_task = tokio::spawn(RefreshLoop::new(engine.clone(), shutdown.clone()).run());
    let watcher_task = tokio::spawn(ReminderWatcher::new(engine.clone(), shutdown.clone()).run());

    let (sender, rx) = action_channel();
    let dispatcher = ActionDispatcher::new(engine.clone(), browser_opener(), shutdown.clone(), rx);
    let dispatcher_task = tokio::spawn(dispatcher.run());
    spawn_stdin_reader(sender);

    info!("Engine running");
    let config_path = ClientConfig::resolve_path(config_path);
    let mut updates = engine.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_status(&engine, &snapshot, json);
            }
            more = reloads.recv() => {
                if !more {
                    break;
                }
                reload(&engine, &config_path);
            }
            _ = shutdown.wait().wait() => break,
        }
    }

    info!("Shutting down...");
    shutdown.trigger();
    let stopped = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = tokio::join!(refresh_task, watcher_task, dispatcher_task);
    })
    .await;
    if stopped.is_err() {
        warn!("Background tasks did not stop in time");
    }

    info!("Engine stopped");
    Ok(())
}

fn print_status(engine: &Engine, snapshot: &Snapshot, json: bool) {
    let report = StatusReport::new(snapshot, &engine.config(), engine.now());
    if !json {
        println!("{}", report.text);
        return;
    }
    // One object per line for status bar consumers.
    match serde_json::to_string(&report) {
        Ok(line) => println!("{line}"),
        Err(e) => error!(error = %e, "Failed to print status"),
    }
}

fn reload(engine: &Engine, path: &Path) {
    match ClientConfig::load_from(path) {
        Ok(config) => {
            engine.reload_config(config.to_engine_config());
            info!(path = %path.display(), "Configuration reloaded");
        }
        Err(e) => warn!(error = %e, "Reload failed, keeping current configuration"),
    }
}

/// Reads commands on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader(sender: ActionSender) {
    let spawned = std::thread::Builder::new()
        .name("stdin-actions".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(action) = parse_action(&line) else {
                    warn!(command = line.trim(), "Unknown command");
                    continue;
                };
                if sender.blocking_send(action).is_err() {
                    break;
                }
            }
            debug!("Stdin reader stopped");
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start stdin reader");
    }
}
