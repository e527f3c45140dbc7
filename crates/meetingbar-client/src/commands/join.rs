//! `meetingbar join`: open a meeting's conference link.

use std::sync::Arc;

use meetingbar_engine::{EngineError, EngineResult, LinkOpener};
use tracing::{debug, info};

use super::engine;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Opens links with the system's default handler.
pub fn browser_opener() -> Arc<dyn LinkOpener> {
    Arc::new(|url: &str| -> EngineResult<()> {
        debug!(url, "Opening link");
        open::that(url).map_err(|e| EngineError::open(format!("{url}: {e}")))
    })
}

/// Refreshes once and opens the requested meeting, or the current/next one.
pub async fn run(config: &ClientConfig, meeting_id: Option<&str>) -> ClientResult<()> {
    let engine = engine(config);
    engine.refresh_now().await;

    let snapshot = engine.current_state();
    let (meeting, link) = snapshot.join_link(meeting_id, engine.now())?;
    info!(title = %meeting.title, provider = link.kind.display_name(), "Joining meeting");
    println!("Joining {} ({})", meeting.title, link.kind.display_name());
    browser_opener().open(&link.url)?;
    Ok(())
}
