//! Periodic cleanup of finished sessions and stale checkpoints

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Background task that reaps finished sessions every `period`
pub async fn session_reaper_task(state: Arc<AppState>, period: Duration) {
    info!("Starting session reaper task");

    let mut interval = interval(period);

    loop {
        interval.tick().await;

        match state.reap() {
            Ok(0) => {}
            Ok(reaped) => debug!("Reaped {} finished sessions", reaped),
            Err(e) => warn!("Failed to reap sessions: {}", e),
        }
    }
}
