use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::services::presence_service::PresenceService;

/// Run one eviction pass. Returns the number of removed sessions, 0 on failure.
pub async fn sweep_once(presence: &PresenceService) -> u64 {
    match presence.evict_stale().await {
        Ok(n) => {
            if n > 0 {
                info!("Session sweeper evicted {} stale sessions", n);
            }
            n
        }
        Err(e) => {
            error!("Session sweeper failed: {}", e);
            0
        }
    }
}

/// Periodically delete sessions that have fallen out of the staleness window.
/// Only bounds storage growth; readers already ignore stale records.
pub fn spawn_session_sweeper(presence: PresenceService, every: Duration) -> JoinHandle<()> {
    info!("Session sweeper running every {:?}", every);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&presence).await;
        }
    })
}
