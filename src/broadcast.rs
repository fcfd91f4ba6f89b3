//! Background countdown watcher.
//!
//! The countdown is server-authoritative: when the deadline stored on the
//! game record passes, this task drives the reveal transition whether or
//! not any client is still rendering a timer. A host undo that lands
//! before expiry simply means there is nothing due to fire.

use crate::state::AppState;
use crate::types::GamePhase;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Spawn the task that completes expired countdowns.
pub fn spawn_countdown_watcher(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            if !countdown_expired(&state).await {
                continue;
            }

            match state.reveal_due().await {
                Ok(game) => {
                    tracing::info!("Countdown expired, revealed round {}", game.current_round);
                }
                // The host undid the countdown between our check and the
                // apply; the engine's phase guard makes this a no-op.
                Err(e) => tracing::debug!("Countdown completion skipped: {}", e),
            }
        }
    });
}

async fn countdown_expired(state: &Arc<AppState>) -> bool {
    let engine = state.engine.read().await;
    let game = engine.game();

    if game.phase != GamePhase::Countdown {
        return false;
    }

    let Some(deadline) = game.phase_deadline.as_deref() else {
        tracing::warn!("Countdown phase without a deadline, completing immediately");
        return true;
    };

    match chrono::DateTime::parse_from_rfc3339(deadline) {
        Ok(deadline) => deadline.with_timezone(&chrono::Utc) <= chrono::Utc::now(),
        Err(e) => {
            tracing::warn!("Unparseable countdown deadline '{}': {}", deadline, e);
            true
        }
    }
}
