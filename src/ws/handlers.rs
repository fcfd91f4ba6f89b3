//! WebSocket message dispatch.
//!
//! Thin glue between the wire protocol and the engine: resolve the session
//! token, call into AppState, and map engine errors onto error replies.
//! All game rules live behind the engine boundary.

use crate::engine::{price_extremes, EngineError};
use crate::protocol::{ClientMessage, GambitSummary, PlayerToken, ServerMessage};
use crate::state::AppState;
use crate::types::GamePhase;
use std::sync::Arc;

fn error_reply(err: EngineError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        msg: err.to_string(),
        violations: err.violations(),
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(msg: ClientMessage, state: &Arc<AppState>) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateGame { host_name, players, total_bottles, rounds } => {
            match state.create_game(&host_name, players, total_bottles, rounds).await {
                Ok((game, host)) => Some(ServerMessage::GameCreated { game, host }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::Join { pin, display_name } => {
            match state.join(&pin, &display_name).await {
                Ok(player) => Some(ServerMessage::Joined {
                    player: PlayerToken { id: player.id.clone(), token: player.token.clone() },
                    display_name: player.display_name,
                    game: state.snapshot().await,
                }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::Action { token, action } => match state.apply(&token, action).await {
            Ok(game) => Some(ServerMessage::GameState { game }),
            Err(e) => Some(error_reply(e)),
        },

        ClientMessage::GetState => Some(ServerMessage::GameState {
            game: state.snapshot().await,
        }),

        ClientMessage::GetTimeline => Some(ServerMessage::Timeline {
            steps: state.timeline().await,
        }),

        ClientMessage::GetLeaderboard => Some(ServerMessage::Leaderboard {
            entries: state.leaderboard().await,
        }),

        ClientMessage::GetAvailableActions { token } => {
            match state.available_actions(&token).await {
                Ok(actions) => Some(ServerMessage::AvailableActions { actions }),
                Err(e) => Some(error_reply(e)),
            }
        }

        ClientMessage::GetMetrics => Some(ServerMessage::Metrics {
            metrics: state.metrics().await,
        }),

        ClientMessage::DownloadResults { token } => handle_download(state, &token).await,
    }
}

/// Assemble the read-only final summary and record the download.
async fn handle_download(state: &Arc<AppState>, token: &str) -> Option<ServerMessage> {
    let player = match state.player_by_token(token).await {
        Some(p) => p,
        None => {
            return Some(error_reply(EngineError::Permission(
                "Invalid session token".to_string(),
            )))
        }
    };

    let game = state.snapshot().await;
    if game.phase != GamePhase::Final {
        return Some(error_reply(EngineError::Permission(
            "Results can only be downloaded once the game is final".to_string(),
        )));
    }

    let leaderboard = state.leaderboard().await;
    let gambits = game
        .gambits
        .iter()
        .map(|g| GambitSummary::from_gambit(g, &game))
        .collect();

    let mut bottles_by_price = game.bottles.clone();
    bottles_by_price.sort_by(|a, b| b.price.cmp(&a.price));

    // Surface which bottle actually topped and bottomed the list in logs;
    // the payload carries the full sorted set.
    if let Some((cheapest, priciest)) = price_extremes(&game.bottles) {
        tracing::debug!(
            "Results downloaded: priciest {} / cheapest {}",
            priciest.label_name,
            cheapest.label_name
        );
    }

    state.track_download(&player.id).await;

    Some(ServerMessage::FinalResults {
        winner: leaderboard.first().cloned(),
        leaderboard,
        gambits,
        bottles_by_price,
    })
}
