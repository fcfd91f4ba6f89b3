//! Shared application state: the engine behind a single write lock (the
//! per-game serialization point actions funnel through) plus the
//! process-owned analytics service and the broadcast channel.

use crate::analytics::{Analytics, EventKind, GameMetrics};
use crate::auth;
use crate::engine::{Action, ActionKind, EngineError, EngineResult, GameEngine, TimelineStep};
use crate::protocol::{LeaderboardEntry, PlayerToken, ServerMessage};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<GameEngine>>,
    pub analytics: Arc<RwLock<Analytics>>,
    /// Broadcast channel for pushing state updates to all clients
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            engine: Arc::new(RwLock::new(GameEngine::new("Host", GameConfig::default()))),
            analytics: Arc::new(RwLock::new(Analytics::new())),
            broadcast: tx,
        }
    }

    /// Replace the game with a freshly configured one. Returns the new
    /// record and the host's session credentials.
    pub async fn create_game(
        &self,
        host_name: &str,
        players: usize,
        total_bottles: usize,
        rounds: usize,
    ) -> EngineResult<(Game, PlayerToken)> {
        let config = GameConfig::for_table(players, total_bottles, rounds).ok_or_else(|| {
            EngineError::Validation(vec![format!(
                "No playable setup for {} players, {} bottles, {} rounds",
                players, total_bottles, rounds
            )])
        })?;

        let mut engine = self.engine.write().await;
        *engine = GameEngine::new(host_name, config);

        let game = engine.game().clone();
        let host = engine
            .game()
            .player(&game.host_id)
            .map(|p| PlayerToken { id: p.id.clone(), token: p.token.clone() })
            .ok_or_else(|| EngineError::not_found("player", game.host_id.clone()))?;
        drop(engine);

        self.broadcast_state(&game);
        Ok((game, host))
    }

    pub async fn snapshot(&self) -> Game {
        self.engine.read().await.game().clone()
    }

    pub async fn timeline(&self) -> Vec<TimelineStep> {
        self.engine.read().await.timeline().steps().to_vec()
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.engine.read().await.leaderboard()
    }

    pub async fn metrics(&self) -> GameMetrics {
        let game_id = { self.engine.read().await.game().id.clone() };
        self.analytics.read().await.metrics(&game_id)
    }

    /// Resolve a session token to its player, if any.
    pub async fn player_by_token(&self, token: &str) -> Option<Player> {
        let engine = self.engine.read().await;
        engine
            .game()
            .players
            .iter()
            .find(|p| auth::validate_player_token(p, token))
            .cloned()
    }

    pub async fn available_actions(&self, token: &str) -> EngineResult<Vec<ActionKind>> {
        let player = self
            .player_by_token(token)
            .await
            .ok_or_else(|| EngineError::Permission("Invalid session token".to_string()))?;
        Ok(self.engine.read().await.available_actions_for(&player.id))
    }

    /// Claim a player slot and announce the updated lobby.
    pub async fn join(&self, pin: &str, display_name: &str) -> EngineResult<Player> {
        let mut engine = self.engine.write().await;
        let player = engine.join_game(pin, display_name)?;
        let game = engine.game().clone();
        drop(engine);

        self.broadcast_state(&game);
        Ok(player)
    }

    /// Apply an action authenticated by session token.
    pub async fn apply(&self, token: &str, action: Action) -> EngineResult<Game> {
        let player = self
            .player_by_token(token)
            .await
            .ok_or_else(|| EngineError::Permission("Invalid session token".to_string()))?;
        self.apply_for(&player.id, action).await
    }

    /// Apply an action on behalf of a known player id. Also the entry
    /// point for the countdown watcher acting as the host.
    pub async fn apply_for(&self, actor_id: &PlayerId, action: Action) -> EngineResult<Game> {
        let kind = action.kind();

        let mut engine = self.engine.write().await;
        let phase_before = engine.game().phase.clone();
        let game = engine.apply(actor_id, action)?.clone();
        drop(engine);

        self.track(kind, &phase_before, &game, actor_id).await;
        self.broadcast_state(&game);
        Ok(game)
    }

    /// Reveal the current round once its countdown deadline has passed.
    pub async fn reveal_due(&self) -> EngineResult<Game> {
        let host_id = { self.engine.read().await.game().host_id.clone() };
        self.apply_for(&host_id, Action::RevealRound).await
    }

    /// Record a final-results download for the calling player.
    pub async fn track_download(&self, player_id: &PlayerId) {
        let game_id = { self.engine.read().await.game().id.clone() };
        self.analytics
            .write()
            .await
            .track(EventKind::FinalDownload, &game_id, player_id, HashMap::new());
    }

    async fn track(
        &self,
        kind: ActionKind,
        phase_before: &GamePhase,
        game: &Game,
        actor_id: &PlayerId,
    ) {
        let mut analytics = self.analytics.write().await;

        match kind {
            ActionKind::StartGame => {
                analytics.track(EventKind::GameStart, &game.id, actor_id, HashMap::new());
            }
            ActionKind::AdvanceRound if *phase_before == GamePhase::Lobby => {
                analytics.track(EventKind::GameStart, &game.id, actor_id, HashMap::new());
            }
            ActionKind::SubmitTasting => {
                let note_length = game
                    .round_in_play()
                    .and_then(|r| r.submissions.last())
                    .filter(|s| !s.tasting_notes.is_empty())
                    .map(|s| {
                        s.tasting_notes.iter().map(|n| n.note.chars().count()).sum::<usize>() as f64
                            / s.tasting_notes.len() as f64
                    })
                    .unwrap_or(0.0);
                let metadata = HashMap::from([("note_length".to_string(), note_length)]);
                analytics.track(EventKind::SubmitRound, &game.id, actor_id, metadata);
            }
            ActionKind::RevealRound => {
                if let Some(round) = game.round_in_play() {
                    for submission in &round.submissions {
                        let metadata =
                            HashMap::from([("score".to_string(), submission.points as f64)]);
                        analytics.track(
                            EventKind::RoundReveal,
                            &game.id,
                            &submission.player_id,
                            metadata,
                        );
                    }
                }
            }
            _ => {}
        }

        if game.phase == GamePhase::Gambit && *phase_before != GamePhase::Gambit {
            analytics.track(EventKind::GambitStart, &game.id, actor_id, HashMap::new());
        }
    }

    /// Push the updated record and a phase summary to all clients. Send
    /// errors just mean nobody is listening.
    fn broadcast_state(&self, game: &Game) {
        let _ = self.broadcast.send(ServerMessage::GameState { game: game.clone() });
        let _ = self.broadcast.send(ServerMessage::Phase {
            phase: game.phase.clone(),
            current_round: game.current_round,
            server_now: chrono::Utc::now().to_rfc3339(),
            deadline: game.phase_deadline.clone(),
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn lobby_state() -> (AppState, PlayerToken) {
        let state = AppState::new();
        let (_, host) = state.create_game("Dana", 10, 9, 3).await.unwrap();

        for i in 0..9 {
            state
                .apply(&host.token, Action::AddBottle {
                    label_name: format!("Bottle {}", i + 1),
                    fun_name: None,
                    price: 10 + i as u32,
                })
                .await
                .unwrap();
        }
        state.apply(&host.token, Action::FinalizeSetup).await.unwrap();
        (state, host)
    }

    #[tokio::test]
    async fn test_create_game_uses_curated_table() {
        let state = AppState::new();
        let (game, host) = state.create_game("Dana", 20, 20, 5).await.unwrap();

        assert_eq!(game.phase, GamePhase::Setup);
        assert_eq!(game.config.bottles_per_round, 4);
        assert_eq!(game.players.len(), 20);
        assert!(!host.token.is_empty());

        let err = state.create_game("Dana", 7, 20, 5).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_apply_rejects_unknown_token() {
        let state = AppState::new();
        let err = state.apply("NOPE", Action::CloseRound).await.unwrap_err();
        assert_eq!(err.code(), "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn test_join_and_token_resolution() {
        let (state, _host) = lobby_state().await;
        let pin = state.snapshot().await.pin;

        let player = state.join(&pin, "Alice").await.unwrap();
        let resolved = state.player_by_token(&player.token).await.unwrap();
        assert_eq!(resolved.id, player.id);
        assert_eq!(resolved.display_name, "Alice");
    }

    #[tokio::test]
    async fn test_full_round_through_state_layer() {
        let (state, host) = lobby_state().await;
        let pin = state.snapshot().await.pin;
        let player = state.join(&pin, "Alice").await.unwrap();

        state.apply(&host.token, Action::StartGame).await.unwrap();

        let round = state.snapshot().await.round_in_play().unwrap().clone();
        let notes: Vec<TastingNote> = round
            .bottle_ids
            .iter()
            .map(|id| TastingNote {
                bottle_id: id.clone(),
                note: "stone fruit, touch of oak, lively".to_string(),
            })
            .collect();

        state
            .apply(&player.token, Action::SubmitTasting {
                player_id: player.id.clone(),
                round_index: 0,
                tasting_notes: notes,
                ranking: round.bottle_ids.clone(),
            })
            .await
            .unwrap();

        state.apply(&host.token, Action::CloseRound).await.unwrap();
        let game = state.apply(&host.token, Action::RevealRound).await.unwrap();
        assert_eq!(game.phase, GamePhase::Reveal);
        assert_eq!(
            game.player(&player.id).unwrap().score,
            game.config.bottles_per_round as u32
        );

        // The reveal fed the score distribution
        let metrics = state.metrics().await;
        assert_eq!(
            metrics.score_distribution.get(&(game.config.bottles_per_round as u32)),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_available_actions_by_token() {
        let (state, host) = lobby_state().await;
        let actions = state.available_actions(&host.token).await.unwrap();
        assert!(actions.contains(&ActionKind::StartGame));
        assert!(!actions.contains(&ActionKind::CloseRound));

        assert!(state.available_actions("BAD").await.is_err());
    }

    #[tokio::test]
    async fn test_reveal_due_acts_as_host() {
        let (state, host) = lobby_state().await;
        state.apply(&host.token, Action::StartGame).await.unwrap();
        state.apply(&host.token, Action::CloseRound).await.unwrap();

        let game = state.reveal_due().await.unwrap();
        assert_eq!(game.phase, GamePhase::Reveal);

        // Not in countdown anymore: a second expiry is refused
        assert!(state.reveal_due().await.is_err());
    }
}
