//! Phase transitions. The fixed lifecycle is
//! setup → lobby → in_round → countdown → reveal → (next round | gambit) → final,
//! with `final` also reachable early from any phase past the lobby.

use super::{EngineError, EngineResult, GameEngine};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Host-editable subset of the game record. Everything else is owned by
/// the engine and only changes through actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GameConfig>,
}

impl GameEngine {
    /// Open the first round: lobby → in_round.
    pub(crate) fn start_game(game: &mut Game) -> EngineResult<()> {
        game.current_round = 1;
        game.phase = GamePhase::InRound;
        tracing::info!("Game {} started, round 1 of {}", game.id, game.config.rounds);
        Ok(())
    }

    /// Close the current round into its cancelable countdown window.
    pub(crate) fn close_round(game: &mut Game) -> EngineResult<()> {
        let deadline = chrono::Utc::now()
            + chrono::Duration::seconds(game.config.countdown_seconds as i64);
        game.phase = GamePhase::Countdown;
        game.phase_deadline = Some(deadline.to_rfc3339());
        Ok(())
    }

    /// Cancel the countdown and return to the open round. Submissions
    /// already recorded are untouched.
    pub(crate) fn undo_round(game: &mut Game) -> EngineResult<()> {
        game.phase = GamePhase::InRound;
        game.phase_deadline = None;
        tracing::info!("Countdown canceled, round {} reopened", game.current_round);
        Ok(())
    }

    /// Countdown expiry: reveal the round's pour order and score it. The
    /// round composition is immutable from here on.
    pub(crate) fn reveal_round(game: &mut Game) -> EngineResult<()> {
        let round_index = game.current_round - 1;
        {
            let round = game
                .rounds
                .get_mut(round_index)
                .ok_or_else(|| EngineError::not_found("round", round_index.to_string()))?;
            round.revealed = true;
        }

        Self::apply_round_scores(game, round_index);

        game.phase = GamePhase::Reveal;
        game.phase_deadline = None;
        tracing::info!("Round {} revealed and scored", game.current_round);
        Ok(())
    }

    /// Move play forward: into the first round from the lobby, into the
    /// next round after a reveal, or into the final summary once gambits
    /// are settled.
    pub(crate) fn advance_round(game: &mut Game) -> EngineResult<()> {
        match game.phase {
            GamePhase::Lobby => Self::start_game(game),
            GamePhase::Reveal => {
                if game.current_round < game.rounds.len() {
                    game.current_round += 1;
                    game.phase = GamePhase::InRound;
                    tracing::info!("Advanced to round {}", game.current_round);
                } else {
                    game.phase = GamePhase::Gambit;
                    tracing::info!("All rounds played, gambit open");
                }
                Ok(())
            }
            GamePhase::Gambit => {
                Self::resolve_gambits(game);
                game.phase = GamePhase::Final;
                tracing::info!("Gambits settled, game {} is final", game.id);
                Ok(())
            }
            // Unreachable behind the phase guard
            _ => Err(EngineError::Permission(
                "Cannot advance from the current phase".to_string(),
            )),
        }
    }

    /// Host ends the game early; scores stand as they are.
    pub(crate) fn end_game(game: &mut Game) -> EngineResult<()> {
        game.phase = GamePhase::Final;
        game.phase_deadline = None;
        tracing::info!("Game {} ended by host", game.id);
        Ok(())
    }

    /// Apply a host patch. The table config may only change while the game
    /// is still being set up, and must stay within the curated setups.
    pub(crate) fn update_game(game: &mut Game, patch: GamePatch) -> EngineResult<()> {
        let Some(config) = patch.config else {
            return Ok(());
        };

        if game.phase != GamePhase::Setup {
            return Err(EngineError::Validation(vec![
                "The table setup can only change during the setup phase".to_string(),
            ]));
        }

        if setup_details(config.players, config.total_bottles, config.rounds).is_none() {
            return Err(EngineError::Validation(vec![format!(
                "No playable setup for {} players, {} bottles, {} rounds",
                config.players, config.total_bottles, config.rounds
            )]));
        }

        if game.bottles.len() > config.total_bottles {
            return Err(EngineError::Validation(vec![format!(
                "{} bottles already entered, new setup allows only {}",
                game.bottles.len(),
                config.total_bottles
            )]));
        }

        // Player slots and rounds are rebuilt to match the new table
        let now = chrono::Utc::now().to_rfc3339();
        let host = game.player(&game.host_id).cloned();
        let mut players: Vec<Player> = Vec::with_capacity(config.players);
        if let Some(host) = host {
            players.push(host);
        }
        while players.len() < config.players {
            players.push(Player {
                id: ulid::Ulid::new().to_string(),
                display_name: String::new(),
                score: 0,
                is_host: false,
                status: PlayerStatus::Active,
                token: crate::auth::generate_player_token(),
                created_at: now.clone(),
                last_active: now.clone(),
            });
        }

        game.players = players;
        game.rounds = (0..config.rounds)
            .map(|index| Round {
                index,
                bottle_ids: Vec::new(),
                submissions: Vec::new(),
                revealed: false,
            })
            .collect();
        game.config = config;
        Ok(())
    }
}
