use super::{EngineError, EngineResult, GameEngine};
use crate::auth;
use crate::engine::permissions::{self, ActionKind};
use crate::engine::validation;
use crate::protocol::LeaderboardEntry;
use crate::types::*;

impl GameEngine {
    /// Claim a player slot during the lobby. The PIN gates entry; a fresh
    /// session token is issued and returned with the claimed slot.
    pub fn join_game(&mut self, pin: &str, display_name: &str) -> EngineResult<Player> {
        if self.game.phase != GamePhase::Lobby {
            return Err(EngineError::Permission(
                "Players can only join during the lobby phase".to_string(),
            ));
        }

        if !auth::validate_game_pin(&self.game, pin) {
            return Err(EngineError::Permission("Invalid game PIN".to_string()));
        }

        let trimmed = display_name.trim();
        if trimmed.chars().count() < validation::MIN_NAME_CHARS {
            return Err(EngineError::Validation(vec![format!(
                "Player name must be at least {} characters long",
                validation::MIN_NAME_CHARS
            )]));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let slot = self
            .game
            .players
            .iter_mut()
            .find(|p| p.status == PlayerStatus::Active && p.display_name.is_empty())
            .ok_or_else(|| EngineError::Validation(vec!["No available player slots".to_string()]))?;

        slot.display_name = trimmed.to_string();
        slot.token = auth::generate_player_token();
        slot.last_active = now.clone();
        let player = slot.clone();

        self.game.updated_at = now;
        self.timeline.record(ActionKind::JoinGame, &self.game);

        tracing::info!("Player {} joined game {}", player.display_name, self.game.id);
        Ok(player)
    }

    pub(crate) fn kick_player(game: &mut Game, target_id: &PlayerId) -> EngineResult<()> {
        if game.player(target_id).is_none() {
            return Err(EngineError::not_found("player", target_id));
        }
        if let Some(reason) = permissions::target_player_guard(game, target_id) {
            return Err(EngineError::Permission(reason));
        }

        if let Some(player) = game.player_mut(target_id) {
            player.status = PlayerStatus::Kicked;
        }
        tracing::info!("Kicked player {}", target_id);
        Ok(())
    }

    pub(crate) fn rename_player(
        game: &mut Game,
        target_id: &PlayerId,
        new_name: String,
    ) -> EngineResult<()> {
        if game.player(target_id).is_none() {
            return Err(EngineError::not_found("player", target_id));
        }
        if let Some(reason) = permissions::target_player_guard(game, target_id) {
            return Err(EngineError::Permission(reason));
        }

        let trimmed = new_name.trim();
        if trimmed.chars().count() < validation::MIN_NAME_CHARS {
            return Err(EngineError::Validation(vec![format!(
                "Player name must be at least {} characters long",
                validation::MIN_NAME_CHARS
            )]));
        }

        if let Some(player) = game.player_mut(target_id) {
            player.display_name = trimmed.to_string();
        }
        Ok(())
    }

    /// Earliest-joined active non-host player, the candidate to take over
    /// if the host drops out. Join order is player list order.
    pub fn host_successor(&self) -> Option<PlayerId> {
        self.game
            .players
            .iter()
            .find(|p| p.status == PlayerStatus::Active && !p.is_host && !p.display_name.is_empty())
            .map(|p| p.id.clone())
    }

    /// Active players by score, highest first. Ties keep join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .game
            .active_players()
            .map(|p| LeaderboardEntry {
                player_id: p.id.clone(),
                display_name: p.display_name.clone(),
                score: p.score,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }
}
