//! The session engine: one authoritative game record, a permission layer
//! in front of it, and an append-only timeline behind it.
//!
//! The engine is synchronous and single-writer. Every action is validated,
//! applied to a draft copy of the game, and only committed together with
//! its timeline step; a rejected action has no observable effect.

mod game;
mod gambit;
mod permissions;
mod player;
mod scoring;
mod setup;
mod submission;
mod timeline;
mod validation;

#[cfg(test)]
pub(crate) mod testutil;

pub use game::GamePatch;
pub use gambit::{price_extremes, validate_gambit, GAMBIT_GUESS_POINTS};
pub use permissions::{
    available_actions, can_perform_action, permission_for, validate_action, ActionKind, Permission,
};
pub use scoring::score_round;
pub use timeline::{Timeline, TimelineStep};
pub use validation::{
    validate_bottle, validate_game, validate_player, validate_submission, MIN_NAME_CHARS,
    MIN_NOTE_CHARS,
};

use crate::types::*;
use serde::{Deserialize, Serialize};

pub type EngineResult<T> = Result<T, EngineError>;

/// Why an action was refused. Every variant leaves the prior game state
/// intact; there are no fatal errors in the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The caller's role or the current phase forbids the action
    #[error("{0}")]
    Permission(String),

    /// The payload is structurally invalid; nothing was committed
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    /// A referenced player, bottle or round does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Stable error code for the wire protocol
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Permission(_) => "PERMISSION_DENIED",
            EngineError::Validation(_) => "VALIDATION_FAILED",
            EngineError::NotFound { .. } => "NOT_FOUND",
        }
    }

    /// The individual violation messages, for re-rendering to the user
    pub fn violations(&self) -> Vec<String> {
        match self {
            EngineError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// A requested state change: one variant per action kind, each carrying
/// only the fields it needs, checked exhaustively at dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddBottle {
        label_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fun_name: Option<String>,
        price: u32,
    },
    FinalizeSetup,
    StartGame,
    SubmitTasting {
        player_id: PlayerId,
        round_index: usize,
        tasting_notes: Vec<TastingNote>,
        ranking: Vec<BottleId>,
    },
    CloseRound,
    UndoRound,
    RevealRound,
    ReopenRound {
        player_id: PlayerId,
    },
    AdvanceRound,
    KickPlayer {
        player_id: PlayerId,
    },
    RenamePlayer {
        player_id: PlayerId,
        new_name: String,
    },
    SubmitGambit {
        most_expensive: BottleId,
        least_expensive: BottleId,
        favorite: BottleId,
    },
    UpdateGame {
        game: GamePatch,
    },
    EndGame,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AddBottle { .. } => ActionKind::EnterBottles,
            Action::FinalizeSetup => ActionKind::FinalizeSetup,
            Action::StartGame => ActionKind::StartGame,
            Action::SubmitTasting { .. } => ActionKind::SubmitTasting,
            Action::CloseRound => ActionKind::CloseRound,
            Action::UndoRound => ActionKind::UndoRound,
            Action::RevealRound => ActionKind::RevealRound,
            Action::ReopenRound { .. } => ActionKind::ReopenRound,
            Action::AdvanceRound => ActionKind::AdvanceRound,
            Action::KickPlayer { .. } => ActionKind::KickPlayer,
            Action::RenamePlayer { .. } => ActionKind::RenamePlayer,
            Action::SubmitGambit { .. } => ActionKind::SubmitGambit,
            Action::UpdateGame { .. } => ActionKind::UpdateGame,
            Action::EndGame => ActionKind::EndGame,
        }
    }
}

/// Owner of the canonical game record and its audit timeline.
pub struct GameEngine {
    game: Game,
    timeline: Timeline,
}

impl GameEngine {
    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Apply one action on behalf of a player. Permission and phase guards
    /// run first (the presentation layer already filtered, but the engine
    /// does not trust it), then the handler mutates a draft which commits
    /// together with its timeline step or not at all.
    pub fn apply(&mut self, actor_id: &PlayerId, action: Action) -> EngineResult<&Game> {
        let actor = self
            .game
            .player(actor_id)
            .ok_or_else(|| EngineError::not_found("player", actor_id))?;
        let (actor_status, actor_is_host) = (actor.status.clone(), actor.is_host);
        let actor_id = actor.id.clone();

        let kind = action.kind();
        if let Some(reason) = permissions::validate_action(kind, &actor_status, actor_is_host, &self.game)
        {
            tracing::debug!("Rejected {:?} by {}: {}", kind, actor_id, reason);
            return Err(EngineError::Permission(reason));
        }

        let mut next = self.game.clone();
        match action {
            Action::AddBottle { label_name, fun_name, price } => {
                Self::add_bottle(&mut next, label_name, fun_name, price)?
            }
            Action::FinalizeSetup => Self::finalize_setup(&mut next)?,
            Action::StartGame => Self::start_game(&mut next)?,
            Action::SubmitTasting { player_id, round_index, tasting_notes, ranking } => {
                Self::submit_tasting(&mut next, &actor_id, &player_id, round_index, tasting_notes, ranking)?
            }
            Action::CloseRound => Self::close_round(&mut next)?,
            Action::UndoRound => Self::undo_round(&mut next)?,
            Action::RevealRound => Self::reveal_round(&mut next)?,
            Action::ReopenRound { player_id } => Self::reopen_round(&mut next, &player_id)?,
            Action::AdvanceRound => Self::advance_round(&mut next)?,
            Action::KickPlayer { player_id } => Self::kick_player(&mut next, &player_id)?,
            Action::RenamePlayer { player_id, new_name } => {
                Self::rename_player(&mut next, &player_id, new_name)?
            }
            Action::SubmitGambit { most_expensive, least_expensive, favorite } => {
                Self::submit_gambit(&mut next, &actor_id, most_expensive, least_expensive, favorite)?
            }
            Action::UpdateGame { game } => Self::update_game(&mut next, game)?,
            Action::EndGame => Self::end_game(&mut next)?,
        }

        let now = chrono::Utc::now().to_rfc3339();
        if let Some(actor) = next.player_mut(&actor_id) {
            actor.last_active = now.clone();
        }
        next.updated_at = now;

        self.game = next;
        self.timeline.record(kind, &self.game);
        Ok(&self.game)
    }

    /// Action set currently available to a player, for enabling controls.
    pub fn available_actions_for(&self, player_id: &PlayerId) -> Vec<ActionKind> {
        match self.game.player(player_id) {
            Some(p) => permissions::available_actions(&p.status, p.is_host, &self.game),
            None => Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn game_mut_for_tests(&mut self) -> &mut Game {
        &mut self.game
    }
}
