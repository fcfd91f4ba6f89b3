//! Role×action permission matrix with phase-dependent guards.
//!
//! `can_perform_action` answers the static question (may this role ever do
//! this), `validate_action` layers the current game phase on top. The
//! presentation layer uses `available_actions` to enable controls, but the
//! engine re-checks on every dispatch and never trusts the caller.

use crate::types::{Game, GamePhase, PlayerStatus};
use serde::{Deserialize, Serialize};

/// Everything a caller can ask the engine to do, including the
/// engine-internal countdown completion (`RevealRound`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    EnterBottles,
    FinalizeSetup,
    JoinGame,
    StartGame,
    SubmitTasting,
    ViewLeaderboard,
    CloseRound,
    UndoRound,
    RevealRound,
    ReopenRound,
    AdvanceRound,
    KickPlayer,
    RenamePlayer,
    SubmitGambit,
    UpdateGame,
    EndGame,
    DownloadResults,
}

impl ActionKind {
    pub const ALL: [ActionKind; 17] = [
        ActionKind::EnterBottles,
        ActionKind::FinalizeSetup,
        ActionKind::JoinGame,
        ActionKind::StartGame,
        ActionKind::SubmitTasting,
        ActionKind::ViewLeaderboard,
        ActionKind::CloseRound,
        ActionKind::UndoRound,
        ActionKind::RevealRound,
        ActionKind::ReopenRound,
        ActionKind::AdvanceRound,
        ActionKind::KickPlayer,
        ActionKind::RenamePlayer,
        ActionKind::SubmitGambit,
        ActionKind::UpdateGame,
        ActionKind::EndGame,
        ActionKind::DownloadResults,
    ];
}

/// Which role classes may ever perform an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub host: bool,
    pub player: bool,
    pub spectator: bool,
}

const HOST_ONLY: Permission = Permission { host: true, player: false, spectator: false };
const HOST_AND_PLAYER: Permission = Permission { host: true, player: true, spectator: false };
const EVERYONE: Permission = Permission { host: true, player: true, spectator: true };

pub fn permission_for(action: ActionKind) -> Permission {
    use ActionKind::*;
    match action {
        EnterBottles | FinalizeSetup | StartGame => HOST_ONLY,
        CloseRound | UndoRound | RevealRound | ReopenRound | AdvanceRound => HOST_ONLY,
        KickPlayer | RenamePlayer | UpdateGame | EndGame => HOST_ONLY,
        SubmitTasting | SubmitGambit => HOST_AND_PLAYER,
        JoinGame | ViewLeaderboard | DownloadResults => EVERYONE,
    }
}

/// Static matrix lookup. Kicked players fall back to the spectator row.
pub fn can_perform_action(action: ActionKind, status: &PlayerStatus, is_host: bool) -> bool {
    let permission = permission_for(action);
    if is_host {
        permission.host
    } else if *status == PlayerStatus::Active {
        permission.player
    } else {
        permission.spectator
    }
}

/// Matrix lookup plus phase guards. Returns a violation message, or None
/// if the action is currently legal for this role.
pub fn validate_action(
    action: ActionKind,
    status: &PlayerStatus,
    is_host: bool,
    game: &Game,
) -> Option<String> {
    if !can_perform_action(action, status, is_host) {
        return Some(format!("User cannot perform action: {:?}", action));
    }

    use ActionKind::*;
    match action {
        EnterBottles | FinalizeSetup => {
            if game.phase != GamePhase::Setup {
                return Some("Bottles can only be entered during the setup phase".to_string());
            }
        }
        JoinGame => {
            if game.phase != GamePhase::Lobby {
                return Some("Players can only join during the lobby phase".to_string());
            }
        }
        StartGame => {
            if game.phase != GamePhase::Lobby {
                return Some("Can only start game from lobby phase".to_string());
            }
        }
        SubmitTasting => {
            if game.phase == GamePhase::Reveal || game.phase == GamePhase::Gambit {
                return Some("Cannot submit tasting notes during reveal or gambit phases".to_string());
            }
            if !matches!(game.phase, GamePhase::InRound | GamePhase::Countdown) {
                return Some("Tasting notes can only be submitted while a round is open".to_string());
            }
        }
        CloseRound => {
            if game.phase != GamePhase::InRound {
                return Some("Can only close round during in_round phase".to_string());
            }
        }
        UndoRound | RevealRound => {
            if game.phase != GamePhase::Countdown {
                return Some("Round is not in its countdown window".to_string());
            }
        }
        ReopenRound => {
            if !matches!(game.phase, GamePhase::InRound | GamePhase::Countdown) {
                return Some("Can only reopen a round that is still open".to_string());
            }
            if game.round_in_play().is_some_and(|r| r.revealed) {
                return Some("Cannot reopen a revealed round".to_string());
            }
        }
        AdvanceRound => {
            if !matches!(game.phase, GamePhase::Lobby | GamePhase::Reveal | GamePhase::Gambit) {
                return Some("Cannot advance from the current phase".to_string());
            }
        }
        SubmitGambit => {
            if game.phase != GamePhase::Gambit {
                return Some("Gambits can only be submitted during the gambit phase".to_string());
            }
        }
        EndGame => {
            if game.phase == GamePhase::Setup || game.phase == GamePhase::Lobby {
                return Some("Cannot end game during setup or lobby phases".to_string());
            }
            if game.phase == GamePhase::Final {
                return Some("Game is already over".to_string());
            }
        }
        DownloadResults => {
            if game.phase != GamePhase::Final {
                return Some("Results can only be downloaded once the game is final".to_string());
            }
        }
        KickPlayer | RenamePlayer | UpdateGame | ViewLeaderboard => {}
    }

    None
}

/// The action set the current role may perform right now; what the
/// presentation layer uses to enable or disable controls.
pub fn available_actions(status: &PlayerStatus, is_host: bool, game: &Game) -> Vec<ActionKind> {
    ActionKind::ALL
        .into_iter()
        .filter(|action| validate_action(*action, status, is_host, game).is_none())
        .collect()
}

/// Guard shared by kick and rename: the target must exist, must not be the
/// host, and must not have a locked submission counted in the current round.
pub fn target_player_guard(game: &Game, target_id: &str) -> Option<String> {
    let target = match game.player(target_id) {
        Some(p) => p,
        None => return Some(format!("Player not found: {}", target_id)),
    };

    if target.is_host {
        return Some("The host cannot be kicked or renamed".to_string());
    }

    let locked = game
        .round_in_play()
        .and_then(|r| r.submission_for(target_id))
        .is_some_and(|s| s.locked);
    if locked {
        return Some("Player has a locked submission in the current round".to_string());
    }

    None
}
