//! Append-only audit log of applied transitions.
//!
//! Every step carries a summary derived from the committed game state, not
//! from the request payload, so the log stays self-consistent even when a
//! caller supplied a partial payload. Undo actions append a new forward
//! step; history is never rewritten.

use crate::engine::permissions::ActionKind;
use crate::types::{BottleId, Game, GamePhase, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineStep {
    pub seq: u64,
    pub timestamp: String,
    pub action: ActionKind,
    /// Phase the game was in after the action committed
    pub phase: GamePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottle_ids: Option<Vec<BottleId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<PlayerId, u32>>,
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step for an action that just committed, deriving the
    /// summary from the resulting game state.
    pub(crate) fn record(&mut self, action: ActionKind, game: &Game) {
        use ActionKind::*;

        let round_index = match action {
            StartGame | SubmitTasting | CloseRound | UndoRound | RevealRound | ReopenRound
            | AdvanceRound => Some(game.current_round),
            _ => None,
        };

        // The new round's pour order when play (re)enters a round
        let bottle_ids = match action {
            StartGame | AdvanceRound if game.phase == GamePhase::InRound => {
                game.round_in_play().map(|r| r.bottle_ids.clone())
            }
            _ => None,
        };

        // Snapshot scores whenever the action may have changed them
        let scores = if action == RevealRound || game.phase == GamePhase::Final {
            Some(
                game.players
                    .iter()
                    .map(|p| (p.id.clone(), p.score))
                    .collect(),
            )
        } else {
            None
        };

        self.steps.push(TimelineStep {
            seq: self.steps.len() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
            action,
            phase: game.phase.clone(),
            round_index,
            bottle_ids,
            scores,
        });
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil;

    #[test]
    fn test_seq_is_monotonic() {
        let engine = testutil::started_engine();
        let steps = engine.timeline().steps();
        assert!(!steps.is_empty());
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.seq, i as u64);
        }
    }

    #[test]
    fn test_round_entry_records_pour_order() {
        let engine = testutil::started_engine();
        let steps = engine.timeline().steps();

        let start = steps
            .iter()
            .find(|s| s.action == ActionKind::StartGame)
            .expect("start step");
        assert_eq!(start.round_index, Some(1));
        let bottles = start.bottle_ids.as_ref().expect("pour order");
        assert_eq!(bottles.len(), engine.game().config.bottles_per_round);
    }

    #[test]
    fn test_undo_appends_instead_of_rewriting() {
        let mut engine = testutil::started_engine();
        let host = engine.game().host_id.clone();

        engine.apply(&host, crate::engine::Action::CloseRound).unwrap();
        let len_after_close = engine.timeline().len();

        engine.apply(&host, crate::engine::Action::UndoRound).unwrap();
        assert_eq!(engine.timeline().len(), len_after_close + 1);

        let last = engine.timeline().steps().last().unwrap();
        assert_eq!(last.action, ActionKind::UndoRound);
        assert_eq!(last.phase, crate::types::GamePhase::InRound);
    }

    #[test]
    fn test_reveal_snapshots_scores() {
        let mut engine = testutil::started_engine();
        let host = engine.game().host_id.clone();

        engine.apply(&host, crate::engine::Action::CloseRound).unwrap();
        engine.apply(&host, crate::engine::Action::RevealRound).unwrap();

        let last = engine.timeline().steps().last().unwrap();
        assert_eq!(last.action, ActionKind::RevealRound);
        let scores = last.scores.as_ref().expect("score snapshot");
        assert_eq!(scores.len(), engine.game().players.len());
    }
}
