//! Round scoring: strict positional agreement between a player's ranking
//! and the round's canonical pour order.

use super::GameEngine;
use crate::types::{BottleId, Game, PlayerStatus};

/// One point per index where the guess matches the canonical order.
/// Bounded by the number of bottles in the round.
pub fn score_round(correct_order: &[BottleId], ranking: &[BottleId]) -> u32 {
    correct_order
        .iter()
        .zip(ranking.iter())
        .filter(|(correct, guessed)| correct == guessed)
        .count() as u32
}

impl GameEngine {
    /// Score every submission of a round and credit active players.
    ///
    /// Points accumulate onto cumulative scores rather than replacing them,
    /// so this must run exactly once per round (the reveal transition is the
    /// only caller). The submission keeps its computed points even if the
    /// player is later kicked.
    pub(crate) fn apply_round_scores(game: &mut Game, round_index: usize) {
        let round = match game.rounds.get_mut(round_index) {
            Some(r) => r,
            None => return,
        };
        let correct_order = round.bottle_ids.clone();

        let mut credits = Vec::with_capacity(round.submissions.len());
        for submission in &mut round.submissions {
            let points = score_round(&correct_order, &submission.ranking);
            submission.points = points;
            credits.push((submission.player_id.clone(), points));
        }

        for (player_id, points) in credits {
            if let Some(player) = game.player_mut(&player_id) {
                if player.status == PlayerStatus::Active {
                    player.score += points;
                }
            }
        }
    }
}
