//! Pure structural validators. Each returns a list of human-readable
//! violations (empty = valid) and never mutates its input, so calling one
//! twice on the same data yields the same list.

use crate::types::{Bottle, Game, GameConfig, Player, Round, TastingNote};
use std::collections::HashSet;

/// Minimum length of a tasting note, in characters
pub const MIN_NOTE_CHARS: usize = 10;

/// Minimum length of a player display name, trimmed
pub const MIN_NAME_CHARS: usize = 2;

/// Whole-game structural check: table sizes match the finalized config,
/// labels are unique, and every bottle sits in exactly one round.
pub fn validate_game(game: &Game) -> Vec<String> {
    let config = &game.config;
    let mut errors = Vec::new();

    if config.total_bottles != config.rounds * config.bottles_per_round {
        errors.push(format!(
            "Config is inconsistent: {} rounds of {} bottles cannot use {} bottles",
            config.rounds, config.bottles_per_round, config.total_bottles
        ));
    }

    if game.players.len() != config.players {
        errors.push(format!(
            "Game must have exactly {} players, found {}",
            config.players,
            game.players.len()
        ));
    }

    if game.bottles.len() != config.total_bottles {
        errors.push(format!(
            "Game must have exactly {} bottles, found {}",
            config.total_bottles,
            game.bottles.len()
        ));
    }

    if game.rounds.len() != config.rounds {
        errors.push(format!(
            "Game must have exactly {} rounds, found {}",
            config.rounds,
            game.rounds.len()
        ));
    }

    if game.current_round < 1 || game.current_round > config.rounds {
        errors.push(format!(
            "Current round must be between 1 and {}, found {}",
            config.rounds, game.current_round
        ));
    }

    let hosts: Vec<&Player> = game.players.iter().filter(|p| p.is_host).collect();
    if hosts.len() != 1 || hosts[0].id != game.host_id {
        errors.push("Game must have exactly one host, matching its host id".to_string());
    }

    let ids: HashSet<&str> = game.bottles.iter().map(|b| b.id.as_str()).collect();
    if ids.len() != game.bottles.len() {
        errors.push("Bottles must have unique IDs".to_string());
    }

    let labels: HashSet<String> = game
        .bottles
        .iter()
        .map(|b| b.label_name.to_lowercase())
        .collect();
    if labels.len() != game.bottles.len() {
        errors.push("Bottles must have unique label names".to_string());
    }

    let mut assigned: HashSet<&str> = HashSet::new();
    for round in &game.rounds {
        if round.bottle_ids.len() != config.bottles_per_round {
            errors.push(format!(
                "Round {} must have exactly {} bottles",
                round.index, config.bottles_per_round
            ));
        }
        for id in &round.bottle_ids {
            assigned.insert(id.as_str());
        }
    }

    if assigned.len() != config.total_bottles || !assigned.is_subset(&ids) {
        errors.push(format!(
            "All {} bottles must be assigned to rounds",
            config.total_bottles
        ));
    }

    errors
}

pub fn validate_player(player: &Player) -> Vec<String> {
    let mut errors = Vec::new();

    if player.display_name.trim().chars().count() < MIN_NAME_CHARS {
        errors.push(format!(
            "Player name must be at least {} characters long",
            MIN_NAME_CHARS
        ));
    }

    errors
}

pub fn validate_bottle(bottle: &Bottle, config: &GameConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if bottle.label_name.trim().is_empty() {
        errors.push("Bottle must have a label name".to_string());
    }

    if bottle.round_index >= config.rounds {
        errors.push(format!(
            "Bottle round index must be below {}, found {}",
            config.rounds, bottle.round_index
        ));
    }

    errors
}

/// Validate a tasting submission against the round it is for: one note of
/// at least MIN_NOTE_CHARS per bottle poured, and a ranking that is a full
/// permutation of exactly that round's bottles.
pub fn validate_submission(
    tasting_notes: &[TastingNote],
    ranking: &[String],
    round: &Round,
) -> Vec<String> {
    let mut errors = Vec::new();
    let expected = round.bottle_ids.len();

    let round_bottles: HashSet<&str> = round.bottle_ids.iter().map(|id| id.as_str()).collect();
    let noted: HashSet<&str> = tasting_notes.iter().map(|n| n.bottle_id.as_str()).collect();

    if tasting_notes.len() != expected || noted.len() != expected || noted != round_bottles {
        errors.push(format!(
            "Submission must have exactly one tasting note per bottle ({} total)",
            expected
        ));
    }

    if tasting_notes
        .iter()
        .any(|n| n.note.trim().chars().count() < MIN_NOTE_CHARS)
    {
        errors.push(format!(
            "All tasting notes must be at least {} characters long",
            MIN_NOTE_CHARS
        ));
    }

    if ranking.len() != expected {
        errors.push(format!("Submission ranking must have exactly {} bottles", expected));
    } else {
        let ranked: HashSet<&str> = ranking.iter().map(|id| id.as_str()).collect();
        if ranked.len() != expected {
            errors.push("Submission ranking must not have duplicate bottles".to_string());
        } else if ranked != round_bottles {
            errors.push("Submission ranking contains bottles not in current round".to_string());
        }
    }

    errors
}
