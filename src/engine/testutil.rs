//! Shared fixtures for engine tests: small games walked through the real
//! public API so every fixture state is reachable in production.

use super::{Action, GameEngine};
use crate::types::{Game, GameConfig, Round, TastingNote};

fn small_config() -> GameConfig {
    GameConfig {
        players: 4,
        rounds: 2,
        total_bottles: 4,
        bottles_per_round: 2,
        countdown_seconds: 10,
    }
}

/// Fresh game in the setup phase, no bottles entered yet.
pub fn setup_engine() -> GameEngine {
    GameEngine::new("Host", small_config())
}

/// Setup phase with the full bottle set entered, not yet finalized.
pub fn engine_with_bottles() -> GameEngine {
    let mut engine = setup_engine();
    let host = engine.game().host_id.clone();
    let total = engine.game().config.total_bottles;

    for i in 0..total {
        engine
            .apply(&host, Action::AddBottle {
                label_name: format!("Bottle {}", i + 1),
                fun_name: Some(format!("Mystery {}", i + 1)),
                price: 10 * (i as u32 + 1),
            })
            .expect("bottle entry");
    }
    engine
}

/// Lobby phase: setup finalized, PIN generated, no players joined yet.
pub fn lobby_engine() -> GameEngine {
    let mut engine = engine_with_bottles();
    let host = engine.game().host_id.clone();
    engine.apply(&host, Action::FinalizeSetup).expect("finalize");
    engine
}

/// First round open, every slot claimed.
pub fn started_engine() -> GameEngine {
    let mut engine = lobby_engine();
    let pin = engine.game().pin.clone();
    for name in ["Alice", "Bob", "Carol"] {
        engine.join_game(&pin, name).expect("join");
    }

    let host = engine.game().host_id.clone();
    engine.apply(&host, Action::StartGame).expect("start");
    engine
}

/// All rounds revealed, gambit phase open.
pub fn gambit_engine() -> GameEngine {
    let mut engine = started_engine();
    let host = engine.game().host_id.clone();
    let rounds = engine.game().rounds.len();

    for _ in 0..rounds {
        engine.apply(&host, Action::CloseRound).expect("close");
        engine.apply(&host, Action::RevealRound).expect("reveal");
        engine.apply(&host, Action::AdvanceRound).expect("advance");
    }
    engine
}

/// The first joined non-host player's id.
pub fn first_non_host(game: &Game) -> String {
    game.players
        .iter()
        .find(|p| !p.is_host)
        .expect("non-host player")
        .id
        .clone()
}

/// One sufficiently wordy note per bottle in the round.
pub fn notes_for(round: &Round) -> Vec<TastingNote> {
    round
        .bottle_ids
        .iter()
        .map(|id| TastingNote {
            bottle_id: id.clone(),
            note: "bold tannins, dark cherry, long finish".to_string(),
        })
        .collect()
}
