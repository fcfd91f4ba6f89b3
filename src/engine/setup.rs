//! Game creation and setup: bottle entry, the seeded round draw, and the
//! setup→lobby transition.

use super::{EngineError, EngineResult, GameEngine, Timeline};
use crate::auth;
use crate::engine::validation;
use crate::types::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Deterministic RNG derived from the game id, so the bottle draw can be
/// replayed from the game record alone.
fn seeded_rng(game_id: &str) -> StdRng {
    let seed: [u8; 32] = Sha256::digest(game_id.as_bytes()).into();
    StdRng::from_seed(seed)
}

impl GameEngine {
    /// Create a fresh game in the setup phase with every player slot
    /// pre-allocated. Slot 0 is the host; the remaining slots are claimed
    /// by players joining during the lobby.
    pub fn new(host_name: &str, config: GameConfig) -> Self {
        let now = chrono::Utc::now().to_rfc3339();

        let players: Vec<Player> = (0..config.players)
            .map(|i| Player {
                id: ulid::Ulid::new().to_string(),
                display_name: if i == 0 { host_name.to_string() } else { String::new() },
                score: 0,
                is_host: i == 0,
                status: PlayerStatus::Active,
                token: auth::generate_player_token(),
                created_at: now.clone(),
                last_active: now.clone(),
            })
            .collect();

        let rounds: Vec<Round> = (0..config.rounds)
            .map(|index| Round {
                index,
                bottle_ids: Vec::new(),
                submissions: Vec::new(),
                revealed: false,
            })
            .collect();

        let host_id = players[0].id.clone();
        let game = Game {
            id: ulid::Ulid::new().to_string(),
            phase: GamePhase::Setup,
            current_round: 1,
            config,
            bottles: Vec::new(),
            rounds,
            players,
            gambits: Vec::new(),
            pin: String::new(),
            host_id,
            phase_deadline: None,
            created_at: now.clone(),
            updated_at: now,
        };

        tracing::info!("Created game {} for {} players", game.id, game.config.players);

        Self {
            game,
            timeline: Timeline::new(),
        }
    }

    pub(crate) fn add_bottle(
        game: &mut Game,
        label_name: String,
        fun_name: Option<String>,
        price: u32,
    ) -> EngineResult<()> {
        if game.bottles.len() >= game.config.total_bottles {
            return Err(EngineError::Validation(vec![format!(
                "Maximum of {} bottles allowed",
                game.config.total_bottles
            )]));
        }

        let lowered = label_name.to_lowercase();
        if game.bottles.iter().any(|b| b.label_name.to_lowercase() == lowered) {
            return Err(EngineError::Validation(vec![
                "Label name must be unique".to_string(),
            ]));
        }

        let bottle = Bottle {
            id: ulid::Ulid::new().to_string(),
            label_name,
            fun_name,
            price,
            round_index: 0,
        };

        let errors = validation::validate_bottle(&bottle, &game.config);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        game.bottles.push(bottle);
        Ok(())
    }

    /// Validate the full bottle set, draw the pour order, generate the join
    /// PIN and open the lobby.
    pub(crate) fn finalize_setup(game: &mut Game) -> EngineResult<()> {
        if game.bottles.len() != game.config.total_bottles {
            return Err(EngineError::Validation(vec![format!(
                "Must have exactly {} bottles to finalize setup, found {}",
                game.config.total_bottles,
                game.bottles.len()
            )]));
        }

        // Duplicate prices would make the gambit extremes ambiguous, so
        // uniqueness is enforced here rather than at scoring time.
        let mut prices: Vec<u32> = game.bottles.iter().map(|b| b.price).collect();
        prices.sort_unstable();
        if prices.windows(2).any(|w| w[0] == w[1]) {
            return Err(EngineError::Validation(vec![
                "Bottle prices must be unique".to_string(),
            ]));
        }

        // Seeded draw: shuffle the bottles, then deal them out in blocks of
        // bottles_per_round.
        let mut rng = seeded_rng(&game.id);
        let mut drawn: Vec<usize> = (0..game.bottles.len()).collect();
        drawn.shuffle(&mut rng);

        let per_round = game.config.bottles_per_round;
        for round in &mut game.rounds {
            round.bottle_ids.clear();
        }
        for (position, bottle_idx) in drawn.into_iter().enumerate() {
            let round_index = position / per_round;
            game.bottles[bottle_idx].round_index = round_index;
            game.rounds[round_index].bottle_ids.push(game.bottles[bottle_idx].id.clone());
        }

        game.pin = auth::generate_game_pin();

        let errors = validation::validate_game(game);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        game.phase = GamePhase::Lobby;
        tracing::info!("Setup finalized for game {}, lobby open with PIN {}", game.id, game.pin);
        Ok(())
    }
}
