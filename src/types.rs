use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;
pub type PlayerId = String;
pub type BottleId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Setup,
    Lobby,
    InRound,
    Countdown,
    Reveal,
    Gambit,
    Final,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Active,
    Kicked,
    Spectator,
}

/// A playable table size: how many players, bottles and rounds fit together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TableSetup {
    pub players: usize,
    pub rounds: usize,
    pub total_bottles: usize,
    pub bottles_per_round: usize,
    pub per_person_load: f64,
}

/// Curated combinations that keep the pour per person reasonable.
pub const TABLE_SETUPS: &[TableSetup] = &[
    TableSetup { players: 22, rounds: 5, total_bottles: 20, bottles_per_round: 4, per_person_load: 0.91 },
    TableSetup { players: 20, rounds: 5, total_bottles: 20, bottles_per_round: 4, per_person_load: 1.00 },
    TableSetup { players: 20, rounds: 4, total_bottles: 16, bottles_per_round: 4, per_person_load: 0.80 },
    TableSetup { players: 20, rounds: 5, total_bottles: 15, bottles_per_round: 3, per_person_load: 0.75 },
    TableSetup { players: 20, rounds: 4, total_bottles: 12, bottles_per_round: 3, per_person_load: 0.60 },
    TableSetup { players: 20, rounds: 3, total_bottles: 12, bottles_per_round: 4, per_person_load: 0.60 },
    TableSetup { players: 20, rounds: 3, total_bottles: 9, bottles_per_round: 3, per_person_load: 0.45 },
    TableSetup { players: 18, rounds: 4, total_bottles: 16, bottles_per_round: 4, per_person_load: 0.89 },
    TableSetup { players: 16, rounds: 4, total_bottles: 16, bottles_per_round: 4, per_person_load: 1.00 },
    TableSetup { players: 16, rounds: 5, total_bottles: 15, bottles_per_round: 3, per_person_load: 0.94 },
    TableSetup { players: 16, rounds: 4, total_bottles: 12, bottles_per_round: 3, per_person_load: 0.75 },
    TableSetup { players: 16, rounds: 3, total_bottles: 12, bottles_per_round: 4, per_person_load: 0.75 },
    TableSetup { players: 16, rounds: 3, total_bottles: 9, bottles_per_round: 3, per_person_load: 0.56 },
    TableSetup { players: 14, rounds: 4, total_bottles: 12, bottles_per_round: 3, per_person_load: 0.86 },
    TableSetup { players: 14, rounds: 3, total_bottles: 12, bottles_per_round: 4, per_person_load: 0.86 },
    TableSetup { players: 12, rounds: 3, total_bottles: 12, bottles_per_round: 4, per_person_load: 1.00 },
    TableSetup { players: 12, rounds: 4, total_bottles: 12, bottles_per_round: 3, per_person_load: 1.00 },
    TableSetup { players: 12, rounds: 3, total_bottles: 9, bottles_per_round: 3, per_person_load: 0.75 },
    TableSetup { players: 10, rounds: 3, total_bottles: 9, bottles_per_round: 3, per_person_load: 0.90 },
];

/// Unique player counts for the setup dropdown
pub fn player_options() -> Vec<usize> {
    let mut counts: Vec<usize> = TABLE_SETUPS.iter().map(|s| s.players).collect();
    counts.sort_unstable();
    counts.dedup();
    counts
}

/// Valid bottle counts for a given player count
pub fn bottle_options(players: usize) -> Vec<usize> {
    let mut counts: Vec<usize> = TABLE_SETUPS
        .iter()
        .filter(|s| s.players == players)
        .map(|s| s.total_bottles)
        .collect();
    counts.sort_unstable();
    counts.dedup();
    counts
}

/// Round choices for a given player and bottle count, sorted by round count
pub fn round_options(players: usize, total_bottles: usize) -> Vec<&'static TableSetup> {
    let mut options: Vec<&TableSetup> = TABLE_SETUPS
        .iter()
        .filter(|s| s.players == players && s.total_bottles == total_bottles)
        .collect();
    options.sort_by_key(|s| s.rounds);
    options
}

/// Full setup details for an exact (players, bottles, rounds) pick
pub fn setup_details(players: usize, total_bottles: usize, rounds: usize) -> Option<&'static TableSetup> {
    TABLE_SETUPS
        .iter()
        .find(|s| s.players == players && s.total_bottles == total_bottles && s.rounds == rounds)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub players: usize,
    pub rounds: usize,
    pub total_bottles: usize,
    pub bottles_per_round: usize,
    /// Length of the undo window between closing a round and revealing it
    pub countdown_seconds: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: 20,
            rounds: 5,
            total_bottles: 20,
            bottles_per_round: 4,
            countdown_seconds: default_countdown_seconds(),
        }
    }
}

impl GameConfig {
    /// Build a config from the curated table, or None if the combination
    /// is not a playable setup.
    pub fn for_table(players: usize, total_bottles: usize, rounds: usize) -> Option<Self> {
        setup_details(players, total_bottles, rounds).map(|s| Self {
            players: s.players,
            rounds: s.rounds,
            total_bottles: s.total_bottles,
            bottles_per_round: s.bottles_per_round,
            countdown_seconds: default_countdown_seconds(),
        })
    }
}

/// COUNTDOWN_SECONDS env override, defaulting to 10
fn default_countdown_seconds() -> u64 {
    match std::env::var("COUNTDOWN_SECONDS") {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid COUNTDOWN_SECONDS value '{}', using 10", v);
            10
        }),
        Err(_) => 10,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bottle {
    pub id: BottleId,
    /// Label name as printed on the bottle, unique per game (case-insensitive)
    pub label_name: String,
    /// Optional display alias shown to players instead of the label
    pub fun_name: Option<String>,
    pub price: u32,
    /// Which round this bottle is poured in (assigned at setup finalization)
    pub round_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TastingNote {
    pub bottle_id: BottleId,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub player_id: PlayerId,
    pub round_index: usize,
    pub tasting_notes: Vec<TastingNote>,
    /// Full ranking of the round's bottles, best guess first
    pub ranking: Vec<BottleId>,
    pub locked: bool,
    pub points: u32,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub index: usize,
    /// Canonical pour order, also the "correct" ranking players guess against
    pub bottle_ids: Vec<BottleId>,
    pub submissions: Vec<Submission>,
    pub revealed: bool,
}

impl Round {
    pub fn submission_for(&self, player_id: &str) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.player_id == player_id)
    }

    pub fn submission_for_mut(&mut self, player_id: &str) -> Option<&mut Submission> {
        self.submissions.iter_mut().find(|s| s.player_id == player_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub score: u32,
    pub is_host: bool,
    pub status: PlayerStatus,
    /// Session token, never serialized to clients; handed out at join time
    #[serde(skip_serializing, default)]
    pub token: String,
    pub created_at: String,
    pub last_active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gambit {
    pub player_id: PlayerId,
    pub most_expensive: BottleId,
    pub least_expensive: BottleId,
    pub favorite: BottleId,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub phase: GamePhase,
    /// 1-based index of the round currently in play
    pub current_round: usize,
    pub config: GameConfig,
    pub bottles: Vec<Bottle>,
    pub rounds: Vec<Round>,
    /// Players in join order; exactly one has is_host set
    pub players: Vec<Player>,
    pub gambits: Vec<Gambit>,
    /// 4-digit join PIN, generated when setup is finalized
    pub pin: String,
    pub host_id: PlayerId,
    /// Countdown expiry as RFC3339, set while phase is COUNTDOWN
    pub phase_deadline: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Game {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn bottle(&self, id: &str) -> Option<&Bottle> {
        self.bottles.iter().find(|b| b.id == id)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.status == PlayerStatus::Active)
    }

    /// The round addressed by current_round, if rounds exist
    pub fn round_in_play(&self) -> Option<&Round> {
        self.rounds.get(self.current_round.wrapping_sub(1))
    }

    pub fn round_in_play_mut(&mut self) -> Option<&mut Round> {
        let idx = self.current_round.wrapping_sub(1);
        self.rounds.get_mut(idx)
    }
}
