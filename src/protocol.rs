use crate::analytics::GameMetrics;
use crate::engine::{Action, ActionKind, TimelineStep};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Host sets up a fresh game from the curated table
    CreateGame {
        host_name: String,
        players: usize,
        total_bottles: usize,
        rounds: usize,
    },
    /// Claim a player slot during the lobby
    Join {
        pin: String,
        display_name: String,
    },
    /// Any engine action, authenticated by session token
    Action {
        token: String,
        action: Action,
    },
    GetState,
    GetTimeline,
    GetLeaderboard,
    GetAvailableActions {
        token: String,
    },
    /// Host-only pull of the derived game metrics
    GetMetrics,
    /// Final results for export; records a download event
    DownloadResults {
        token: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        game: Game,
        server_now: String,
    },
    GameCreated {
        game: Game,
        host: PlayerToken,
    },
    Joined {
        player: PlayerToken,
        display_name: String,
        game: Game,
    },
    GameState {
        game: Game,
    },
    Phase {
        phase: GamePhase,
        current_round: usize,
        server_now: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        deadline: Option<String>,
    },
    Timeline {
        steps: Vec<TimelineStep>,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    AvailableActions {
        actions: Vec<ActionKind>,
    },
    FinalResults {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<LeaderboardEntry>,
        leaderboard: Vec<LeaderboardEntry>,
        gambits: Vec<GambitSummary>,
        /// Full bottle set, priciest first
        bottles_by_price: Vec<Bottle>,
    },
    Metrics {
        metrics: GameMetrics,
    },
    Error {
        code: String,
        msg: String,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        violations: Vec<String>,
    },
}

/// Slot id and session token handed out at join/create time; the only
/// place a token crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerToken {
    pub id: PlayerId,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: u32,
}

/// A settled gambit with names resolved for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GambitSummary {
    pub player_id: PlayerId,
    pub display_name: String,
    pub most_expensive: BottleId,
    pub least_expensive: BottleId,
    pub favorite: BottleId,
    pub points: u32,
}

impl GambitSummary {
    pub fn from_gambit(gambit: &Gambit, game: &Game) -> Self {
        Self {
            player_id: gambit.player_id.clone(),
            display_name: game
                .player(&gambit.player_id)
                .map(|p| p.display_name.clone())
                .unwrap_or_default(),
            most_expensive: gambit.most_expensive.clone(),
            least_expensive: gambit.least_expensive.clone(),
            favorite: gambit.favorite.clone(),
            points: gambit.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{
            "t": "action",
            "token": "ABCD2345",
            "action": { "type": "CLOSE_ROUND" }
        }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Action { token, action } => {
                assert_eq!(token, "ABCD2345");
                assert_eq!(action.kind(), ActionKind::CloseRound);
            }
            _ => panic!("Expected Action message"),
        }
    }

    #[test]
    fn test_submit_tasting_payload_round_trips() {
        let json = r#"{
            "t": "action",
            "token": "ABCD2345",
            "action": {
                "type": "SUBMIT_TASTING",
                "payload": {
                    "player_id": "p1",
                    "round_index": 0,
                    "tasting_notes": [{"bottle_id": "b1", "note": "bright acidity, green apple"}],
                    "ranking": ["b1"]
                }
            }
        }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Action { action, .. } => {
                assert_eq!(action.kind(), ActionKind::SubmitTasting);
            }
            _ => panic!("Expected Action message"),
        }
    }

    #[test]
    fn test_unknown_action_type_fails_to_parse() {
        let json = r#"{
            "t": "action",
            "token": "ABCD2345",
            "action": { "type": "TELEPORT_BOTTLES" }
        }"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_player_token_never_serialized_in_game() {
        let engine = crate::engine::GameEngine::new("Host", GameConfig::default());
        let json = serde_json::to_value(engine.game()).unwrap();
        let players = json["players"].as_array().unwrap();
        assert!(!players.is_empty());
        for player in players {
            assert!(player.get("token").is_none(), "token must not leak");
        }
    }
}
