//! In-process event tracking and derived game metrics.
//!
//! Explicitly constructed and owned by the host process; nothing here is
//! global. Events never leave the process, they only feed the metrics the
//! host can pull up after a game.

use crate::types::{GameId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GameStart,
    SubmitRound,
    RoundReveal,
    GambitStart,
    FinalDownload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    pub timestamp: String,
    pub game_id: GameId,
    pub player_id: PlayerId,
    /// Numeric measurements attached to the event ("duration_secs",
    /// "note_length", "score", ...)
    pub metadata: HashMap<String, f64>,
}

/// Aggregates derived from a game's event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameMetrics {
    pub avg_submission_secs: f64,
    pub avg_note_length: f64,
    /// Round score -> number of submissions that scored it
    pub score_distribution: BTreeMap<u32, u32>,
}

#[derive(Debug, Default)]
pub struct Analytics {
    events: Vec<AnalyticsEvent>,
}

impl Analytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(
        &mut self,
        kind: EventKind,
        game_id: &GameId,
        player_id: &PlayerId,
        metadata: HashMap<String, f64>,
    ) {
        tracing::debug!("Analytics event {:?} for game {}", kind, game_id);
        self.events.push(AnalyticsEvent {
            kind,
            timestamp: chrono::Utc::now().to_rfc3339(),
            game_id: game_id.clone(),
            player_id: player_id.clone(),
            metadata,
        });
    }

    pub fn events(&self) -> &[AnalyticsEvent] {
        &self.events
    }

    pub fn metrics(&self, game_id: &GameId) -> GameMetrics {
        let game_events: Vec<&AnalyticsEvent> =
            self.events.iter().filter(|e| e.game_id == *game_id).collect();

        GameMetrics {
            avg_submission_secs: average(&game_events, EventKind::SubmitRound, "duration_secs"),
            avg_note_length: average(&game_events, EventKind::SubmitRound, "note_length"),
            score_distribution: score_distribution(&game_events),
        }
    }
}

fn average(events: &[&AnalyticsEvent], kind: EventKind, key: &str) -> f64 {
    let values: Vec<f64> = events
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.metadata.get(key).copied().unwrap_or(0.0))
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn score_distribution(events: &[&AnalyticsEvent]) -> BTreeMap<u32, u32> {
    let mut distribution = BTreeMap::new();
    for event in events.iter().filter(|e| e.kind == EventKind::RoundReveal) {
        if let Some(score) = event.metadata.get("score") {
            *distribution.entry(*score as u32).or_insert(0) += 1;
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_metrics_empty_game() {
        let analytics = Analytics::new();
        let metrics = analytics.metrics(&"game".to_string());
        assert_eq!(metrics.avg_submission_secs, 0.0);
        assert_eq!(metrics.avg_note_length, 0.0);
        assert!(metrics.score_distribution.is_empty());
    }

    #[test]
    fn test_submission_averages() {
        let mut analytics = Analytics::new();
        let game = "game".to_string();
        let player = "p1".to_string();

        analytics.track(
            EventKind::SubmitRound,
            &game,
            &player,
            meta(&[("duration_secs", 30.0), ("note_length", 40.0)]),
        );
        analytics.track(
            EventKind::SubmitRound,
            &game,
            &player,
            meta(&[("duration_secs", 60.0), ("note_length", 20.0)]),
        );

        let metrics = analytics.metrics(&game);
        assert_eq!(metrics.avg_submission_secs, 45.0);
        assert_eq!(metrics.avg_note_length, 30.0);
    }

    #[test]
    fn test_score_distribution_counts_reveals() {
        let mut analytics = Analytics::new();
        let game = "game".to_string();

        for score in [2.0, 2.0, 4.0, 0.0] {
            analytics.track(
                EventKind::RoundReveal,
                &game,
                &"p".to_string(),
                meta(&[("score", score)]),
            );
        }

        let metrics = analytics.metrics(&game);
        assert_eq!(metrics.score_distribution.get(&2), Some(&2));
        assert_eq!(metrics.score_distribution.get(&4), Some(&1));
        assert_eq!(metrics.score_distribution.get(&0), Some(&1));
    }

    #[test]
    fn test_metrics_scoped_per_game() {
        let mut analytics = Analytics::new();
        analytics.track(
            EventKind::SubmitRound,
            &"a".to_string(),
            &"p".to_string(),
            meta(&[("note_length", 100.0)]),
        );
        analytics.track(
            EventKind::SubmitRound,
            &"b".to_string(),
            &"p".to_string(),
            meta(&[("note_length", 10.0)]),
        );

        assert_eq!(analytics.metrics(&"a".to_string()).avg_note_length, 100.0);
        assert_eq!(analytics.metrics(&"b".to_string()).avg_note_length, 10.0);
    }
}
