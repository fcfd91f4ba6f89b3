use super::{EngineError, EngineResult, GameEngine};
use crate::engine::validation;
use crate::types::*;

impl GameEngine {
    /// Record a tasting submission for the current round. Submissions lock
    /// on entry; resubmission requires the host to reopen the round for
    /// that player first.
    pub(crate) fn submit_tasting(
        game: &mut Game,
        actor_id: &PlayerId,
        player_id: &PlayerId,
        round_index: usize,
        tasting_notes: Vec<TastingNote>,
        ranking: Vec<BottleId>,
    ) -> EngineResult<()> {
        let actor_is_host = game.player(actor_id).is_some_and(|p| p.is_host);
        if actor_id != player_id && !actor_is_host {
            return Err(EngineError::Permission(
                "Players can only submit their own tasting notes".to_string(),
            ));
        }

        let target = game
            .player(player_id)
            .ok_or_else(|| EngineError::not_found("player", player_id))?;
        if target.status != PlayerStatus::Active {
            return Err(EngineError::Permission(
                "Only active players can submit tasting notes".to_string(),
            ));
        }

        if round_index != game.current_round - 1 {
            return Err(EngineError::Validation(vec![format!(
                "Submissions are only accepted for the current round ({})",
                game.current_round
            )]));
        }

        let round = game
            .rounds
            .get(round_index)
            .ok_or_else(|| EngineError::not_found("round", round_index.to_string()))?;

        if round.submission_for(player_id).is_some_and(|s| s.locked) {
            return Err(EngineError::Validation(vec![
                "Submission is locked; ask the host to reopen the round".to_string(),
            ]));
        }

        let errors = validation::validate_submission(&tasting_notes, &ranking, round);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        let submission = Submission {
            player_id: player_id.clone(),
            round_index,
            tasting_notes,
            ranking,
            locked: true,
            points: 0,
            submitted_at: chrono::Utc::now().to_rfc3339(),
        };

        if let Some(round) = game.rounds.get_mut(round_index) {
            match round.submission_for_mut(player_id) {
                Some(existing) => *existing = submission,
                None => round.submissions.push(submission),
            }
        }
        Ok(())
    }

    /// Unlock one player's submission so they can resubmit. If the round
    /// was already counting down, play returns to the open round.
    pub(crate) fn reopen_round(game: &mut Game, player_id: &PlayerId) -> EngineResult<()> {
        if game.player(player_id).is_none() {
            return Err(EngineError::not_found("player", player_id));
        }

        let round = game
            .round_in_play_mut()
            .ok_or_else(|| EngineError::not_found("round", "current"))?;

        let submission = round
            .submission_for_mut(player_id)
            .ok_or_else(|| EngineError::not_found("submission", player_id))?;
        submission.locked = false;

        if game.phase == GamePhase::Countdown {
            game.phase = GamePhase::InRound;
            game.phase_deadline = None;
        }

        tracing::info!("Reopened round {} for player {}", game.current_round, player_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil;
    use crate::engine::Action;

    fn submit_for(engine: &mut GameEngine, player: &str) -> EngineResult<()> {
        let round = engine.game().round_in_play().unwrap().clone();
        engine
            .apply(
                &player.to_string(),
                Action::SubmitTasting {
                    player_id: player.to_string(),
                    round_index: round.index,
                    tasting_notes: testutil::notes_for(&round),
                    ranking: round.bottle_ids.clone(),
                },
            )
            .map(|_| ())
    }

    #[test]
    fn test_submission_locks_on_entry() {
        let mut engine = testutil::started_engine();
        let player = testutil::first_non_host(engine.game());

        submit_for(&mut engine, &player).unwrap();

        let submission = engine.game().rounds[0].submission_for(&player).unwrap().clone();
        assert!(submission.locked);
        assert_eq!(submission.points, 0);

        let err = submit_for(&mut engine, &player).unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_reopen_allows_resubmission() {
        let mut engine = testutil::started_engine();
        let host = engine.game().host_id.clone();
        let player = testutil::first_non_host(engine.game());

        submit_for(&mut engine, &player).unwrap();
        engine
            .apply(&host, Action::ReopenRound { player_id: player.clone() })
            .unwrap();

        assert!(!engine.game().rounds[0].submission_for(&player).unwrap().locked);
        submit_for(&mut engine, &player).unwrap();
        assert!(engine.game().rounds[0].submission_for(&player).unwrap().locked);
    }

    #[test]
    fn test_reopen_during_countdown_returns_to_open_round() {
        let mut engine = testutil::started_engine();
        let host = engine.game().host_id.clone();
        let player = testutil::first_non_host(engine.game());

        submit_for(&mut engine, &player).unwrap();
        engine.apply(&host, Action::CloseRound).unwrap();
        assert_eq!(engine.game().phase, GamePhase::Countdown);

        engine
            .apply(&host, Action::ReopenRound { player_id: player.clone() })
            .unwrap();
        assert_eq!(engine.game().phase, GamePhase::InRound);
        assert!(engine.game().phase_deadline.is_none());
    }

    #[test]
    fn test_reopen_rejected_after_reveal() {
        let mut engine = testutil::started_engine();
        let host = engine.game().host_id.clone();
        let player = testutil::first_non_host(engine.game());

        submit_for(&mut engine, &player).unwrap();
        engine.apply(&host, Action::CloseRound).unwrap();
        engine.apply(&host, Action::RevealRound).unwrap();

        let err = engine
            .apply(&host, Action::ReopenRound { player_id: player })
            .unwrap_err();
        assert!(matches!(err, EngineError::Permission(_)));
    }

    #[test]
    fn test_players_cannot_submit_for_each_other() {
        let mut engine = testutil::started_engine();
        let player = testutil::first_non_host(engine.game());
        let other = engine
            .game()
            .players
            .iter()
            .find(|p| !p.is_host && p.id != player)
            .unwrap()
            .id
            .clone();
        let round = engine.game().round_in_play().unwrap().clone();

        let err = engine
            .apply(
                &player,
                Action::SubmitTasting {
                    player_id: other,
                    round_index: 0,
                    tasting_notes: testutil::notes_for(&round),
                    ranking: round.bottle_ids.clone(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Permission(_)));
    }

    #[test]
    fn test_host_may_submit_on_behalf() {
        let mut engine = testutil::started_engine();
        let host = engine.game().host_id.clone();
        let player = testutil::first_non_host(engine.game());
        let round = engine.game().round_in_play().unwrap().clone();

        engine
            .apply(
                &host,
                Action::SubmitTasting {
                    player_id: player.clone(),
                    round_index: 0,
                    tasting_notes: testutil::notes_for(&round),
                    ranking: round.bottle_ids.clone(),
                },
            )
            .unwrap();
        assert!(engine.game().rounds[0].submission_for(&player).is_some());
    }

    #[test]
    fn test_wrong_round_index_rejected() {
        let mut engine = testutil::started_engine();
        let player = testutil::first_non_host(engine.game());
        let round = engine.game().round_in_play().unwrap().clone();

        let err = engine
            .apply(
                &player,
                Action::SubmitTasting {
                    player_id: player.clone(),
                    round_index: 1,
                    tasting_notes: testutil::notes_for(&round),
                    ranking: round.bottle_ids.clone(),
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("current round"));
    }

    #[test]
    fn test_rejected_submission_leaves_state_unchanged() {
        let mut engine = testutil::started_engine();
        let player = testutil::first_non_host(engine.game());
        let round = engine.game().round_in_play().unwrap().clone();
        let before = engine.timeline().len();

        let mut notes = testutil::notes_for(&round);
        notes[0].note = "meh".to_string();
        let err = engine
            .apply(
                &player,
                Action::SubmitTasting {
                    player_id: player.clone(),
                    round_index: 0,
                    tasting_notes: notes,
                    ranking: round.bottle_ids.clone(),
                },
            )
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert!(engine.game().rounds[0].submissions.is_empty());
        assert_eq!(engine.timeline().len(), before, "nothing was logged");
    }
}
