//! The price gambit: a one-time side wager on the cheapest and most
//! expensive bottle across the whole game, plus a non-scored favorite.

use super::{EngineError, EngineResult, GameEngine};
use crate::types::{Bottle, BottleId, Game, Gambit, PlayerId};

/// Points for a correct most-expensive or least-expensive guess
pub const GAMBIT_GUESS_POINTS: u32 = 2;

/// The cheapest and priciest bottle of the game. Price uniqueness is
/// enforced at setup finalization, but if duplicates slip in the first
/// occurrence in bottle list order wins.
pub fn price_extremes(bottles: &[Bottle]) -> Option<(&Bottle, &Bottle)> {
    let mut cheapest = bottles.first()?;
    let mut priciest = bottles.first()?;
    for bottle in bottles {
        if bottle.price < cheapest.price {
            cheapest = bottle;
        }
        if bottle.price > priciest.price {
            priciest = bottle;
        }
    }
    Some((cheapest, priciest))
}

/// Structural check of a gambit's bottle references.
pub fn validate_gambit(
    game: &Game,
    most_expensive: &str,
    least_expensive: &str,
    favorite: &str,
) -> Vec<String> {
    let mut errors = Vec::new();

    if game.bottle(most_expensive).is_none() {
        errors.push("Most expensive bottle ID is invalid".to_string());
    }
    if game.bottle(least_expensive).is_none() {
        errors.push("Least expensive bottle ID is invalid".to_string());
    }
    if most_expensive == least_expensive {
        errors.push("Most expensive and least expensive cannot be the same bottle".to_string());
    }
    if game.bottle(favorite).is_none() {
        errors.push("Favorite bottle ID is invalid".to_string());
    }

    errors
}

impl GameEngine {
    pub(crate) fn submit_gambit(
        game: &mut Game,
        actor_id: &PlayerId,
        most_expensive: BottleId,
        least_expensive: BottleId,
        favorite: BottleId,
    ) -> EngineResult<()> {
        let errors = validate_gambit(game, &most_expensive, &least_expensive, &favorite);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        if game.gambits.iter().any(|g| g.player_id == *actor_id) {
            return Err(EngineError::Validation(vec![
                "Gambit already submitted".to_string(),
            ]));
        }

        game.gambits.push(Gambit {
            player_id: actor_id.clone(),
            most_expensive,
            least_expensive,
            favorite,
            points: 0,
        });
        Ok(())
    }

    /// Settle all gambits against the true price extremes and credit the
    /// owning players. Runs once, on the transition out of the gambit phase.
    pub(crate) fn resolve_gambits(game: &mut Game) {
        let (cheapest_id, priciest_id) = match price_extremes(&game.bottles) {
            Some((cheapest, priciest)) => (cheapest.id.clone(), priciest.id.clone()),
            None => return,
        };

        let mut credits = Vec::with_capacity(game.gambits.len());
        for gambit in &mut game.gambits {
            let mut points = 0;
            if gambit.most_expensive == priciest_id {
                points += GAMBIT_GUESS_POINTS;
            }
            if gambit.least_expensive == cheapest_id {
                points += GAMBIT_GUESS_POINTS;
            }
            // The favorite is a preference signal, never scored
            gambit.points = points;
            credits.push((gambit.player_id.clone(), points));
        }

        for (player_id, points) in credits {
            if let Some(player) = game.player_mut(&player_id) {
                player.score += points;
            }
        }
    }
}
