//! Room PIN and player session tokens.
//!
//! A game is joined with a 4-digit PIN generated at setup finalization;
//! each claimed player slot carries its own session token. Both checks are
//! exact equality, compared in constant time.

use crate::types::{Game, GameId, Player};
use rand::Rng;

/// Safe character set for session tokens (excludes 0/O, 1/I/L to avoid confusion)
const TOKEN_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const TOKEN_LENGTH: usize = 8;

/// Generate a 4-digit room PIN
pub fn generate_game_pin() -> String {
    let mut rng = rand::rng();
    rng.random_range(1000..10000).to_string()
}

/// Validate a join PIN against the game record
pub fn validate_game_pin(game: &Game, pin: &str) -> bool {
    !game.pin.is_empty() && constant_time_eq(game.pin.as_bytes(), pin.as_bytes())
}

/// Generate a random player session token
pub fn generate_player_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARS[rng.random_range(0..TOKEN_CHARS.len())] as char)
        .collect()
}

/// Validate a session token against a player record
pub fn validate_player_token(player: &Player, token: &str) -> bool {
    !player.token.is_empty() && constant_time_eq(player.token.as_bytes(), token.as_bytes())
}

/// Build the join reference the host shares with the table
pub fn join_reference(game_id: &GameId, pin: &str) -> String {
    format!("/join/{}#{}", game_id, pin)
}

/// Parse a join reference back into (game id, PIN)
pub fn parse_join_reference(reference: &str) -> Option<(GameId, String)> {
    let rest = reference.strip_prefix("/join/")?;
    let (game_id, pin) = rest.split_once('#')?;
    if game_id.is_empty() || pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((game_id.to_string(), pin.to_string()))
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
