//! Skill rating computation
//!
//! Start from a base rating, add a logarithmically-scaled win-rate term so
//! improvements have diminishing returns near 100%, add a signed logarithmic
//! point-differential term, and a small experience bonus for proven winners.
//! The result is clamped so one blowout evening cannot escape the scale.

use crate::session::stats::PlayerStats;

/// Rating every player starts from
pub const BASE_RATING: f64 = 1500.0;

/// Hard floor and ceiling of the rating scale
pub const RATING_FLOOR: f64 = 800.0;
pub const RATING_CEILING: f64 = 2200.0;

/// Games played below which a rating is not yet trustworthy
pub const PROVISIONAL_GAMES: u32 = 2;

/// Scale of the win-rate term
const WIN_RATE_SCALE: f64 = 250.0;
/// Scale of the average point-margin term
const MARGIN_SCALE: f64 = 40.0;
/// Scale of the experience bonus
const EXPERIENCE_SCALE: f64 = 10.0;
/// Win rate a player must hold to earn the experience bonus
const EXPERIENCE_WIN_RATE: f64 = 0.5;

/// Compute the rating for a player's current history.
///
/// With zero games the pre-seeded skill value is used when present,
/// otherwise exactly the base rating.
pub fn rating_for(stats: &PlayerStats, seed_rating: Option<f64>) -> f64 {
    if stats.games_played == 0 {
        return seed_rating
            .map(|seed| seed.clamp(RATING_FLOOR, RATING_CEILING))
            .unwrap_or(BASE_RATING);
    }

    let win_rate = stats.win_rate();
    let win_term = (1.0 + win_rate * 9.0).ln() * WIN_RATE_SCALE - WIN_RATE_SCALE;

    let margin = stats.avg_point_margin();
    let margin_term = margin.signum() * (1.0 + margin.abs()).ln() * MARGIN_SCALE;

    let experience_term = if win_rate >= EXPERIENCE_WIN_RATE {
        f64::from(stats.games_played).ln() * EXPERIENCE_SCALE
    } else {
        0.0
    };

    (BASE_RATING + win_term + margin_term + experience_term).clamp(RATING_FLOOR, RATING_CEILING)
}

/// Provisional players are exempt from roaming-range strictness
pub fn is_provisional(stats: &PlayerStats) -> bool {
    stats.games_played < PROVISIONAL_GAMES
}
