//! Rating computation and rank derivation
//!
//! Converts per-player history into a single comparable skill number, and
//! orders the active field into ranks with per-player roaming windows.

pub mod engine;
pub mod ranking;

pub use engine::{is_provisional, rating_for, BASE_RATING, PROVISIONAL_GAMES};
pub use ranking::RankTable;
