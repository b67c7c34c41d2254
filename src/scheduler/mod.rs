//! Match scoring, selection and the court-population scheduler
//!
//! Scoring enumerates legal team splits for a fixed candidate set and ranks
//! them by balance and variety; the population loop pulls priority-ordered
//! waiters onto every empty court until nothing legal remains.

pub mod populate;
pub mod scoring;

pub use populate::{MatchmakingEngine, CANDIDATE_POOL_CAP, MAX_POPULATE_ITERATIONS};
