//! Error types for the matchmaking engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Self-healing conditions (window clamping, missing stats
//! records) are logged and corrected in place; only invariant-violating edits and
//! genuinely broken state surface as errors.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific scheduling scenarios
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Player already in session: {player_id}")]
    DuplicatePlayer { player_id: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Invalid match edit: {reason}")]
    InvalidMatchEdit { reason: String },

    #[error("Player is on an active court: {player_id}")]
    PlayerOnCourt { player_id: String },
}
