//! Session state for a single open-play event
//!
//! The session owns the player roster, per-player history, the match arena
//! and the court inventory. All engine functions are pure with respect to
//! everything except the session they are handed.

pub mod state;
pub mod stats;

pub use state::{Session, SessionStats};
pub use stats::PlayerStats;
