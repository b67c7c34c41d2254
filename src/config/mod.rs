//! Configuration for the matchmaking engine
//!
//! This module holds the session-scoped constraint knobs consumed by the
//! scheduler, with clamping validation so operator input can never produce
//! an unusable window.

pub mod session;

pub use session::{AdaptiveMode, SessionConfig, MIN_ROAMING_RANGE_PCT};
