//! Pair/group legality predicates and the adaptive constraint controller
//!
//! Predicates answer "may these players share a court right now"; the
//! adaptive controller decides how strict those predicates currently are.

pub mod adaptive;
pub mod predicates;

pub use adaptive::{effective_profile, phase_for, ConstraintProfile, SessionPhase};
pub use predicates::{can_all_play_together, can_play_together, ConstraintContext};
