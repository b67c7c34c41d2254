//! Club Night - Competitive-variety matchmaking for multi-court sessions
//!
//! This crate schedules round-based club play: a performance rating engine,
//! ranking with roaming ranges, constraint predicates with an adaptive
//! controller, a wait-priority queue and a court-population scheduler.

pub mod clock;
pub mod config;
pub mod constraint;
pub mod error;
pub mod rating;
pub mod scheduler;
pub mod session;
pub mod types;
pub mod utils;
pub mod wait_queue;

// Re-export commonly used types and traits
pub use error::{Result, SchedulerError};
pub use types::*;

// Re-export key components
pub use config::{AdaptiveMode, SessionConfig};
pub use scheduler::MatchmakingEngine;
pub use session::{Session, SessionStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
