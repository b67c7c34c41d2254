//! Session constraint configuration
//!
//! These are the mutable, session-lifetime knobs consumed by the engine:
//! roaming range, repetition gaps, adaptive mode, banned pairs and locked
//! teams. Invalid values are corrected by clamping rather than rejected,
//! so a misconfigured slider can never wedge the scheduler.

use crate::types::PlayerId;
use crate::utils::canonical_pair;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Smallest usable roaming-range percentage; anything below is clamped up
pub const MIN_ROAMING_RANGE_PCT: f64 = 0.25;

/// Largest manual balance weight accepted from an operator
pub const MAX_BALANCE_WEIGHT: f64 = 10.0;

/// How the balance-priority weight and relaxation schedule are driven
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdaptiveMode {
    /// Session progress drives phase-based relaxation
    Auto,
    /// Operator pins the balance weight; roaming/gaps stay as configured
    Manual { weight: f64 },
    /// No relaxation at all; static configuration applies
    Disabled,
}

impl std::fmt::Display for AdaptiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdaptiveMode::Auto => write!(f, "auto"),
            AdaptiveMode::Manual { weight } => write!(f, "manual({weight:.1}x)"),
            AdaptiveMode::Disabled => write!(f, "disabled"),
        }
    }
}

/// Constraint configuration for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fraction of the ranked field a player may roam across (0.25..=1.0)
    pub roaming_range_pct: f64,
    /// Minimum games a player must play before repeating a partner
    pub partner_gap: u32,
    /// Minimum games a player must play before repeating an opponent
    pub opponent_gap: u32,
    /// Balance-weight control mode
    pub adaptive_mode: AdaptiveMode,
    /// Unordered pairs that may never share a court in any role
    pub banned_pairs: Vec<(PlayerId, PlayerId)>,
    /// Pairs that must partner together whenever both are selected
    pub locked_teams: Vec<(PlayerId, PlayerId)>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            roaming_range_pct: 0.5,
            partner_gap: 3,
            opponent_gap: 2,
            adaptive_mode: AdaptiveMode::Auto,
            banned_pairs: Vec::new(),
            locked_teams: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Clamp all values into their usable ranges, logging any correction.
    ///
    /// Clamping is the error-handling policy for configuration: a requested
    /// window smaller than the minimum is corrected, never fatal.
    pub fn clamp(&mut self) {
        if self.roaming_range_pct < MIN_ROAMING_RANGE_PCT {
            warn!(
                requested = self.roaming_range_pct,
                clamped = MIN_ROAMING_RANGE_PCT,
                "roaming range below minimum, clamping"
            );
            self.roaming_range_pct = MIN_ROAMING_RANGE_PCT;
        }
        if self.roaming_range_pct > 1.0 {
            warn!(
                requested = self.roaming_range_pct,
                "roaming range above 100%, clamping"
            );
            self.roaming_range_pct = 1.0;
        }
        if let AdaptiveMode::Manual { weight } = &mut self.adaptive_mode {
            if *weight < 1.0 {
                warn!(requested = *weight, "manual balance weight below 1.0, clamping");
                *weight = 1.0;
            }
            if *weight > MAX_BALANCE_WEIGHT {
                warn!(requested = *weight, "manual balance weight above max, clamping");
                *weight = MAX_BALANCE_WEIGHT;
            }
        }
    }

    /// Whether the two players are a banned pair (order independent)
    pub fn is_banned(&self, a: &str, b: &str) -> bool {
        let key = canonical_pair(a, b);
        self.banned_pairs
            .iter()
            .any(|(x, y)| canonical_pair(x, y) == key)
    }

    /// The player `id` is locked to, if any
    pub fn locked_partner(&self, id: &str) -> Option<&PlayerId> {
        self.locked_teams.iter().find_map(|(x, y)| {
            if x == id {
                Some(y)
            } else if y == id {
                Some(x)
            } else {
                None
            }
        })
    }

    pub fn ban_pair(&mut self, a: impl Into<PlayerId>, b: impl Into<PlayerId>) {
        let (a, b) = (a.into(), b.into());
        if !self.is_banned(&a, &b) {
            self.banned_pairs.push((a, b));
        }
    }

    pub fn lock_team(&mut self, a: impl Into<PlayerId>, b: impl Into<PlayerId>) {
        self.locked_teams.push((a.into(), b.into()));
    }
}
