//! Adaptive constraint controller
//!
//! Maps session progress to the currently effective constraint values. Early
//! in a session variety wins: narrow roaming, long repetition gaps, low
//! balance weight. As matches complete the thresholds relax so balance is
//! not permanently sacrificed to variety. Phase transition points are
//! derived from player and court counts so they scale with session size.

use crate::config::{AdaptiveMode, SessionConfig};
use serde::{Deserialize, Serialize};

/// Progress phase of an auto-mode session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Early,
    Mid,
    Late,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Early => write!(f, "early"),
            SessionPhase::Mid => write!(f, "mid"),
            SessionPhase::Late => write!(f, "late"),
        }
    }
}

/// The constraint values in force for one scheduling pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintProfile {
    pub roaming_range_pct: f64,
    pub partner_gap: u32,
    pub opponent_gap: u32,
    pub balance_weight: f64,
}

impl ConstraintProfile {
    /// Early phase: widest variety, loosest balance
    fn early() -> Self {
        Self {
            roaming_range_pct: 0.5,
            partner_gap: 3,
            opponent_gap: 2,
            balance_weight: 1.0,
        }
    }

    fn mid() -> Self {
        Self {
            roaming_range_pct: 0.65,
            partner_gap: 2,
            opponent_gap: 1,
            balance_weight: 2.5,
        }
    }

    /// Late phase: balance dominates, repeats freely allowed
    fn late() -> Self {
        Self {
            roaming_range_pct: 0.8,
            partner_gap: 1,
            opponent_gap: 0,
            balance_weight: 5.0,
        }
    }

    fn for_phase(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Early => Self::early(),
            SessionPhase::Mid => Self::mid(),
            SessionPhase::Late => Self::late(),
        }
    }

    /// Static values straight from operator configuration
    fn from_config(config: &SessionConfig, balance_weight: f64) -> Self {
        Self {
            roaming_range_pct: config.roaming_range_pct,
            partner_gap: config.partner_gap,
            opponent_gap: config.opponent_gap,
            balance_weight,
        }
    }

    /// Whether the partner-opponent-partner social pattern check is active
    pub fn social_pattern_active(&self) -> bool {
        self.balance_weight > 1.0
    }
}

/// Completed-match counts at which the session advances phase.
/// Returns `(mid_at, late_at)`, both scaled to session size.
pub fn phase_thresholds(player_count: usize, court_count: usize) -> (u32, u32) {
    let mid_at = (player_count / 4).max(court_count) as u32;
    let late_at = (player_count / 2).max(court_count * 2) as u32;
    (mid_at, late_at.max(mid_at + 1))
}

/// Phase for the given progress point
pub fn phase_for(completed_matches: u32, player_count: usize, court_count: usize) -> SessionPhase {
    let (mid_at, late_at) = phase_thresholds(player_count, court_count);
    if completed_matches >= late_at {
        SessionPhase::Late
    } else if completed_matches >= mid_at {
        SessionPhase::Mid
    } else {
        SessionPhase::Early
    }
}

/// Resolve the constraint profile in force for the current pass
pub fn effective_profile(
    config: &SessionConfig,
    completed_matches: u32,
    player_count: usize,
    court_count: usize,
) -> ConstraintProfile {
    match config.adaptive_mode {
        AdaptiveMode::Auto => {
            ConstraintProfile::for_phase(phase_for(completed_matches, player_count, court_count))
        }
        AdaptiveMode::Manual { weight } => ConstraintProfile::from_config(config, weight),
        AdaptiveMode::Disabled => ConstraintProfile::from_config(config, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_scale_with_session_size() {
        // 16 players, 4 courts: mid at 4, late at 8
        assert_eq!(phase_thresholds(16, 4), (4, 8));
        // 32 players, 4 courts: mid at 8, late at 16
        assert_eq!(phase_thresholds(32, 4), (8, 16));
        // Court count floors the thresholds for tiny player pools
        assert_eq!(phase_thresholds(4, 4), (4, 8));
    }

    #[test]
    fn test_phase_progression() {
        assert_eq!(phase_for(0, 16, 4), SessionPhase::Early);
        assert_eq!(phase_for(3, 16, 4), SessionPhase::Early);
        assert_eq!(phase_for(4, 16, 4), SessionPhase::Mid);
        assert_eq!(phase_for(7, 16, 4), SessionPhase::Mid);
        assert_eq!(phase_for(8, 16, 4), SessionPhase::Late);
        assert_eq!(phase_for(50, 16, 4), SessionPhase::Late);
    }

    #[test]
    fn test_auto_profile_relaxes_over_time() {
        let config = SessionConfig::default();

        let early = effective_profile(&config, 0, 16, 4);
        let late = effective_profile(&config, 20, 16, 4);

        assert!(late.roaming_range_pct > early.roaming_range_pct);
        assert!(late.partner_gap < early.partner_gap);
        assert!(late.opponent_gap < early.opponent_gap);
        assert!(late.balance_weight > early.balance_weight);
        assert_eq!(late.opponent_gap, 0);
    }

    #[test]
    fn test_manual_pins_weight_keeps_config_values() {
        let config = SessionConfig {
            roaming_range_pct: 0.6,
            partner_gap: 1,
            opponent_gap: 1,
            adaptive_mode: AdaptiveMode::Manual { weight: 3.0 },
            ..Default::default()
        };

        // Progress is irrelevant in manual mode
        let profile = effective_profile(&config, 100, 16, 4);
        assert_eq!(profile.balance_weight, 3.0);
        assert_eq!(profile.roaming_range_pct, 0.6);
        assert_eq!(profile.partner_gap, 1);
    }

    #[test]
    fn test_disabled_applies_static_config() {
        let config = SessionConfig {
            adaptive_mode: AdaptiveMode::Disabled,
            ..Default::default()
        };

        let at_start = effective_profile(&config, 0, 16, 4);
        let much_later = effective_profile(&config, 100, 16, 4);
        assert_eq!(at_start, much_later);
        assert_eq!(at_start.balance_weight, 1.0);
        assert!(!at_start.social_pattern_active());
    }

    #[test]
    fn test_social_pattern_activation() {
        assert!(!ConstraintProfile::early().social_pattern_active());
        assert!(ConstraintProfile::mid().social_pattern_active());
        assert!(ConstraintProfile::late().social_pattern_active());
    }
}
