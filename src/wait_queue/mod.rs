//! Wait-priority queue
//!
//! Orders waiting players by urgency using two complementary mechanisms: a
//! relative-gap tier system over accumulated wait time, and a simple
//! "courts completed since last played" counter that flags must-play players
//! ahead of every scoring consideration.

use crate::session::state::Session;
use crate::types::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::warn;

/// Courts that may finish around an idle player before they become must-play
pub const MUST_PLAY_THRESHOLD: u32 = 2;

/// Urgency tier, most urgent first so the derived ordering sorts naturally
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WaitTier {
    Extreme,
    Significant,
    Normal,
}

/// Thresholds for relative-gap tiering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitTierConfig {
    /// Seconds over the shortest waiter that makes a wait significant
    pub significant_gap_secs: i64,
    /// Seconds over the shortest waiter that makes a wait extreme
    pub extreme_gap_secs: i64,
    /// Spread below which everyone is simply normal (ignores noise)
    pub min_spread_secs: i64,
}

impl Default for WaitTierConfig {
    fn default() -> Self {
        Self {
            significant_gap_secs: 12 * 60,
            extreme_gap_secs: 20 * 60,
            min_spread_secs: 5 * 60,
        }
    }
}

/// One waiting player with everything the scheduler needs to order them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitEntry {
    pub player_id: PlayerId,
    pub total_wait_secs: i64,
    /// Courts completed since this player last played
    pub games_waited: u32,
    pub tier: WaitTier,
    pub must_play: bool,
}

/// Compute the priority-ordered waiting list.
///
/// Sort key: must-play first, then tier (extreme before significant before
/// normal), then wait time descending, then the legacy games-waited counter
/// descending, then id. Fully deterministic, no random tie-break.
pub fn ordered_waiters(
    session: &Session,
    now: DateTime<Utc>,
    config: &WaitTierConfig,
) -> Vec<WaitEntry> {
    let mut entries: Vec<WaitEntry> = session
        .waiting_ids()
        .into_iter()
        .filter_map(|player_id| match session.stats_for(&player_id) {
            Some(stats) => Some(WaitEntry {
                total_wait_secs: stats.total_wait_secs(now),
                games_waited: stats.courts_since_last_played,
                tier: WaitTier::Normal,
                must_play: stats.courts_since_last_played >= MUST_PLAY_THRESHOLD,
                player_id,
            }),
            None => {
                warn!(%player_id, "waiting player has no stats record, skipping");
                None
            }
        })
        .collect();

    if entries.is_empty() {
        return entries;
    }

    let min_wait = entries.iter().map(|e| e.total_wait_secs).min().unwrap_or(0);
    let max_wait = entries.iter().map(|e| e.total_wait_secs).max().unwrap_or(0);

    // Below the minimum spread the differences are noise, everyone stays normal
    if max_wait - min_wait >= config.min_spread_secs {
        for entry in &mut entries {
            let over_min = entry.total_wait_secs - min_wait;
            entry.tier = if over_min >= config.extreme_gap_secs {
                WaitTier::Extreme
            } else if over_min >= config.significant_gap_secs {
                WaitTier::Significant
            } else {
                WaitTier::Normal
            };
        }
    }

    entries.sort_by(|a, b| {
        (!a.must_play, a.tier, Reverse(a.total_wait_secs), Reverse(a.games_waited))
            .cmp(&(!b.must_play, b.tier, Reverse(b.total_wait_secs), Reverse(b.games_waited)))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    entries
}
