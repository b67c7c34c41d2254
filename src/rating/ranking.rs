//! Ranking and roaming-range derivation
//!
//! A rank table is a snapshot of the active field ordered by rating
//! (rank 1 = highest), with ties broken by player id so the ordering is
//! stable across rebuilds. Each player gets a contiguous rank window, the
//! roaming range, inside which opponents and partners must fall.

use crate::rating::engine::{is_provisional, rating_for};
use crate::session::state::Session;
use crate::types::PlayerId;
use std::collections::HashMap;
use tracing::warn;

/// A roaming window never shrinks below this many players (one doubles court)
pub const MIN_WINDOW_PLAYERS: usize = 4;

#[derive(Debug, Clone)]
struct RankEntry {
    player_id: PlayerId,
    rating: f64,
    provisional: bool,
}

/// Snapshot of ranks and ratings for the current active field
#[derive(Debug, Clone)]
pub struct RankTable {
    entries: Vec<RankEntry>,
    index: HashMap<PlayerId, usize>,
}

impl RankTable {
    /// Build the table from the session's current stats.
    ///
    /// Players with a missing stats record are skipped with a logged anomaly
    /// rather than failing the whole derivation.
    pub fn for_session(session: &Session) -> Self {
        let mut entries: Vec<RankEntry> = session
            .players()
            .filter_map(|player| match session.stats_for(&player.id) {
                Some(stats) => Some(RankEntry {
                    player_id: player.id.clone(),
                    rating: rating_for(stats, player.seed_rating),
                    provisional: is_provisional(stats),
                }),
                None => {
                    warn!(player_id = %player.id, "player has no stats record, excluded from ranking");
                    None
                }
            })
            .collect();

        // Rating descending, ties by id ascending for a stable order
        entries.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.player_id.clone(), i))
            .collect();

        Self { entries, index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based rank (1 = highest rating)
    pub fn rank_of(&self, player_id: &str) -> Option<usize> {
        self.index.get(player_id).map(|i| i + 1)
    }

    pub fn rating_of(&self, player_id: &str) -> Option<f64> {
        self.index.get(player_id).map(|&i| self.entries[i].rating)
    }

    pub fn is_provisional(&self, player_id: &str) -> bool {
        self.index
            .get(player_id)
            .map(|&i| self.entries[i].provisional)
            .unwrap_or(false)
    }

    /// Player ids in rank order (best first)
    pub fn ids_by_rank(&self) -> impl Iterator<Item = &PlayerId> {
        self.entries.iter().map(|e| &e.player_id)
    }

    /// The permissible rank window `[lo, hi]` for a player.
    ///
    /// Half-width is `ceil(pct * n / 2)`. The window keeps its full width at
    /// the edges of the field by sliding inward rather than truncating, and
    /// never holds fewer than four players where the field allows.
    pub fn roaming_window(&self, player_id: &str, pct: f64) -> Option<(usize, usize)> {
        let rank = self.rank_of(player_id)?;
        let n = self.len();
        let half = (pct * n as f64 / 2.0).ceil() as usize;

        let floor = MIN_WINDOW_PLAYERS.min(n);
        let width = (2 * half + 1).clamp(floor, n);

        let mut lo = rank.saturating_sub(half).max(1);
        let mut hi = lo + width - 1;
        if hi > n {
            hi = n;
            lo = n - width + 1;
        }
        Some((lo, hi))
    }

    /// Mutual roaming check: each player's rank must fall inside the other's
    /// window. Checked both directions even though widths usually agree.
    pub fn in_mutual_range(&self, a: &str, b: &str, pct: f64) -> bool {
        let (Some(rank_a), Some(rank_b)) = (self.rank_of(a), self.rank_of(b)) else {
            return false;
        };
        let (Some((lo_a, hi_a)), Some((lo_b, hi_b))) =
            (self.roaming_window(a, pct), self.roaming_window(b, pct))
        else {
            return false;
        };
        (lo_a..=hi_a).contains(&rank_b) && (lo_b..=hi_b).contains(&rank_a)
    }

    /// Whether a player sits in the top half of the field (the upper bracket)
    pub fn in_top_half(&self, player_id: &str) -> Option<bool> {
        let rank = self.rank_of(player_id)?;
        Some(rank <= self.len().div_ceil(2))
    }
}
