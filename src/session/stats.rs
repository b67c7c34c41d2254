//! Per-player performance and interaction history
//!
//! One record per active player, owned by the session. The partner/opponent
//! maps store the owner's own game ordinal at the last meeting, so repetition
//! gaps are integer arithmetic over each player's personal history and two
//! players' gap state can diverge when one sits out intervening games.

use crate::types::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mutable per-player statistics and history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,

    /// Owner's game ordinal (1-based) at the last game partnered with each player.
    /// Authoritative for the repetition-gap check; never decreases.
    pub partner_last_game: HashMap<PlayerId, u32>,
    /// Owner's game ordinal at the last game opposing each player
    pub opponent_last_game: HashMap<PlayerId, u32>,
    /// Times partnered with each player (reporting only)
    pub partner_counts: HashMap<PlayerId, u32>,
    /// Times opposed each player (reporting only)
    pub opponent_counts: HashMap<PlayerId, u32>,

    /// Courts this player has played on, in order
    pub courts_played: Vec<usize>,

    /// Set while the player is off-court
    pub waiting_since: Option<DateTime<Utc>>,
    /// Wait time banked from earlier waiting stretches
    pub accumulated_wait_secs: i64,
    /// Courts that finished while this player sat out; reset on placement
    pub courts_since_last_played: u32,
}

impl PlayerStats {
    /// New record for a player entering the session, waiting from `now`
    pub fn new_waiting(now: DateTime<Utc>) -> Self {
        Self {
            waiting_since: Some(now),
            ..Default::default()
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.games_played)
    }

    /// Average per-game point margin (signed)
    pub fn avg_point_margin(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        (f64::from(self.points_for) - f64::from(self.points_against))
            / f64::from(self.games_played)
    }

    /// Total wait: banked seconds plus the current stretch
    pub fn total_wait_secs(&self, now: DateTime<Utc>) -> i64 {
        let current = self
            .waiting_since
            .map(|since| (now - since).num_seconds().max(0))
            .unwrap_or(0);
        self.accumulated_wait_secs + current
    }

    /// Player placed on a court: close the wait stretch, reset the idle counter
    pub fn mark_placed(&mut self, court: usize, now: DateTime<Utc>) {
        if let Some(since) = self.waiting_since.take() {
            self.accumulated_wait_secs += (now - since).num_seconds().max(0);
        }
        self.courts_since_last_played = 0;
        self.courts_played.push(court);
    }

    /// Player returns to the waiting pool
    pub fn mark_waiting(&mut self, now: DateTime<Utc>) {
        if self.waiting_since.is_none() {
            self.waiting_since = Some(now);
        }
    }

    /// Record a completed game against the given line-up.
    ///
    /// `partners` and `opponents` are the other players in the game; the
    /// ordinal stored is this player's own games-played count after the
    /// increment, so "games since" is `games_played - stored`.
    pub fn record_game<'a>(
        &mut self,
        won: bool,
        points_for: u16,
        points_against: u16,
        partners: impl Iterator<Item = &'a PlayerId>,
        opponents: impl Iterator<Item = &'a PlayerId>,
    ) {
        self.games_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.points_for += u32::from(points_for);
        self.points_against += u32::from(points_against);

        let ordinal = self.games_played;
        for partner in partners {
            self.partner_last_game.insert(partner.clone(), ordinal);
            *self.partner_counts.entry(partner.clone()).or_insert(0) += 1;
        }
        for opponent in opponents {
            self.opponent_last_game.insert(opponent.clone(), ordinal);
            *self.opponent_counts.entry(opponent.clone()).or_insert(0) += 1;
        }
    }

    /// Games this player has completed since last sharing `role` with `other`.
    /// `None` when the relationship has never occurred.
    pub fn games_since_partnered(&self, other: &str) -> Option<u32> {
        self.partner_last_game
            .get(other)
            .map(|last| self.games_played - last)
    }

    pub fn games_since_opposed(&self, other: &str) -> Option<u32> {
        self.opponent_last_game
            .get(other)
            .map(|last| self.games_played - last)
    }
}
