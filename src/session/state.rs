//! Session state and invariant-preserving mutators
//!
//! The session is the single mutable object the engine operates on. Player
//! and stats maps are BTreeMaps so every iteration order is deterministic,
//! which the scheduler relies on for reproducible assignments.

use crate::config::SessionConfig;
use crate::error::{Result, SchedulerError};
use crate::session::stats::PlayerStats;
use crate::types::{Match, MatchId, MatchScore, MatchStatus, Player, PlayerId};
use crate::utils::generate_match_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Aggregate counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub matches_completed: u64,
    pub matches_forfeited: u64,
    pub courts_filled: u64,
    pub players_added: u64,
}

/// All mutable state for one open-play session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    court_count: usize,
    team_size: usize,
    config: SessionConfig,
    players: BTreeMap<PlayerId, Player>,
    stats: BTreeMap<PlayerId, PlayerStats>,
    matches: Vec<Match>,
    completed_matches: u32,
    next_seq: u32,
    summary: SessionStats,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session.
    ///
    /// `team_size` is 1 for singles, 2 for doubles. The config is clamped
    /// into its usable range on the way in.
    pub fn new(
        court_count: usize,
        team_size: usize,
        mut config: SessionConfig,
        now: DateTime<Utc>,
    ) -> Self {
        config.clamp();
        Self {
            court_count,
            team_size,
            config,
            players: BTreeMap::new(),
            stats: BTreeMap::new(),
            matches: Vec::new(),
            completed_matches: 0,
            next_seq: 0,
            summary: SessionStats::default(),
            created_at: now,
        }
    }

    pub fn court_count(&self) -> usize {
        self.court_count
    }

    pub fn team_size(&self) -> usize {
        self.team_size
    }

    /// Players needed to fill one court
    pub fn players_per_court(&self) -> usize {
        self.team_size * 2
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Direct config access. Engine setters should be preferred because they
    /// clamp and trigger a re-population pass.
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn summary(&self) -> &SessionStats {
        &self.summary
    }

    pub fn completed_matches(&self) -> u32 {
        self.completed_matches
    }

    /// True before any match has ever been committed
    pub fn is_first_round(&self) -> bool {
        self.matches.is_empty()
    }

    // --- players -----------------------------------------------------------

    /// Add a player to the session; they start in the waiting pool
    pub fn add_player(&mut self, player: Player, now: DateTime<Utc>) -> Result<()> {
        if self.players.contains_key(&player.id) {
            return Err(SchedulerError::DuplicatePlayer {
                player_id: player.id.clone(),
            }
            .into());
        }
        debug!(player_id = %player.id, "player joined session");
        self.stats
            .insert(player.id.clone(), PlayerStats::new_waiting(now));
        self.players.insert(player.id.clone(), player);
        self.summary.players_added += 1;
        Ok(())
    }

    /// Remove a player. Rejected while they are on an active court.
    pub fn remove_player(&mut self, player_id: &str) -> Result<Player> {
        if !self.players.contains_key(player_id) {
            return Err(SchedulerError::PlayerNotFound {
                player_id: player_id.to_string(),
            }
            .into());
        }
        if self.open_match_of(player_id).is_some() {
            return Err(SchedulerError::PlayerOnCourt {
                player_id: player_id.to_string(),
            }
            .into());
        }
        self.stats.remove(player_id);
        let player = self
            .players
            .remove(player_id)
            .ok_or_else(|| SchedulerError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        debug!(player_id, "player left session");
        Ok(player)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Active ids in deterministic (sorted) order
    pub fn active_ids(&self) -> Vec<PlayerId> {
        self.players.keys().cloned().collect()
    }

    pub fn stats_for(&self, player_id: &str) -> Option<&PlayerStats> {
        self.stats.get(player_id)
    }

    pub(crate) fn stats_mut(&mut self, player_id: &str) -> Option<&mut PlayerStats> {
        self.stats.get_mut(player_id)
    }

    // --- matches and courts ------------------------------------------------

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn match_by_id(&self, match_id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    fn match_by_id_mut(&mut self, match_id: MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }

    pub fn open_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.is_open())
    }

    /// The open match a player occupies, if any
    pub fn open_match_of(&self, player_id: &str) -> Option<&Match> {
        self.open_matches().find(|m| m.contains(player_id))
    }

    /// A player is waiting iff they are active and not in any open match
    pub fn is_waiting(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id) && self.open_match_of(player_id).is_none()
    }

    /// Waiting player ids in deterministic (sorted) order
    pub fn waiting_ids(&self) -> Vec<PlayerId> {
        self.players
            .keys()
            .filter(|id| self.open_match_of(id).is_none())
            .cloned()
            .collect()
    }

    /// Court numbers (1-based) not currently hosting an open match
    pub fn empty_courts(&self) -> Vec<usize> {
        let occupied: Vec<usize> = self.open_matches().map(|m| m.court).collect();
        (1..=self.court_count)
            .filter(|court| !occupied.contains(court))
            .collect()
    }

    /// Commit a new waiting-status match to a court.
    ///
    /// Callers are responsible for legality; this only maintains the
    /// wait-state invariants for the placed players.
    pub(crate) fn commit_match(
        &mut self,
        court: usize,
        teams: [Vec<PlayerId>; 2],
        now: DateTime<Utc>,
    ) -> MatchId {
        let id = generate_match_id();
        let seq = self.next_seq;
        self.next_seq += 1;

        for player_id in teams[0].iter().chain(teams[1].iter()) {
            match self.stats.get_mut(player_id) {
                Some(stats) => stats.mark_placed(court, now),
                None => warn!(%player_id, "committed player has no stats record"),
            }
        }

        info!(
            court,
            seq,
            team_a = ?teams[0],
            team_b = ?teams[1],
            "match committed"
        );
        self.matches.push(Match {
            id,
            seq,
            court,
            teams,
            status: MatchStatus::Waiting,
            score: None,
            created_at: now,
            started_at: None,
            ended_at: None,
        });
        self.summary.courts_filled += 1;
        id
    }

    /// Manually place a match, validating every active-player invariant.
    ///
    /// Rejected atomically: nothing is mutated unless every check passes.
    pub fn create_manual_match(
        &mut self,
        court: usize,
        teams: [Vec<PlayerId>; 2],
        now: DateTime<Utc>,
    ) -> Result<MatchId> {
        let reject = |reason: String| -> Result<MatchId> {
            Err(SchedulerError::InvalidMatchEdit { reason }.into())
        };

        if court == 0 || court > self.court_count {
            return reject(format!("court {court} out of range"));
        }
        if self.empty_courts().iter().all(|&c| c != court) {
            return reject(format!("court {court} is occupied"));
        }
        if teams[0].len() != self.team_size || teams[1].len() != self.team_size {
            return reject(format!(
                "teams must have exactly {} players each",
                self.team_size
            ));
        }
        let mut seen: Vec<&PlayerId> = Vec::new();
        for player_id in teams[0].iter().chain(teams[1].iter()) {
            if !self.players.contains_key(player_id) {
                return reject(format!("player {player_id} is not active"));
            }
            if self.open_match_of(player_id).is_some() {
                return reject(format!("player {player_id} is already on a court"));
            }
            if seen.contains(&player_id) {
                return reject(format!("player {player_id} appears twice"));
            }
            seen.push(player_id);
        }

        Ok(self.commit_match(court, teams, now))
    }

    /// Mark a waiting match as underway
    pub fn start_match(&mut self, match_id: MatchId, now: DateTime<Utc>) -> Result<()> {
        let m = self
            .match_by_id_mut(match_id)
            .ok_or_else(|| SchedulerError::MatchNotFound {
                match_id: match_id.to_string(),
            })?;
        if m.status != MatchStatus::Waiting {
            return Err(SchedulerError::InvalidMatchEdit {
                reason: format!("match is {}, not waiting", m.status),
            }
            .into());
        }
        m.status = MatchStatus::InProgress;
        m.started_at = Some(now);
        Ok(())
    }

    /// Finalize a match with a score and run the single stats-mutation pass.
    ///
    /// Everyone in the match returns to the waiting pool; every other idle
    /// player's courts-since-last-played counter ticks up by one.
    pub fn apply_completion(
        &mut self,
        match_id: MatchId,
        score: MatchScore,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let winner = score.winner().ok_or_else(|| SchedulerError::InvalidMatchEdit {
            reason: "match score cannot be a draw".to_string(),
        })?;

        let (teams, court, seq) = {
            let m = self
                .match_by_id_mut(match_id)
                .ok_or_else(|| SchedulerError::MatchNotFound {
                    match_id: match_id.to_string(),
                })?;
            if !m.status.is_open() {
                return Err(SchedulerError::InvalidMatchEdit {
                    reason: format!("match is already {}", m.status),
                }
                .into());
            }
            m.status = MatchStatus::Completed;
            m.score = Some(score);
            m.ended_at = Some(now);
            (m.teams.clone(), m.court, m.seq)
        };

        // Tick idle counters before touching the finishing players, so the
        // finishing court never counts against its own occupants.
        let idle: Vec<PlayerId> = self
            .waiting_ids()
            .into_iter()
            .filter(|id| !teams[0].contains(id) && !teams[1].contains(id))
            .collect();
        for player_id in idle {
            if let Some(stats) = self.stats.get_mut(&player_id) {
                stats.courts_since_last_played += 1;
            }
        }

        for (team_idx, team) in teams.iter().enumerate() {
            let won = team_idx == winner;
            let points_for = score.team_points[team_idx];
            let points_against = score.team_points[1 - team_idx];
            let partners: Vec<PlayerId> = team.clone();
            let opponents: Vec<PlayerId> = teams[1 - team_idx].clone();

            for player_id in team {
                let Some(stats) = self.stats.get_mut(player_id) else {
                    // Inconsistent state: skip the player, never crash the pass
                    warn!(%player_id, "completed player has no stats record, skipping");
                    continue;
                };
                stats.record_game(
                    won,
                    points_for,
                    points_against,
                    partners.iter().filter(|p| *p != player_id),
                    opponents.iter(),
                );
                stats.mark_waiting(now);
            }
        }

        self.completed_matches += 1;
        self.summary.matches_completed += 1;
        info!(court, seq, score = ?score.team_points, "match completed");
        Ok(())
    }

    /// Abandon an open match without a counted result.
    ///
    /// Players return to the waiting pool; no performance stats change and
    /// no idle counters tick (nothing completed).
    pub fn apply_forfeit(&mut self, match_id: MatchId, now: DateTime<Utc>) -> Result<()> {
        let teams = {
            let m = self
                .match_by_id_mut(match_id)
                .ok_or_else(|| SchedulerError::MatchNotFound {
                    match_id: match_id.to_string(),
                })?;
            if !m.status.is_open() {
                return Err(SchedulerError::InvalidMatchEdit {
                    reason: format!("match is already {}", m.status),
                }
                .into());
            }
            m.status = MatchStatus::Forfeited;
            m.ended_at = Some(now);
            m.teams.clone()
        };

        for player_id in teams[0].iter().chain(teams[1].iter()) {
            if let Some(stats) = self.stats.get_mut(player_id) {
                stats.mark_waiting(now);
            }
        }
        self.summary.matches_forfeited += 1;
        Ok(())
    }
}
