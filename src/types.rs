//! Common types used throughout the matchmaking engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Relationship two players can have inside a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairRole {
    Partner,
    Opponent,
}

impl std::fmt::Display for PairRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairRole::Partner => write!(f, "partner"),
            PairRole::Opponent => write!(f, "opponent"),
        }
    }
}

/// Lifecycle status of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Committed to a court, play has not started yet
    Waiting,
    /// Play is underway
    InProgress,
    /// Finalized with a score
    Completed,
    /// Abandoned without a counted result
    Forfeited,
}

impl MatchStatus {
    /// A match still occupying its court
    pub fn is_open(self) -> bool {
        matches!(self, MatchStatus::Waiting | MatchStatus::InProgress)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Waiting => write!(f, "waiting"),
            MatchStatus::InProgress => write!(f, "in-progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Forfeited => write!(f, "forfeited"),
        }
    }
}

/// Immutable player identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Optional pre-seeded skill value, consulted only before any games are played
    pub seed_rating: Option<f64>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            seed_rating: None,
        }
    }

    pub fn with_seed_rating(id: impl Into<PlayerId>, name: impl Into<String>, seed: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            seed_rating: Some(seed),
        }
    }
}

/// Final score of a match, indexed by team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub team_points: [u16; 2],
}

impl MatchScore {
    pub fn new(team_a: u16, team_b: u16) -> Self {
        Self {
            team_points: [team_a, team_b],
        }
    }

    /// Index of the winning team, or `None` for a draw
    pub fn winner(&self) -> Option<usize> {
        match self.team_points[0].cmp(&self.team_points[1]) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Point margin from the perspective of `team` (negative when losing)
    pub fn margin_for(&self, team: usize) -> i32 {
        let own = i32::from(self.team_points[team]);
        let other = i32::from(self.team_points[1 - team]);
        own - other
    }
}

/// A scheduled game on one court
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Session-scoped ordinal, assigned at commit time
    pub seq: u32,
    pub court: usize,
    /// Two teams of player ids (size 1 for singles, 2 for doubles)
    pub teams: [Vec<PlayerId>; 2],
    pub status: MatchStatus,
    pub score: Option<MatchScore>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Match {
    /// All player ids across both teams
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.teams[0].iter().chain(self.teams[1].iter())
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players().any(|id| id == player_id)
    }

    /// Team index for a player in this match
    pub fn team_of(&self, player_id: &str) -> Option<usize> {
        if self.teams[0].iter().any(|id| id == player_id) {
            Some(0)
        } else if self.teams[1].iter().any(|id| id == player_id) {
            Some(1)
        } else {
            None
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
