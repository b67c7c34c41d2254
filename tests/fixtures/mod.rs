//! Test fixtures for scheduler integration testing

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use club_night::clock::ManualClock;
use club_night::config::SessionConfig;
use club_night::scheduler::MatchmakingEngine;
use club_night::session::Session;
use club_night::types::{MatchScore, Player};

pub fn session_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
}

/// Engine on a controllable clock pinned to the fixture session start
pub fn create_test_engine() -> (MatchmakingEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(session_start()));
    (MatchmakingEngine::with_clock(clock.clone()), clock)
}

/// Session seeded with `players` evenly spread self-assessed ratings.
/// Ids are "p01".."pNN" in descending seed order, so p01 starts strongest.
pub fn create_seeded_session(players: usize, courts: usize, config: SessionConfig) -> Session {
    let now = session_start();
    let mut session = Session::new(courts, 2, config, now);
    for i in 1..=players {
        let seed = 1900.0 - (i as f64) * 30.0;
        session
            .add_player(
                Player::with_seed_rating(format!("p{i:02}"), format!("Player {i}"), seed),
                now,
            )
            .unwrap();
    }
    session
}

/// Complete every open match with a fixed score, higher-seeded side winning
/// by team listing order. Returns the number of matches closed.
pub fn complete_open_matches(
    engine: &MatchmakingEngine,
    session: &mut Session,
    score: MatchScore,
) -> usize {
    let open: Vec<_> = session
        .matches()
        .iter()
        .filter(|m| m.is_open())
        .map(|m| m.id)
        .collect();
    for match_id in &open {
        engine.complete_match(session, *match_id, score).unwrap();
    }
    open.len()
}

/// Assert the structural invariants every populated session must hold:
/// no player on two courts, full teams, and courts within range.
pub fn assert_session_sound(session: &Session) {
    let mut seen = std::collections::HashSet::new();
    for game in session.matches().iter().filter(|m| m.is_open()) {
        assert!(game.court >= 1 && game.court <= session.court_count());
        for team in &game.teams {
            assert_eq!(team.len(), session.players_per_court() / 2);
            for id in team {
                assert!(seen.insert(id.clone()), "{id} seated on two courts");
                assert!(!session.is_waiting(id), "{id} both seated and waiting");
            }
        }
    }
}
