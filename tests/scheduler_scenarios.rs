//! End-to-end scheduling scenarios
//!
//! These tests drive the engine the way a real club night does: seed a
//! roster, fill courts, report scores, and check the variety and fairness
//! guarantees over multiple rounds.

mod fixtures;

use chrono::Duration;
use club_night::config::{AdaptiveMode, SessionConfig};
use club_night::rating::RankTable;
use club_night::types::{MatchScore, Player};

use fixtures::{assert_session_sound, complete_open_matches, create_seeded_session, create_test_engine};

#[test]
fn test_first_round_is_rating_homogeneous() {
    let (engine, _) = create_test_engine();
    let mut session = create_seeded_session(16, 4, SessionConfig::default());

    let filled = engine.evaluate_and_populate_courts(&mut session).unwrap();
    assert_eq!(filled, 4);
    assert_session_sound(&session);

    // Contiguous rating blocks: the strongest four share a court, and so on
    let ranks = RankTable::for_session(&session);
    for game in session.matches() {
        let mut positions: Vec<usize> = game
            .teams
            .iter()
            .flatten()
            .map(|id| ranks.rank_of(id).unwrap())
            .collect();
        positions.sort_unstable();
        assert_eq!(positions[3] - positions[0], 3, "court not a contiguous block");
    }
}

#[test]
fn test_full_evening_stays_structurally_sound() {
    let (engine, clock) = create_test_engine();
    let mut session = create_seeded_session(18, 4, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    for _ in 0..8 {
        clock.advance(Duration::minutes(15));
        let closed = complete_open_matches(&engine, &mut session, MatchScore::new(11, 7));
        assert!(closed > 0);
        assert_session_sound(&session);
    }
    assert!(session.completed_matches() >= 16);
}

#[test]
fn test_population_is_deterministic() {
    let (engine_a, _) = create_test_engine();
    let (engine_b, _) = create_test_engine();
    let mut left = create_seeded_session(16, 4, SessionConfig::default());
    let mut right = left.clone();

    engine_a.evaluate_and_populate_courts(&mut left).unwrap();
    engine_b.evaluate_and_populate_courts(&mut right).unwrap();

    // Same inputs, same pairings and same court order
    let pairings = |s: &club_night::session::Session| -> Vec<_> {
        s.matches().iter().map(|m| (m.court, m.teams.clone())).collect()
    };
    assert_eq!(pairings(&left), pairings(&right));
}

#[test]
fn test_idle_player_becomes_must_play_and_is_seated() {
    let (engine, clock) = create_test_engine();
    // 10 players, 2 courts: two sit out each round
    let mut session = create_seeded_session(10, 2, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    let benched = engine.get_waiting_players(&session);
    assert_eq!(benched.len(), 2);
    let watched = benched[0].clone();

    // Run rounds until the watched player is guaranteed a court. The
    // must-play counter allows at most two completed courts in between.
    let mut courts_while_benched = 0;
    for _ in 0..6 {
        clock.advance(Duration::minutes(15));
        let closed = complete_open_matches(&engine, &mut session, MatchScore::new(11, 5));
        if session.is_waiting(&watched) {
            courts_while_benched += closed as u32;
            assert!(
                courts_while_benched <= 3,
                "{watched} benched through too many courts"
            );
        } else {
            return;
        }
    }
    panic!("{watched} never reached a court");
}

#[test]
fn test_partner_gap_prevents_immediate_repeat() {
    let (engine, clock) = create_test_engine();
    let mut session = create_seeded_session(8, 2, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    let first_pairs: Vec<Vec<String>> = session
        .matches()
        .iter()
        .flat_map(|m| m.teams.clone())
        .map(|mut team| {
            team.sort();
            team
        })
        .collect();

    clock.advance(Duration::minutes(15));
    complete_open_matches(&engine, &mut session, MatchScore::new(11, 8));

    // With all eight players free again, the default partner gap of three
    // forbids every first-round partnership from re-forming
    let second_pairs: Vec<Vec<String>> = session
        .matches()
        .iter()
        .filter(|m| m.is_open())
        .flat_map(|m| m.teams.clone())
        .map(|mut team| {
            team.sort();
            team
        })
        .collect();
    assert_eq!(second_pairs.len(), 4);
    for pair in &second_pairs {
        assert!(!first_pairs.contains(pair), "partnership {pair:?} repeated");
    }
}

#[test]
fn test_banned_pair_never_meets() {
    let (engine, clock) = create_test_engine();
    let mut config = SessionConfig::default();
    config.ban_pair("p01", "p02");
    let mut session = create_seeded_session(8, 2, config);
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    for _ in 0..6 {
        for game in session.matches().iter().filter(|m| m.is_open()) {
            let together = game.contains("p01") && game.contains("p02");
            assert!(!together, "banned pair shared a court");
        }
        clock.advance(Duration::minutes(15));
        complete_open_matches(&engine, &mut session, MatchScore::new(11, 6));
    }
}

#[test]
fn test_locked_team_always_partners() {
    let (engine, clock) = create_test_engine();
    let mut config = SessionConfig::default();
    config.lock_team("p03", "p04");
    let mut session = create_seeded_session(8, 2, config);
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    for _ in 0..5 {
        for game in session.matches().iter().filter(|m| m.is_open()) {
            if game.contains("p03") && game.contains("p04") {
                assert_eq!(
                    game.team_of("p03"),
                    game.team_of("p04"),
                    "locked pair placed as opponents"
                );
            }
        }
        clock.advance(Duration::minutes(15));
        complete_open_matches(&engine, &mut session, MatchScore::new(11, 9));
    }
}

#[test]
fn test_adaptive_late_phase_relaxes_roaming() {
    let (engine, clock) = create_test_engine();
    let mut session = create_seeded_session(16, 4, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    // Measure the window at the same rank position in both phases so the
    // comparison is unaffected by players moving through the table
    let mid_ranked = |s: &club_night::session::Session| {
        RankTable::for_session(s).ids_by_rank().nth(7).unwrap().clone()
    };

    let probe = mid_ranked(&session);
    let (early_lo, early_hi) = engine.get_roaming_range(&session, &probe).unwrap();

    // Push the session deep into the late phase
    for _ in 0..3 {
        clock.advance(Duration::minutes(15));
        complete_open_matches(&engine, &mut session, MatchScore::new(11, 4));
    }
    assert!(session.completed_matches() >= 8);

    let probe = mid_ranked(&session);
    let (late_lo, late_hi) = engine.get_roaming_range(&session, &probe).unwrap();
    assert!(
        late_hi - late_lo > early_hi - early_lo,
        "late-phase window should be wider than early-phase"
    );
}

#[test]
fn test_manual_adaptive_mode_pins_balance_weight() {
    let (engine, _) = create_test_engine();
    let mut session = create_seeded_session(16, 4, SessionConfig::default());

    engine
        .set_adaptive_mode(&mut session, AdaptiveMode::Manual { weight: 5.0 })
        .unwrap();
    assert_eq!(
        session.config().adaptive_mode,
        AdaptiveMode::Manual { weight: 5.0 }
    );
    assert_session_sound(&session);
}

#[test]
fn test_forfeit_releases_without_stats_change() {
    let (engine, clock) = create_test_engine();
    let mut session = create_seeded_session(8, 2, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    let game = session.matches()[0].clone();
    let participant = game.teams[0][0].clone();
    clock.advance(Duration::minutes(5));
    engine.forfeit_match(&mut session, game.id).unwrap();

    let stats = session.stats_for(&participant).unwrap();
    assert_eq!(stats.games_played, 0);
    assert_eq!(session.completed_matches(), 0);
    assert_session_sound(&session);
}

#[test]
fn test_draw_scores_are_rejected() {
    let (engine, _) = create_test_engine();
    let mut session = create_seeded_session(8, 2, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    let match_id = session.matches()[0].id;
    let err = engine
        .complete_match(&mut session, match_id, MatchScore::new(9, 9))
        .unwrap_err();
    assert!(err.to_string().contains("draw"));
}

#[test]
fn test_late_arrival_joins_next_opening() {
    let (engine, clock) = create_test_engine();
    let mut session = create_seeded_session(8, 2, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();

    engine
        .add_player(&mut session, Player::new("late1", "Late One"))
        .unwrap();
    assert!(session.is_waiting("late1"));

    // Keep playing until the newcomer is seated
    for _ in 0..4 {
        clock.advance(Duration::minutes(15));
        complete_open_matches(&engine, &mut session, MatchScore::new(11, 7));
        if !session.is_waiting("late1") {
            assert_session_sound(&session);
            return;
        }
    }
    panic!("late arrival never seated");
}

#[test]
fn test_simulation_does_not_leak_into_live_session() {
    let (engine, _) = create_test_engine();
    let mut session = create_seeded_session(16, 4, SessionConfig::default());
    engine.evaluate_and_populate_courts(&mut session).unwrap();
    let before = session.clone();

    let match_id = session.matches()[0].id;
    let trial = engine
        .simulate_completion(&session, match_id, MatchScore::new(11, 1))
        .unwrap();

    assert_eq!(session, before);
    assert_eq!(trial.completed_matches(), 1);
}
