//! Court-population scheduler and public engine API
//!
//! The orchestrating loop: for each empty court, pull priority-ordered
//! waiting candidates, ask selection for the best legal grouping, commit it,
//! repeat until no court can be filled. Every public operation that changes
//! scheduling inputs (completion, roster edits, configuration) runs the loop
//! to completion before returning.

use crate::clock::{Clock, SystemClock};
use crate::config::AdaptiveMode;
use crate::constraint::adaptive::{effective_profile, ConstraintProfile};
use crate::constraint::predicates::ConstraintContext;
use crate::error::Result;
use crate::rating::ranking::RankTable;
use crate::scheduler::scoring::{best_split, first_round_assignments};
use crate::session::state::Session;
use crate::types::{MatchId, MatchScore, Player, PlayerId};
use crate::wait_queue::{ordered_waiters, WaitTierConfig};
use std::sync::Arc;
use tracing::{debug, info};

/// Hard cap on full passes per scheduling run, against runaway cycles
pub const MAX_POPULATE_ITERATIONS: usize = 10;

/// Most candidates considered per court, for bounded enumeration
pub const CANDIDATE_POOL_CAP: usize = 8;

/// The matchmaking engine: stateless apart from its clock, it operates on
/// whatever session it is handed.
pub struct MatchmakingEngine {
    clock: Arc<dyn Clock>,
    tier_config: WaitTierConfig,
}

impl Default for MatchmakingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchmakingEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tier_config: WaitTierConfig::default(),
        }
    }

    fn profile_for(&self, session: &Session) -> ConstraintProfile {
        effective_profile(
            session.config(),
            session.completed_matches(),
            session.player_count(),
            session.court_count(),
        )
    }

    /// Run the full court-population pass. Returns the number of courts
    /// filled. Finding nothing to fill is a normal outcome, not an error.
    pub fn evaluate_and_populate_courts(&self, session: &mut Session) -> Result<usize> {
        let now = self.clock.now();
        let mut filled = 0;

        for iteration in 0..MAX_POPULATE_ITERATIONS {
            let empty = session.empty_courts();
            if empty.is_empty() {
                break;
            }

            // Before any history exists, fill every court with rating-sorted
            // homogeneous blocks instead of running the scorer
            if session.is_first_round() {
                let ranks = RankTable::for_session(session);
                let assignments = first_round_assignments(session, &ranks);
                if assignments.is_empty() {
                    break;
                }
                info!(courts = assignments.len(), "first-round homogeneous fill");
                for (court, teams) in assignments {
                    session.commit_match(court, teams, now);
                    filled += 1;
                }
                continue;
            }

            let mut progressed = false;
            for court in empty {
                if let Some(teams) = self.pick_grouping(session, now)? {
                    session.commit_match(court, teams, now);
                    filled += 1;
                    progressed = true;
                }
            }
            if !progressed {
                debug!(iteration, "no legal grouping for any empty court, halting pass");
                break;
            }
        }
        Ok(filled)
    }

    /// Choose the best legal grouping from the current waiting pool, or
    /// `None` when the court must stay empty.
    fn pick_grouping(
        &self,
        session: &Session,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<[Vec<PlayerId>; 2]>> {
        let needed = session.players_per_court();
        let waiters = ordered_waiters(session, now, &self.tier_config);
        if waiters.len() < needed {
            return Ok(None);
        }

        // Must-play players head the ordering, so the cap keeps them
        let pool: Vec<_> = waiters.into_iter().take(CANDIDATE_POOL_CAP).collect();
        let must: Vec<PlayerId> = pool
            .iter()
            .filter(|e| e.must_play)
            .take(needed)
            .map(|e| e.player_id.clone())
            .collect();
        let rest: Vec<PlayerId> = pool
            .iter()
            .map(|e| e.player_id.clone())
            .filter(|id| !must.contains(id))
            .collect();
        let free_slots = needed - must.len();

        let ranks = RankTable::for_session(session);
        let profile = self.profile_for(session);
        let ctx = ConstraintContext::new(session, &ranks, &profile);

        let mut best: Option<(f64, [Vec<PlayerId>; 2])> = None;
        for combo in index_combinations(rest.len(), free_slots) {
            let mut candidates = must.clone();
            candidates.extend(combo.into_iter().map(|i| rest[i].clone()));
            if let Some((teams, score)) = best_split(&ctx, &candidates) {
                if best.as_ref().is_none_or(|(s, _)| score > *s) {
                    best = Some((score, teams));
                }
            }
        }
        Ok(best.map(|(_, teams)| teams))
    }

    // --- lifecycle operations ----------------------------------------------

    /// Finalize a match with a score, update stats and refill courts.
    /// Returns the courts newly filled by the triggered pass.
    pub fn complete_match(
        &self,
        session: &mut Session,
        match_id: MatchId,
        score: MatchScore,
    ) -> Result<Vec<usize>> {
        session.apply_completion(match_id, score, self.clock.now())?;
        self.repopulate_tracking_courts(session)
    }

    /// Mark a committed match as underway
    pub fn start_match(&self, session: &mut Session, match_id: MatchId) -> Result<()> {
        session.start_match(match_id, self.clock.now())
    }

    /// Abandon a match without a result; the freed court is refilled
    pub fn forfeit_match(&self, session: &mut Session, match_id: MatchId) -> Result<Vec<usize>> {
        session.apply_forfeit(match_id, self.clock.now())?;
        self.repopulate_tracking_courts(session)
    }

    /// Add a player mid-session and try to seat them
    pub fn add_player(&self, session: &mut Session, player: Player) -> Result<usize> {
        session.add_player(player, self.clock.now())?;
        self.evaluate_and_populate_courts(session)
    }

    /// Remove a waiting player from the session
    pub fn remove_player(&self, session: &mut Session, player_id: &str) -> Result<Player> {
        let player = session.remove_player(player_id)?;
        self.evaluate_and_populate_courts(session)?;
        Ok(player)
    }

    /// Evaluate a hypothetical completion on an isolated copy of the session.
    /// The live session is never touched.
    pub fn simulate_completion(
        &self,
        session: &Session,
        match_id: MatchId,
        score: MatchScore,
    ) -> Result<Session> {
        let mut trial = session.clone();
        self.complete_match(&mut trial, match_id, score)?;
        Ok(trial)
    }

    fn repopulate_tracking_courts(&self, session: &mut Session) -> Result<Vec<usize>> {
        let before = session.empty_courts();
        self.evaluate_and_populate_courts(session)?;
        let after = session.empty_courts();
        Ok(before
            .into_iter()
            .filter(|court| !after.contains(court))
            .collect())
    }

    // --- read-only queries --------------------------------------------------

    /// Waiting players in wait-priority order
    pub fn get_waiting_players(&self, session: &Session) -> Vec<PlayerId> {
        ordered_waiters(session, self.clock.now(), &self.tier_config)
            .into_iter()
            .map(|e| e.player_id)
            .collect()
    }

    /// `(rank, rating)` for a player, rank 1 = highest
    pub fn get_player_ranking(&self, session: &Session, player_id: &str) -> Option<(usize, f64)> {
        let ranks = RankTable::for_session(session);
        Some((ranks.rank_of(player_id)?, ranks.rating_of(player_id)?))
    }

    /// The player's current permissible rank window under the effective
    /// (adaptive-aware) roaming percentage
    pub fn get_roaming_range(&self, session: &Session, player_id: &str) -> Option<(usize, usize)> {
        let ranks = RankTable::for_session(session);
        let profile = self.profile_for(session);
        ranks.roaming_window(player_id, profile.roaming_range_pct)
    }

    // --- configuration setters ----------------------------------------------

    /// Each setter clamps, applies, and triggers a re-population pass.
    pub fn set_roaming_range_pct(&self, session: &mut Session, pct: f64) -> Result<usize> {
        session.config_mut().roaming_range_pct = pct;
        session.config_mut().clamp();
        info!(pct = session.config().roaming_range_pct, "roaming range updated");
        self.evaluate_and_populate_courts(session)
    }

    pub fn set_partner_gap(&self, session: &mut Session, gap: u32) -> Result<usize> {
        session.config_mut().partner_gap = gap;
        info!(gap, "partner repetition gap updated");
        self.evaluate_and_populate_courts(session)
    }

    pub fn set_opponent_gap(&self, session: &mut Session, gap: u32) -> Result<usize> {
        session.config_mut().opponent_gap = gap;
        info!(gap, "opponent repetition gap updated");
        self.evaluate_and_populate_courts(session)
    }

    pub fn set_adaptive_mode(&self, session: &mut Session, mode: AdaptiveMode) -> Result<usize> {
        session.config_mut().adaptive_mode = mode;
        session.config_mut().clamp();
        info!(mode = %session.config().adaptive_mode, "adaptive mode updated");
        self.evaluate_and_populate_courts(session)
    }
}

/// All k-element index combinations of `0..n` in lexicographic order
fn index_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if k > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut combo: Vec<usize> = (0..k).collect();
    'outer: loop {
        out.push(combo.clone());
        let mut i = k - 1;
        loop {
            if combo[i] < i + n - k {
                combo[i] += 1;
                for j in i + 1..k {
                    combo[j] = combo[j - 1] + 1;
                }
                continue 'outer;
            }
            if i == 0 {
                break 'outer;
            }
            i -= 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::SessionConfig;
    use chrono::{TimeZone, Utc};

    fn engine_and_clock() -> (MatchmakingEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap(),
        ));
        (MatchmakingEngine::with_clock(clock.clone()), clock)
    }

    fn seeded_session(players: usize, courts: usize) -> Session {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap();
        let mut session = Session::new(courts, 2, SessionConfig::default(), now);
        for i in 1..=players {
            let seed = 2000.0 - (i as f64) * 25.0;
            session
                .add_player(
                    Player::with_seed_rating(format!("p{i:02}"), format!("Player {i}"), seed),
                    now,
                )
                .unwrap();
        }
        session
    }

    #[test]
    fn test_index_combinations() {
        assert_eq!(index_combinations(4, 0), vec![Vec::<usize>::new()]);
        assert_eq!(index_combinations(2, 3), Vec::<Vec<usize>>::new());
        assert_eq!(
            index_combinations(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(index_combinations(3, 3), vec![vec![0, 1, 2]]);
        assert_eq!(index_combinations(8, 4).len(), 70);
    }

    #[test]
    fn test_first_round_fills_all_courts() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(16, 4);

        let filled = engine.evaluate_and_populate_courts(&mut session).unwrap();
        assert_eq!(filled, 4);
        assert!(session.empty_courts().is_empty());
        assert!(session.waiting_ids().is_empty());
    }

    #[test]
    fn test_populate_with_too_few_players_is_normal() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(3, 2);

        let filled = engine.evaluate_and_populate_courts(&mut session).unwrap();
        assert_eq!(filled, 0);
        assert_eq!(session.empty_courts().len(), 2);
    }

    #[test]
    fn test_completion_triggers_refill() {
        let (engine, _) = engine_and_clock();
        // 20 players over 4 courts: 4 sit out the first round
        let mut session = seeded_session(20, 4);
        engine.evaluate_and_populate_courts(&mut session).unwrap();
        assert_eq!(session.waiting_ids().len(), 4);

        let match_id = session.matches()[0].id;
        let refilled = engine
            .complete_match(&mut session, match_id, MatchScore::new(11, 6))
            .unwrap();

        // The freed court was refilled from the 8 now-waiting players
        assert_eq!(refilled.len(), 1);
        assert!(session.empty_courts().is_empty());
    }

    #[test]
    fn test_forfeit_triggers_refill() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(20, 4);
        engine.evaluate_and_populate_courts(&mut session).unwrap();

        let match_id = session.matches()[1].id;
        let refilled = engine.forfeit_match(&mut session, match_id).unwrap();
        assert_eq!(refilled.len(), 1);
    }

    #[test]
    fn test_consecutive_passes_are_idempotent() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(16, 4);
        engine.evaluate_and_populate_courts(&mut session).unwrap();
        let snapshot = session.clone();

        // A second pass with no intervening event changes nothing
        let filled = engine.evaluate_and_populate_courts(&mut session).unwrap();
        assert_eq!(filled, 0);
        assert_eq!(session, snapshot);
    }

    #[test]
    fn test_simulation_leaves_live_session_untouched() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(16, 4);
        engine.evaluate_and_populate_courts(&mut session).unwrap();
        let snapshot = session.clone();

        let match_id = session.matches()[0].id;
        let trial = engine
            .simulate_completion(&session, match_id, MatchScore::new(11, 2))
            .unwrap();

        assert_eq!(session, snapshot);
        assert_eq!(trial.completed_matches(), 1);
        assert_ne!(trial, session);
    }

    #[test]
    fn test_config_setter_clamps_and_repopulates() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(16, 4);

        // Setter triggers the initial fill as its side effect
        engine.set_roaming_range_pct(&mut session, 0.01).unwrap();
        assert_eq!(
            session.config().roaming_range_pct,
            crate::config::MIN_ROAMING_RANGE_PCT
        );
        assert!(session.empty_courts().is_empty());
    }

    #[test]
    fn test_add_player_triggers_populate() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(3, 1);
        engine.evaluate_and_populate_courts(&mut session).unwrap();
        assert_eq!(session.empty_courts().len(), 1);

        engine
            .add_player(&mut session, Player::new("p99", "Late Arrival"))
            .unwrap();
        assert!(session.empty_courts().is_empty());
    }

    #[test]
    fn test_remove_player_on_court_rejected_atomically() {
        let (engine, _) = engine_and_clock();
        let mut session = seeded_session(16, 4);
        engine.evaluate_and_populate_courts(&mut session).unwrap();

        assert!(engine.remove_player(&mut session, "p01").is_err());
        assert_eq!(session.player_count(), 16);
    }
}
