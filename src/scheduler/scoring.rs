//! Match scoring and selection
//!
//! Given exactly one court's worth of candidates, enumerate every team split
//! (three for doubles, one for singles), discard the illegal ones, and score
//! the survivors by rating balance and variety. The first round of a session
//! uses a different strategy entirely: rating-sorted homogeneous courts,
//! because no history exists for the scorer to work with.

use crate::constraint::predicates::{can_all_play_together, ConstraintContext};
use crate::rating::engine::BASE_RATING;
use crate::rating::ranking::RankTable;
use crate::session::state::Session;
use crate::types::PlayerId;
use crate::utils::rating_difference;

/// Penalty scale for re-partnering a recent partner
pub const SOFT_PARTNER_REPEAT_PENALTY: f64 = 120.0;
/// Penalty scale for re-opposing a recent opponent
pub const SOFT_OPPONENT_REPEAT_PENALTY: f64 = 80.0;
/// Flat penalty when a legal partner-opponent-partner pattern is present
pub const SOCIAL_PATTERN_PENALTY: f64 = 60.0;

/// Balance weight at which close-skill partnerships earn a bonus
const CLOSE_PARTNER_WEIGHT_THRESHOLD: f64 = 4.0;
/// Rating span under which partners count as close-skill
const CLOSE_PARTNER_SPAN: f64 = 100.0;
const CLOSE_PARTNER_BONUS_SCALE: f64 = 0.5;

/// Every way to partition the candidates into two equal teams.
///
/// Fixed arity by design: doubles has exactly three splits, singles one.
/// Candidate order is preserved inside each split so downstream tie-breaks
/// stay deterministic.
pub fn enumerate_splits(candidates: &[PlayerId]) -> Vec<[Vec<PlayerId>; 2]> {
    match candidates {
        [a, b] => vec![[vec![a.clone()], vec![b.clone()]]],
        [a, b, c, d] => vec![
            [vec![a.clone(), b.clone()], vec![c.clone(), d.clone()]],
            [vec![a.clone(), c.clone()], vec![b.clone(), d.clone()]],
            [vec![a.clone(), d.clone()], vec![b.clone(), c.clone()]],
        ],
        _ => Vec::new(),
    }
}

/// Score one split: higher is better.
///
/// Balance term: negative penalty proportional to the summed-rating
/// difference, scaled by the adaptive balance weight. Variety terms:
/// penalties for soft repetition even when not hard-blocked, a flat penalty
/// for a still-legal partner-opponent-partner pattern, and a close-skill
/// partnership bonus once balance dominates.
pub fn score_split(ctx: &ConstraintContext<'_>, teams: &[Vec<PlayerId>; 2]) -> f64 {
    let rating = |id: &str| ctx.ranks.rating_of(id).unwrap_or(BASE_RATING);
    let team_sum = |team: &[PlayerId]| team.iter().map(|id| rating(id)).sum::<f64>();

    let balance = -(team_sum(&teams[0]) - team_sum(&teams[1])).abs() * ctx.profile.balance_weight;

    let mut variety = 0.0;
    for team in teams {
        for (i, a) in team.iter().enumerate() {
            for b in &team[i + 1..] {
                if let Some(since) = pair_games_since(ctx, a, b, true) {
                    variety -= SOFT_PARTNER_REPEAT_PENALTY / (1.0 + f64::from(since));
                }
                if partner_opponent_partner(ctx, a, b) {
                    variety -= SOCIAL_PATTERN_PENALTY;
                }
            }
        }
    }
    for a in &teams[0] {
        for b in &teams[1] {
            if let Some(since) = pair_games_since(ctx, a, b, false) {
                variety -= SOFT_OPPONENT_REPEAT_PENALTY / (1.0 + f64::from(since));
            }
        }
    }

    let mut bonus = 0.0;
    if ctx.profile.balance_weight >= CLOSE_PARTNER_WEIGHT_THRESHOLD {
        for team in teams {
            if let [a, b] = team.as_slice() {
                let span = rating_difference(rating(a), rating(b));
                bonus += (CLOSE_PARTNER_SPAN - span).max(0.0) * CLOSE_PARTNER_BONUS_SCALE;
            }
        }
    }

    balance + variety + bonus
}

/// The best legal split for a fixed candidate set, with its score.
/// Ties keep the earliest-enumerated split.
pub fn best_split(
    ctx: &ConstraintContext<'_>,
    candidates: &[PlayerId],
) -> Option<([Vec<PlayerId>; 2], f64)> {
    let mut best: Option<([Vec<PlayerId>; 2], f64)> = None;
    for teams in enumerate_splits(candidates) {
        if !can_all_play_together(ctx, &teams) {
            continue;
        }
        let score = score_split(ctx, &teams);
        if best.as_ref().is_none_or(|(_, s)| score > *s) {
            best = Some((teams, score));
        }
    }
    best
}

/// First-round assignment: rating-sorted contiguous blocks, one per court,
/// each block split first-and-last against the middle so courts are
/// skill-homogeneous but internally balanced.
pub fn first_round_assignments(
    session: &Session,
    ranks: &RankTable,
) -> Vec<(usize, [Vec<PlayerId>; 2])> {
    let per_court = session.players_per_court();
    let mut available: Vec<PlayerId> = ranks
        .ids_by_rank()
        .filter(|id| session.is_waiting(id))
        .cloned()
        .collect();

    let mut assignments = Vec::new();
    for court in session.empty_courts() {
        let Some(block) = take_block(session, &mut available, per_court) else {
            break;
        };
        let teams = match block.as_slice() {
            [a, b] => [vec![a.clone()], vec![b.clone()]],
            [a, b, c, d] => {
                // Preferred split is 1&4 vs 2&3; locked teammates landing in
                // the same block override that preference
                let preferred = [
                    [vec![a.clone(), d.clone()], vec![b.clone(), c.clone()]],
                    [vec![a.clone(), c.clone()], vec![b.clone(), d.clone()]],
                    [vec![a.clone(), b.clone()], vec![c.clone(), d.clone()]],
                ];
                match preferred
                    .iter()
                    .position(|teams| split_keeps_locks(session, teams))
                {
                    Some(i) => preferred[i].clone(),
                    None => continue,
                }
            }
            _ => continue,
        };
        assignments.push((court, teams));
    }
    assignments
}

/// Take the next rating-adjacent block, skipping players banned against
/// someone already chosen for it. Skipped players stay available for a
/// later court.
fn take_block(
    session: &Session,
    available: &mut Vec<PlayerId>,
    per_court: usize,
) -> Option<Vec<PlayerId>> {
    let mut picked: Vec<usize> = Vec::with_capacity(per_court);
    for (i, id) in available.iter().enumerate() {
        let clashes = picked
            .iter()
            .any(|&j| session.config().is_banned(id, &available[j]));
        if !clashes {
            picked.push(i);
            if picked.len() == per_court {
                break;
            }
        }
    }
    if picked.len() < per_court {
        return None;
    }
    let mut block = Vec::with_capacity(per_court);
    for &i in picked.iter().rev() {
        block.push(available.remove(i));
    }
    block.reverse();
    Some(block)
}

/// True when no locked pair within the split sits on opposite teams
fn split_keeps_locks(session: &Session, teams: &[Vec<PlayerId>; 2]) -> bool {
    for (side, team) in teams.iter().enumerate() {
        for id in team {
            if let Some(partner) = session.config().locked_partner(id) {
                if teams[1 - side].contains(partner) {
                    return false;
                }
            }
        }
    }
    true
}

/// Games since the pair last met in the given role, from both players'
/// perspectives; `None` when they never have. The smaller side governs the
/// penalty because it is the fresher memory.
fn pair_games_since(
    ctx: &ConstraintContext<'_>,
    a: &str,
    b: &str,
    as_partners: bool,
) -> Option<u32> {
    let stats_a = ctx.session.stats_for(a)?;
    let stats_b = ctx.session.stats_for(b)?;
    let (since_a, since_b) = if as_partners {
        (
            stats_a.games_since_partnered(b)?,
            stats_b.games_since_partnered(a)?,
        )
    } else {
        (
            stats_a.games_since_opposed(b)?,
            stats_b.games_since_opposed(a)?,
        )
    };
    Some(since_a.min(since_b))
}

/// Soft variant of the social-pattern test: true whenever the most recent
/// relationship between the pair was opponents immediately after partners,
/// legal or not.
fn partner_opponent_partner(ctx: &ConstraintContext<'_>, a: &str, b: &str) -> bool {
    let Some(stats) = ctx.session.stats_for(a) else {
        return false;
    };
    match (
        stats.partner_last_game.get(b),
        stats.opponent_last_game.get(b),
    ) {
        (Some(partnered), Some(opposed)) => opposed > partnered,
        _ => false,
    }
}
