//! Constraint predicate set
//!
//! Pure functions answering "may player A and player B share a court as
//! partners/opponents right now". Checks are applied in a fixed order and
//! any failure rejects the pair: banned pair, locked team, roaming range,
//! repetition gap, partner-opponent-partner social pattern, and finally
//! bracket compatibility for cross-half mixing.

use crate::constraint::adaptive::ConstraintProfile;
use crate::rating::ranking::RankTable;
use crate::session::state::Session;
use crate::types::{PairRole, PlayerId};
use tracing::trace;

/// Completed courts required before top-half and bottom-half players may mix
pub const MIN_COURTS_BEFORE_MIXING: u32 = 2;

/// Everything a predicate needs to evaluate one pair
#[derive(Clone, Copy)]
pub struct ConstraintContext<'a> {
    pub session: &'a Session,
    pub ranks: &'a RankTable,
    pub profile: &'a ConstraintProfile,
}

impl<'a> ConstraintContext<'a> {
    pub fn new(session: &'a Session, ranks: &'a RankTable, profile: &'a ConstraintProfile) -> Self {
        Self {
            session,
            ranks,
            profile,
        }
    }
}

/// May `a` and `b` share a court in the given role right now?
///
/// `provisional_override` forces the roaming-range bypass that provisional
/// players normally get, regardless of either player's game count.
pub fn can_play_together(
    ctx: &ConstraintContext<'_>,
    a: &str,
    b: &str,
    role: PairRole,
    provisional_override: bool,
) -> bool {
    can_play_together_in_group(ctx, a, b, role, None, provisional_override)
}

/// Pair predicate with group awareness: a locked team only binds when the
/// locked partner is actually part of the proposed grouping. Without a group
/// the lock is treated as always binding.
fn can_play_together_in_group(
    ctx: &ConstraintContext<'_>,
    a: &str,
    b: &str,
    role: PairRole,
    group: Option<&[PlayerId]>,
    provisional_override: bool,
) -> bool {
    // 1. Banned pairs are permanent and non-relaxable
    if ctx.session.config().is_banned(a, b) {
        trace!(a, b, "rejected: banned pair");
        return false;
    }

    // 2. Locked teams force partnerships
    if !lock_permits(ctx, a, b, role, group) || !lock_permits(ctx, b, a, role, group) {
        trace!(a, b, %role, "rejected: locked team");
        return false;
    }

    // 3. Roaming range, bypassed while ratings are not yet trustworthy
    let bypass_roaming = provisional_override
        || ctx.ranks.is_provisional(a)
        || ctx.ranks.is_provisional(b);
    if !bypass_roaming && !ctx.ranks.in_mutual_range(a, b, ctx.profile.roaming_range_pct) {
        trace!(a, b, "rejected: outside roaming range");
        return false;
    }

    // 4. Repetition gap, evaluated per player because game counts diverge
    let gap = match role {
        PairRole::Partner => ctx.profile.partner_gap,
        PairRole::Opponent => ctx.profile.opponent_gap,
    };
    if !gap_satisfied(ctx, a, b, role, gap) || !gap_satisfied(ctx, b, a, role, gap) {
        trace!(a, b, %role, gap, "rejected: repetition gap");
        return false;
    }

    // 5. Partner-opponent-partner pattern, once the balance weight activates it
    if role == PairRole::Partner
        && ctx.profile.social_pattern_active()
        && social_pattern_blocks(ctx, a, b)
    {
        trace!(a, b, "rejected: partner-opponent-partner pattern");
        return false;
    }

    // 6. Bracket compatibility gates premature top/bottom mixing
    if premature_bracket_mixing(ctx, a, b) {
        trace!(a, b, "rejected: premature bracket mixing");
        return false;
    }

    true
}

/// Group-level legality: every pairwise combination in the proposed split
/// must pass, partners within a team and opponents across teams.
pub fn can_all_play_together(ctx: &ConstraintContext<'_>, teams: &[Vec<PlayerId>; 2]) -> bool {
    let group: Vec<PlayerId> = teams[0]
        .iter()
        .chain(teams[1].iter())
        .cloned()
        .collect();

    for team in teams {
        for (i, a) in team.iter().enumerate() {
            for b in &team[i + 1..] {
                if !can_play_together_in_group(ctx, a, b, PairRole::Partner, Some(&group), false) {
                    return false;
                }
            }
        }
    }
    for a in &teams[0] {
        for b in &teams[1] {
            if !can_play_together_in_group(ctx, a, b, PairRole::Opponent, Some(&group), false) {
                return false;
            }
        }
    }
    true
}

/// Does `a`'s lock state permit sharing a court with `b` in this role?
fn lock_permits(
    ctx: &ConstraintContext<'_>,
    a: &str,
    b: &str,
    role: PairRole,
    group: Option<&[PlayerId]>,
) -> bool {
    let Some(locked) = ctx.session.config().locked_partner(a) else {
        return true;
    };
    match role {
        // A locked pair may never oppose each other
        PairRole::Opponent => locked != b,
        PairRole::Partner => {
            if locked == b {
                return true;
            }
            // Partnering someone else is fine only when the locked partner
            // is not part of the grouping under consideration
            match group {
                Some(members) => !members.iter().any(|m| m == locked),
                None => false,
            }
        }
    }
}

/// Has `a` personally played enough games since last sharing `role` with `b`?
fn gap_satisfied(ctx: &ConstraintContext<'_>, a: &str, b: &str, role: PairRole, gap: u32) -> bool {
    let Some(stats) = ctx.session.stats_for(a) else {
        // Inconsistent state is skipped defensively, not fatal
        return true;
    };
    let since = match role {
        PairRole::Partner => stats.games_since_partnered(b),
        PairRole::Opponent => stats.games_since_opposed(b),
    };
    match since {
        Some(since) => since >= gap,
        None => true,
    }
}

/// Blocks re-partnering two players whose most recent relationship was as
/// opponents right after being partners, unless both have since played an
/// intervening game. A one-sided gap still blocks.
fn social_pattern_blocks(ctx: &ConstraintContext<'_>, a: &str, b: &str) -> bool {
    let (Some(stats_a), Some(stats_b)) = (ctx.session.stats_for(a), ctx.session.stats_for(b))
    else {
        return false;
    };

    let pattern_present = |stats: &crate::session::stats::PlayerStats, other: &str| {
        match (
            stats.partner_last_game.get(other),
            stats.opponent_last_game.get(other),
        ) {
            (Some(partnered), Some(opposed)) => opposed > partnered,
            _ => false,
        }
    };

    if !pattern_present(stats_a, b) && !pattern_present(stats_b, a) {
        return false;
    }

    // Both players must have an intervening game since being opponents
    let a_recovered = stats_a.games_since_opposed(b).is_some_and(|g| g >= 1);
    let b_recovered = stats_b.games_since_opposed(a).is_some_and(|g| g >= 1);
    !(a_recovered && b_recovered)
}

/// Inter-court mixing gate: two players coming off different courts who sit
/// in opposite halves of the field may not be combined until enough courts
/// have completed. Players sharing a court, or without court history, are
/// never an inter-court mixing decision.
fn premature_bracket_mixing(ctx: &ConstraintContext<'_>, a: &str, b: &str) -> bool {
    if ctx.session.completed_matches() >= MIN_COURTS_BEFORE_MIXING {
        return false;
    }
    let (Some(stats_a), Some(stats_b)) = (ctx.session.stats_for(a), ctx.session.stats_for(b))
    else {
        return false;
    };
    let (Some(court_a), Some(court_b)) =
        (stats_a.courts_played.last(), stats_b.courts_played.last())
    else {
        return false;
    };
    if court_a == court_b {
        return false;
    }
    match (ctx.ranks.in_top_half(a), ctx.ranks.in_top_half(b)) {
        (Some(a_top), Some(b_top)) => a_top != b_top,
        _ => false,
    }
}
