//! Reconciliation of two snapshots of the same account.
//!
//! Local and remote saves can diverge when the same account is used from
//! more than one device. Rather than field-by-field conflict resolution,
//! the snapshot with more overall progress wins wholesale, and a few
//! fields where "more" is unambiguous (level, lifetime EXP, titles,
//! notifications) take the better of both sides. The merge is
//! deterministic, commutative up to the local-wins tie rule, and
//! idempotent: merging a state with itself returns it unchanged.

use crate::constants::MAX_NOTIFICATIONS;
use crate::core::player::PlayerState;

/// Scalar progress weight used to pick the winning snapshot. Level
/// dominates, lifetime EXP breaks level ties.
fn progress_weight(state: &PlayerState) -> u64 {
    (state.level as u64).saturating_mul(10_000) + state.cumulative_exp
}

/// Merges a remote snapshot into the local one, returning the
/// reconciled state. Ties go to local.
pub fn merge_states(local: &PlayerState, remote: &PlayerState) -> PlayerState {
    let (winner, loser) = if progress_weight(remote) > progress_weight(local) {
        (remote, local)
    } else {
        (local, remote)
    };
    let mut merged = winner.clone();

    // Progress never regresses even when the winner is behind on one axis.
    merged.level = winner.level.max(loser.level);
    merged.cumulative_exp = winner.cumulative_exp.max(loser.cumulative_exp);
    merged.recompute_rank();

    // Titles are a set: an unlock on either device survives the merge.
    for title in &loser.titles_unlocked {
        merged.unlock_title(title);
    }

    // Interleave both notification logs, newest first, dropping the
    // duplicates that exist on both sides from a common ancestor save.
    for n in &loser.notifications {
        if !merged.notifications.iter().any(|m| m.id == n.id) {
            merged.notifications.push(n.clone());
        }
    }
    merged
        .notifications
        .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.notifications.truncate(MAX_NOTIFICATIONS);

    // Account lifetime spans both histories.
    merged.created_at = winner.created_at.min(loser.created_at);
    merged.last_saved_at = winner.last_saved_at.max(loser.last_saved_at);

    merged
}
