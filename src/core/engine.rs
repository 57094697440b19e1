//! The progression engine: quest completion, failure, penalties.
//!
//! Every function here is a state transition on [`PlayerState`] that
//! either applies fully or leaves the snapshot untouched. Transitions
//! return [`GameEvent`]s so the presentation layer (and the fire-and-forget
//! audio/visual collaborators) can react without game logic depending on
//! any UI types.

use crate::constants::{FAIL_PENALTY_RATIO, STAT_POINTS_PER_LEVEL};
use crate::core::player::{date_key, NotificationKind, PlayerState};
use crate::core::progression::{
    level_threshold, rank_award_modifier, streak_multiplier, Rank,
};
use crate::core::stats::{spend_stat_point, StatType};
use crate::core::task::TaskState;
use crate::error::GameError;

/// A domain event produced by a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    TaskCompleted {
        task_id: String,
        exp_earned: u64,
        stat: StatType,
    },
    LeveledUp {
        new_level: u32,
        points_awarded: u32,
    },
    RankChanged {
        rank: Rank,
    },
    TitleUnlocked {
        title: String,
    },
    TaskFailed {
        task_id: String,
        exp_lost: u64,
    },
    StreakBroken {
        missed: u32,
        exp_lost: u64,
    },
    StreakExtended {
        streak: u32,
    },
    ResetApplied {
        missed: u32,
        completed: u32,
    },
    ReminderFired {
        reminder_id: String,
        message: String,
    },
    PenaltyApplied {
        amount: u64,
        reason: String,
    },
    TerminationElapsed,
}

/// EXP awarded for clearing a quest under the current rank and streak.
pub fn exp_award(state: &PlayerState, base_exp: u32) -> u64 {
    let modifier = rank_award_modifier(state.rank);
    let bonus = streak_multiplier(state.streak);
    (base_exp as f64 * modifier * bonus).round() as u64
}

/// EXP deducted for failing (or missing) a quest: half the modified value.
pub fn exp_penalty(state: &PlayerState, base_exp: u32) -> u64 {
    let modifier = rank_award_modifier(state.rank);
    (base_exp as f64 * modifier * FAIL_PENALTY_RATIO).round() as u64
}

/// Clears a quest: awards EXP with streak/rank modifiers, runs the
/// level-up loop, improves the category-mapped stat, updates analytics
/// and titles. Completing an already-cleared quest is an idempotent no-op
/// returning no events and an unchanged snapshot.
pub fn complete_task(
    state: &mut PlayerState,
    task_id: &str,
    now: i64,
) -> Result<Vec<GameEvent>, GameError> {
    let idx = state
        .tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| GameError::UnknownTask(task_id.to_string()))?;
    if state.tasks[idx].completed {
        return Ok(Vec::new());
    }
    let (base_exp, stat) = (state.tasks[idx].exp_value, state.tasks[idx].category.stat());

    let earned = exp_award(state, base_exp);
    state.cumulative_exp += earned;
    let rank_before = state.rank;
    let rank_after = state.recompute_rank();

    // Level-up loop. The curve is strictly positive, so remaining EXP
    // strictly decreases each iteration; a zero threshold means the curve
    // itself is corrupt and continuing would spin forever.
    let mut exp = state.total_exp + earned;
    let mut level = state.level;
    let mut levels_gained = 0u32;
    loop {
        let threshold = level_threshold(level);
        assert!(threshold > 0, "level curve produced a non-positive threshold");
        if exp < threshold {
            break;
        }
        exp -= threshold;
        level += 1;
        levels_gained += 1;
    }
    let points_awarded = levels_gained * STAT_POINTS_PER_LEVEL;
    state.total_exp = exp;
    state.level = level;
    state.stat_points += points_awarded;

    state.stats.increment(stat);

    {
        let task = &mut state.tasks[idx];
        task.completed = true;
        task.state = TaskState::Success;
        task.last_updated_at = now;
    }
    if !state.completed_today.iter().any(|id| id == task_id) {
        state.completed_today.push(task_id.to_string());
    }
    state.total_tasks_completed += 1;
    state.record_analytics(&date_key(now), earned);

    let mut events = vec![GameEvent::TaskCompleted {
        task_id: task_id.to_string(),
        exp_earned: earned,
        stat,
    }];
    state.push_notification(
        format!("Quest cleared! +{} EXP. {} improved.", earned, stat.abbrev()),
        NotificationKind::Success,
        now,
    );

    if levels_gained > 0 {
        state.push_notification(
            format!(
                "LEVEL UP! You are now level {}. +{} Stat Points!",
                level, points_awarded
            ),
            NotificationKind::Level,
            now,
        );
        events.push(GameEvent::LeveledUp {
            new_level: level,
            points_awarded,
        });
    }

    if rank_after != rank_before {
        state.push_notification(
            format!("RANK UP! You have reached Rank {}.", rank_after.label()),
            NotificationKind::Rank,
            now,
        );
        events.push(GameEvent::RankChanged { rank: rank_after });
    }

    events.extend(award_milestone_titles(state, now));

    Ok(events)
}

/// Fails a quest: deducts half its modified value from the current-level
/// EXP pool, floored at zero. Lifetime EXP (and therefore rank) is not
/// touched by ordinary failure — only the penalty protocol reduces it.
/// A cleared quest stays cleared (only the daily reset reverts
/// completion), and re-failing a failed quest is an idempotent no-op, so
/// no sequence of failures deducts twice.
pub fn fail_task(
    state: &mut PlayerState,
    task_id: &str,
    now: i64,
) -> Result<Vec<GameEvent>, GameError> {
    let idx = state
        .tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| GameError::UnknownTask(task_id.to_string()))?;
    if state.tasks[idx].completed || state.tasks[idx].state == TaskState::Failed {
        return Ok(Vec::new());
    }
    let base_exp = state.tasks[idx].exp_value;

    let lost = exp_penalty(state, base_exp);
    state.total_exp = state.total_exp.saturating_sub(lost);
    {
        let task = &mut state.tasks[idx];
        task.state = TaskState::Failed;
        task.completed = false;
        task.last_updated_at = now;
    }

    state.push_notification(
        format!("Quest failed. Lost {} EXP.", lost),
        NotificationKind::Error,
        now,
    );
    Ok(vec![GameEvent::TaskFailed {
        task_id: task_id.to_string(),
        exp_lost: lost,
    }])
}

/// Spends one stat point on `stat`. Refused (snapshot untouched) at zero
/// balance.
pub fn spend_point(
    state: &mut PlayerState,
    stat: StatType,
    now: i64,
) -> Result<Vec<GameEvent>, GameError> {
    spend_stat_point(&mut state.stats, &mut state.stat_points, stat)?;
    state.push_notification(
        format!("{} increased to {}.", stat.abbrev(), state.stats.get(stat)),
        NotificationKind::Info,
        now,
    );
    Ok(Vec::new())
}

/// The penalty protocol: the one sanctioned deduction of lifetime EXP,
/// issued by an explicit admin/tactical-analysis action. Rank is
/// recomputed so the pairing stays consistent.
pub fn apply_penalty_protocol(
    state: &mut PlayerState,
    amount: u64,
    reason: &str,
    now: i64,
) -> Vec<GameEvent> {
    state.cumulative_exp = state.cumulative_exp.saturating_sub(amount);
    state.total_exp = state.total_exp.saturating_sub(amount);
    let rank_before = state.rank;
    let rank_after = state.recompute_rank();

    state.push_notification(
        format!("PENALTY PROTOCOL: -{} EXP. {}", amount, reason),
        NotificationKind::Warning,
        now,
    );
    let mut events = vec![GameEvent::PenaltyApplied {
        amount,
        reason: reason.to_string(),
    }];
    if rank_after != rank_before {
        events.push(GameEvent::RankChanged { rank: rank_after });
    }
    events
}

/// Milestone titles. The title list ships with the system; unlocks are
/// checked after every completion and streak change.
pub fn award_milestone_titles(state: &mut PlayerState, now: i64) -> Vec<GameEvent> {
    let candidates: [(&str, bool); 8] = [
        ("Novice Hunter", state.total_tasks_completed >= 1),
        ("Consistent Striker", state.streak >= 3),
        ("Iron Will", state.streak >= 7),
        ("Unstoppable", state.streak >= 14),
        ("Shadow Soldier", state.level >= 10),
        ("One Man Army", state.total_tasks_completed >= 100),
        ("The Awakened", state.rank >= Rank::A),
        ("Shadow Monarch", state.rank >= Rank::S),
    ];

    let mut events = Vec::new();
    for (title, earned) in candidates {
        if earned && state.unlock_title(title) {
            state.push_notification(
                format!("Title unlocked: [{}]", title),
                NotificationKind::Rank,
                now,
            );
            events.push(GameEvent::TitleUnlocked {
                title: title.to_string(),
            });
        }
    }
    events
}
