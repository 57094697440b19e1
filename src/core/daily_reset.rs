//! The daily cycle controller.
//!
//! Once per calendar day, after the configured reset time, the quest log
//! is evaluated: missed daily quests cost EXP and break the streak, a
//! perfect day extends it, and every daily quest's transient fields are
//! cleared for the next cycle. The reset is idempotent — `last_reset_at`
//! is only advanced after full application, and a same-day rerun is a
//! no-op — so a delayed or repeated trigger can never double-apply.

use crate::core::engine::{award_milestone_titles, exp_penalty, GameEvent};
use crate::core::player::{utc_date, NotificationKind, PlayerState};
use crate::core::progression::Rank;
use chrono::{DateTime, NaiveTime, Utc};

/// Flavored penalty produced by the external tactical-analysis
/// collaborator.
#[derive(Debug, Clone)]
pub struct PenaltyAdvice {
    pub message: String,
    /// Additional EXP deducted on top of the per-quest penalties.
    pub extra_penalty: u64,
}

/// What the collaborator is told about a missed day.
#[derive(Debug, Clone)]
pub struct MissReport {
    pub missed_quests: Vec<String>,
    pub streak_before: u32,
    pub rank: Rank,
    pub base_penalty: u64,
}

/// Seam for the external chat service. Best-effort: any failure falls
/// back to the deterministic penalty message and never blocks the reset.
pub trait PenaltyAdvisor {
    fn advise(&self, report: &MissReport) -> Result<PenaltyAdvice, String>;
}

/// What a reset application did, for the caller and its collaborators.
#[derive(Debug, Clone, Default)]
pub struct ResetOutcome {
    pub applied: bool,
    pub missed: u32,
    pub completed: u32,
    pub exp_lost: u64,
    pub streak: u32,
    pub events: Vec<GameEvent>,
}

/// Whether the wall clock has crossed today's reset boundary. Never
/// panics: an unparseable configured time falls back to midnight.
pub fn reset_due(state: &PlayerState, now: i64) -> bool {
    let now_dt = DateTime::<Utc>::from_timestamp(now, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    if utc_date(state.last_reset_at) == now_dt.date_naive() {
        return false;
    }
    let boundary =
        NaiveTime::parse_from_str(&state.reset_time, "%H:%M").unwrap_or(NaiveTime::MIN);
    now_dt.time() >= boundary
}

/// Applies the daily reset unless one already ran this calendar day.
pub fn apply_daily_reset(
    state: &mut PlayerState,
    now: i64,
    advisor: Option<&dyn PenaltyAdvisor>,
) -> ResetOutcome {
    if utc_date(state.last_reset_at) == utc_date(now) {
        return ResetOutcome::default();
    }
    force_daily_reset(state, now, advisor)
}

/// Applies the daily reset unconditionally (the manual "force sync"
/// path). Ends the current cycle even if one already ran today.
pub fn force_daily_reset(
    state: &mut PlayerState,
    now: i64,
    advisor: Option<&dyn PenaltyAdvisor>,
) -> ResetOutcome {
    // Only daily quests participate; custom-repeat quests keep their state.
    let daily_total = state.tasks.iter().filter(|t| t.is_daily()).count() as u32;
    let missed: Vec<(String, String, u32)> = state
        .tasks
        .iter()
        .filter(|t| t.is_daily() && !t.completed)
        .map(|t| (t.id.clone(), t.name.clone(), t.exp_value))
        .collect();
    let completed = daily_total - missed.len() as u32;

    let mut events = Vec::new();
    let mut exp_lost = 0u64;

    if !missed.is_empty() {
        let base_penalty: u64 = missed.iter().map(|(_, _, exp)| exp_penalty(state, *exp)).sum();
        let (message, extra) = consult_advisor(state, &missed, base_penalty, advisor);
        exp_lost = base_penalty + extra;

        state.total_exp = state.total_exp.saturating_sub(exp_lost);
        state.streak = 0;
        state.missed_today = missed.iter().map(|(id, _, _)| id.clone()).collect();
        state.push_notification(message, NotificationKind::Warning, now);
        events.push(GameEvent::StreakBroken {
            missed: missed.len() as u32,
            exp_lost,
        });
    } else if daily_total > 0 {
        state.streak += 1;
        state.missed_today.clear();
        state.push_notification(
            format!("Daily perfect! Streak: {} days.", state.streak),
            NotificationKind::Success,
            now,
        );
        events.push(GameEvent::StreakExtended {
            streak: state.streak,
        });
        events.extend(award_milestone_titles(state, now));
    } else {
        // An empty quest log is evidence of neither failure nor success.
        state.missed_today.clear();
    }

    for task in state.tasks.iter_mut().filter(|t| t.is_daily()) {
        task.reset_for_new_day(now);
    }
    state.completed_today.clear();
    state.last_reset_at = now;

    events.push(GameEvent::ResetApplied {
        missed: missed.len() as u32,
        completed,
    });

    ResetOutcome {
        applied: true,
        missed: missed.len() as u32,
        completed,
        exp_lost,
        streak: state.streak,
        events,
    }
}

/// Asks the external collaborator to flavor the penalty; falls back to
/// the deterministic summary on any failure.
fn consult_advisor(
    state: &PlayerState,
    missed: &[(String, String, u32)],
    base_penalty: u64,
    advisor: Option<&dyn PenaltyAdvisor>,
) -> (String, u64) {
    let fallback = format!(
        "Daily reset: Missed {} quests. Lost {} EXP.",
        missed.len(),
        base_penalty
    );

    let Some(advisor) = advisor else {
        return (fallback, 0);
    };

    let report = MissReport {
        missed_quests: missed.iter().map(|(_, name, _)| name.clone()).collect(),
        streak_before: state.streak,
        rank: state.rank,
        base_penalty,
    };
    match advisor.advise(&report) {
        Ok(advice) => {
            let total = base_penalty + advice.extra_penalty;
            (
                format!("{} (-{} EXP)", advice.message, total),
                advice.extra_penalty,
            )
        }
        Err(err) => {
            eprintln!("tactical analysis unavailable, using fallback: {}", err);
            (fallback, 0)
        }
    }
}
