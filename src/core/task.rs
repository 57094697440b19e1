//! Quest (task) entity and its lifecycle operations.
//!
//! A quest is created by user action, mutated by progress and timer
//! updates, and either cleared (terminal for the cycle) or left for the
//! daily reset to evaluate. Completion itself is the engine's call — this
//! module only mutates progress and reports when a goal is reached, so
//! reward logic stays in one place.

use crate::constants::{DEFAULT_TASK_EXP, DELETE_LOCK_SECONDS};
use crate::core::stats::StatType;
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completion condition of a quest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Checkbox,
    Reps,
    Duration,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskCategory {
    #[serde(rename = "Physical Health")]
    PhysicalHealth,
    #[serde(rename = "Mental Health")]
    MentalHealth,
    Personal,
    Skill,
    Spiritual,
}

impl TaskCategory {
    /// The single stat improved by clearing a quest of this category.
    pub fn stat(&self) -> StatType {
        match self {
            TaskCategory::PhysicalHealth => StatType::Strength,
            TaskCategory::MentalHealth => StatType::Intelligence,
            TaskCategory::Personal => StatType::Agility,
            TaskCategory::Skill => StatType::Sense,
            TaskCategory::Spiritual => StatType::Vitality,
        }
    }
}

/// Display state of a quest card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Normal,
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Completed,
}

/// Whether the quest participates in the automatic daily reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    Daily,
    Custom,
}

/// Boundary input for quest creation.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub category: TaskCategory,
    pub kind: TaskKind,
    /// Repetition goal, required for [`TaskKind::Reps`].
    pub reps_target: u32,
    /// Flow duration in minutes, required for [`TaskKind::Duration`].
    pub duration_minutes: u32,
    /// Base EXP reward before modifiers; 0 means "use the default".
    pub exp_value: u32,
    pub repeat: Repeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub category: TaskCategory,
    pub kind: TaskKind,
    pub reps_target: u32,
    pub reps_done: u32,
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    pub exp_value: u32,
    pub repeat: Repeat,
    pub completed: bool,
    pub state: TaskState,
    pub timer_state: TimerState,
    /// Wall-clock second of the last timer decrement. Drift tolerance is
    /// computed from this, not from counted ticks.
    #[serde(default)]
    pub last_timer_tick: i64,
    pub created_at: i64,
    pub last_updated_at: i64,
}

impl Task {
    /// Constructs a fresh quest. Rejects empty names and zero goals for
    /// the kinds that need one; applies the default EXP value when unset.
    pub fn new(spec: TaskSpec, now: i64) -> Result<Self, GameError> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(GameError::Validation("quest name cannot be empty".to_string()));
        }
        if spec.kind == TaskKind::Reps && spec.reps_target == 0 {
            return Err(GameError::Validation(
                "repetition quests need a positive rep goal".to_string(),
            ));
        }
        if spec.kind == TaskKind::Duration && spec.duration_minutes == 0 {
            return Err(GameError::Validation(
                "duration quests need a positive duration".to_string(),
            ));
        }

        let duration_seconds = spec.duration_minutes.saturating_mul(60);
        let exp_value = if spec.exp_value == 0 {
            DEFAULT_TASK_EXP
        } else {
            spec.exp_value
        };

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            category: spec.category,
            kind: spec.kind,
            reps_target: spec.reps_target,
            reps_done: 0,
            duration_seconds,
            remaining_seconds: duration_seconds,
            exp_value,
            repeat: spec.repeat,
            completed: false,
            state: TaskState::Normal,
            timer_state: TimerState::Idle,
            last_timer_tick: 0,
            created_at: now,
            last_updated_at: now,
        })
    }

    pub fn is_daily(&self) -> bool {
        self.repeat == Repeat::Daily
    }

    /// Records repetition progress, clamped to the goal. Returns true when
    /// the goal is now reached — a signal for the caller to award
    /// completion, not an automatic transition.
    pub fn record_progress(&mut self, reps: u32, now: i64) -> Result<bool, GameError> {
        if self.kind != TaskKind::Reps {
            return Err(GameError::Validation(
                "progress updates only apply to repetition quests".to_string(),
            ));
        }
        if self.completed {
            return Ok(true);
        }
        self.reps_done = reps.min(self.reps_target);
        self.last_updated_at = now;
        Ok(self.reps_done >= self.reps_target)
    }

    /// Advances a running flow timer by elapsed wall-clock time. Tolerant
    /// of delayed or skipped ticks (backgrounding): the decrement is
    /// `now - last_timer_tick`, never an assumed fixed interval. Returns
    /// true when the timer just finished and completion is due.
    pub fn tick_timer(&mut self, now: i64) -> bool {
        if self.kind != TaskKind::Duration
            || self.completed
            || self.timer_state != TimerState::Running
        {
            return false;
        }

        let elapsed = (now - self.last_timer_tick).max(0);
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        self.remaining_seconds = self.remaining_seconds.saturating_sub(elapsed);
        self.last_timer_tick = now;
        self.last_updated_at = now;

        if self.remaining_seconds == 0 {
            self.timer_state = TimerState::Completed;
            self.state = TaskState::Normal;
            true
        } else {
            false
        }
    }

    /// Flips the flow timer between running and idle. No-op once the
    /// quest is completed or the timer has finished. Returns true if
    /// banking elapsed time on pause finished the timer, in which case
    /// completion is due.
    pub fn toggle_timer(&mut self, now: i64) -> bool {
        if self.kind != TaskKind::Duration || self.completed {
            return false;
        }
        let mut finished = false;
        match self.timer_state {
            TimerState::Idle => {
                self.timer_state = TimerState::Running;
                self.state = TaskState::Running;
                self.last_timer_tick = now;
            }
            TimerState::Running => {
                // Bank elapsed time before pausing.
                finished = self.tick_timer(now);
                if self.timer_state == TimerState::Running {
                    self.timer_state = TimerState::Idle;
                    self.state = TaskState::Normal;
                }
            }
            TimerState::Completed => {}
        }
        self.last_updated_at = now;
        finished
    }

    /// Raises the quest goal (reps for repetition quests, minutes for
    /// duration quests). Goals are upward-only before completion and
    /// immutable afterwards; shrinking a committed goal is refused with
    /// the quest unchanged.
    pub fn raise_goal(&mut self, new_goal: u32, now: i64) -> Result<(), GameError> {
        if self.completed {
            return Err(GameError::Invariant(
                "a cleared quest's goal is immutable".to_string(),
            ));
        }
        match self.kind {
            TaskKind::Checkbox => Err(GameError::Validation(
                "checkbox quests have no numeric goal".to_string(),
            )),
            TaskKind::Reps => {
                if new_goal < self.reps_target {
                    return Err(GameError::Invariant(
                        "a quest goal may only be raised, never lowered".to_string(),
                    ));
                }
                self.reps_target = new_goal;
                self.last_updated_at = now;
                Ok(())
            }
            TaskKind::Duration => {
                let new_seconds = new_goal.saturating_mul(60);
                if new_seconds < self.duration_seconds {
                    return Err(GameError::Invariant(
                        "a quest goal may only be raised, never lowered".to_string(),
                    ));
                }
                // A paused timer keeps its banked progress; an untouched
                // one refills to the new full duration.
                let untouched = self.timer_state == TimerState::Idle
                    && self.remaining_seconds == self.duration_seconds;
                self.duration_seconds = new_seconds;
                if untouched {
                    self.remaining_seconds = new_seconds;
                }
                self.last_updated_at = now;
                Ok(())
            }
        }
    }

    /// Deletion is only allowed while the quest is incomplete and the
    /// post-creation lock window has not elapsed. Hardened policy: once
    /// committed, a quest cannot be quietly discarded.
    pub fn can_delete(&self, now: i64) -> bool {
        !self.completed && now - self.created_at < DELETE_LOCK_SECONDS
    }

    /// Clears the transient per-cycle fields at the daily boundary.
    pub fn reset_for_new_day(&mut self, now: i64) {
        self.completed = false;
        self.reps_done = 0;
        self.remaining_seconds = self.duration_seconds;
        self.timer_state = TimerState::Idle;
        self.state = TaskState::Normal;
        self.last_updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reps_spec(target: u32) -> TaskSpec {
        TaskSpec {
            name: "Pushups".to_string(),
            category: TaskCategory::PhysicalHealth,
            kind: TaskKind::Reps,
            reps_target: target,
            duration_minutes: 0,
            exp_value: 20,
            repeat: Repeat::Daily,
        }
    }

    fn duration_spec(minutes: u32) -> TaskSpec {
        TaskSpec {
            name: "Deep work".to_string(),
            category: TaskCategory::Skill,
            kind: TaskKind::Duration,
            reps_target: 0,
            duration_minutes: minutes,
            exp_value: 30,
            repeat: Repeat::Daily,
        }
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new(reps_spec(10), 1_000).unwrap();
        assert!(!task.completed);
        assert_eq!(task.reps_done, 0);
        assert_eq!(task.timer_state, TimerState::Idle);
        assert_eq!(task.state, TaskState::Normal);
        assert_eq!(task.created_at, 1_000);
        assert_eq!(task.id.len(), 36, "id should be a uuid");
    }

    #[test]
    fn test_new_task_rejects_empty_name() {
        let mut spec = reps_spec(10);
        spec.name = "   ".to_string();
        let err = Task::new(spec, 0).unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn test_new_task_rejects_zero_goals() {
        assert!(Task::new(reps_spec(0), 0).is_err());
        assert!(Task::new(duration_spec(0), 0).is_err());
    }

    #[test]
    fn test_new_task_applies_default_exp() {
        let mut spec = reps_spec(5);
        spec.exp_value = 0;
        let task = Task::new(spec, 0).unwrap();
        assert_eq!(task.exp_value, crate::constants::DEFAULT_TASK_EXP);
    }

    #[test]
    fn test_record_progress_clamps_and_signals() {
        let mut task = Task::new(reps_spec(10), 0).unwrap();

        assert!(!task.record_progress(4, 10).unwrap());
        assert_eq!(task.reps_done, 4);

        // Overshoot is clamped to the goal and signals completion-due.
        assert!(task.record_progress(15, 20).unwrap());
        assert_eq!(task.reps_done, 10);
        assert!(!task.completed, "progress alone never marks completion");
    }

    #[test]
    fn test_record_progress_wrong_kind_rejected() {
        let mut task = Task::new(duration_spec(5), 0).unwrap();
        assert!(task.record_progress(1, 0).is_err());
    }

    #[test]
    fn test_timer_decrements_by_wall_clock_elapsed() {
        let mut task = Task::new(duration_spec(10), 0).unwrap();
        assert_eq!(task.remaining_seconds, 600);

        task.toggle_timer(100);
        assert_eq!(task.timer_state, TimerState::Running);
        assert_eq!(task.state, TaskState::Running);

        // One nominal tick.
        assert!(!task.tick_timer(101));
        assert_eq!(task.remaining_seconds, 599);

        // Process was backgrounded for 9 minutes; a single late tick
        // still accounts for all elapsed time.
        assert!(!task.tick_timer(101 + 540));
        assert_eq!(task.remaining_seconds, 59);

        // Running past zero finishes the timer exactly once.
        assert!(task.tick_timer(101 + 540 + 120));
        assert_eq!(task.remaining_seconds, 0);
        assert_eq!(task.timer_state, TimerState::Completed);
        assert!(!task.tick_timer(9_999), "finished timer must not re-fire");
    }

    #[test]
    fn test_toggle_timer_banks_progress_on_pause() {
        let mut task = Task::new(duration_spec(1), 0).unwrap();
        task.toggle_timer(0);
        task.toggle_timer(20); // pause after 20s
        assert_eq!(task.timer_state, TimerState::Idle);
        assert_eq!(task.remaining_seconds, 40);

        // Idle time must not consume the timer.
        task.toggle_timer(500);
        assert!(!task.tick_timer(501));
        assert_eq!(task.remaining_seconds, 39);
    }

    #[test]
    fn test_toggle_timer_noop_when_completed() {
        let mut task = Task::new(duration_spec(1), 0).unwrap();
        task.completed = true;
        task.toggle_timer(5);
        assert_eq!(task.timer_state, TimerState::Idle);
    }

    #[test]
    fn test_raise_goal_upward_only() {
        let mut task = Task::new(reps_spec(10), 0).unwrap();

        task.raise_goal(15, 1).unwrap();
        assert_eq!(task.reps_target, 15);

        let err = task.raise_goal(5, 2).unwrap_err();
        assert!(matches!(err, GameError::Invariant(_)));
        assert_eq!(task.reps_target, 15, "goal must be unchanged after refusal");
    }

    #[test]
    fn test_raise_goal_rejected_after_completion() {
        let mut task = Task::new(reps_spec(10), 0).unwrap();
        task.completed = true;
        assert!(task.raise_goal(20, 1).is_err());
    }

    #[test]
    fn test_raise_goal_refills_idle_duration() {
        let mut task = Task::new(duration_spec(10), 0).unwrap();
        task.raise_goal(20, 1).unwrap();
        assert_eq!(task.duration_seconds, 1_200);
        assert_eq!(task.remaining_seconds, 1_200);

        // A running timer keeps its banked remainder.
        task.toggle_timer(10);
        task.tick_timer(70);
        task.raise_goal(30, 80).unwrap();
        assert_eq!(task.duration_seconds, 1_800);
        assert_eq!(task.remaining_seconds, 1_140);
    }

    #[test]
    fn test_absurd_duration_saturates_instead_of_overflowing() {
        let task = Task::new(duration_spec(u32::MAX), 0).unwrap();
        assert_eq!(task.duration_seconds, u32::MAX);
        assert_eq!(task.remaining_seconds, u32::MAX);

        let mut task = Task::new(duration_spec(10), 0).unwrap();
        task.raise_goal(u32::MAX, 1).unwrap();
        assert_eq!(task.duration_seconds, u32::MAX);
    }

    #[test]
    fn test_delete_lock_window() {
        let task = Task::new(reps_spec(10), 1_000).unwrap();

        assert!(task.can_delete(1_000 + 60), "fresh quest is deletable");
        assert!(
            !task.can_delete(1_000 + DELETE_LOCK_SECONDS),
            "lock window elapsed"
        );
        assert!(!task.can_delete(1_000 + 600), "10 minutes is well past the lock");

        let mut done = task.clone();
        done.completed = true;
        assert!(!done.can_delete(1_000 + 1), "completed quests are never deletable");
    }

    #[test]
    fn test_reset_for_new_day_clears_transients() {
        let mut task = Task::new(duration_spec(5), 0).unwrap();
        task.toggle_timer(0);
        task.tick_timer(30);
        task.completed = true;
        task.state = TaskState::Success;

        task.reset_for_new_day(1_000);

        assert!(!task.completed);
        assert_eq!(task.reps_done, 0);
        assert_eq!(task.remaining_seconds, task.duration_seconds);
        assert_eq!(task.timer_state, TimerState::Idle);
        assert_eq!(task.state, TaskState::Normal);
    }

    #[test]
    fn test_category_stat_mapping() {
        assert_eq!(TaskCategory::PhysicalHealth.stat(), StatType::Strength);
        assert_eq!(TaskCategory::MentalHealth.stat(), StatType::Intelligence);
        assert_eq!(TaskCategory::Personal.stat(), StatType::Agility);
        assert_eq!(TaskCategory::Skill.stat(), StatType::Sense);
        assert_eq!(TaskCategory::Spiritual.stat(), StatType::Vitality);
    }

    #[test]
    fn test_task_serde_round_trip() {
        let task = Task::new(reps_spec(10), 42).unwrap();
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"Physical Health\""), "category keeps its wire label");
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
