//! The live session: one account, one mutable snapshot, a closed set of
//! intents.
//!
//! Every user action arrives as an [`Intent`] and is applied to a clone
//! of the current snapshot; only a fully successful application is
//! committed and persisted, so a failed intent can never leave the
//! account half-mutated. The periodic [`Session::clock_tick`] drives
//! everything time-based: running quest timers, reminder polling, the
//! daily reset catch-up and the termination countdown.

use crate::constants::TERMINATION_COUNTDOWN_SECONDS;
use crate::core::daily_reset::{apply_daily_reset, force_daily_reset, reset_due, PenaltyAdvisor};
use crate::core::engine::{complete_task, fail_task, spend_point, GameEvent};
use crate::core::player::{NotificationKind, PlayerState};
use crate::core::reminders::{poll_reminders, schedule_reminder};
use crate::core::stats::StatType;
use crate::core::task::{Task, TaskSpec};
use crate::error::GameError;
use crate::local_store::LocalStore;
use crate::remote_store::RemoteStore;
use crate::sync;
use chrono::NaiveTime;
use std::io;

/// Everything a user (or the chat collaborator's tool calls) can ask the
/// engine to do. A closed set: there is no other mutation path.
#[derive(Debug, Clone)]
pub enum Intent {
    CreateTask(TaskSpec),
    RecordProgress { task_id: String, reps: u32 },
    ToggleTimer { task_id: String },
    RaiseGoal { task_id: String, new_goal: u32 },
    DeleteTask { task_id: String },
    CompleteTask { task_id: String },
    FailTask { task_id: String },
    SpendStatPoint(StatType),
    ScheduleReminder { message: String, due_at: i64 },
    MarkNotificationsRead,
    SelectTitle { title: String },
    SetResetTime { reset_time: String },
    TriggerReset,
    StartTermination,
    CancelTermination,
}

pub struct Session {
    state: PlayerState,
    local: LocalStore,
    remote: Option<RemoteStore>,
    advisor: Option<Box<dyn PenaltyAdvisor>>,
    last_clock_tick: i64,
    terminated: bool,
}

impl Session {
    /// Opens a session for an account: loads and reconciles local and
    /// remote saves, catches up on any missed daily reset before the
    /// first mutation, and records the session marker for next launch.
    pub fn start(
        local: LocalStore,
        remote: Option<RemoteStore>,
        advisor: Option<Box<dyn PenaltyAdvisor>>,
        username: &str,
        now: i64,
    ) -> io::Result<Self> {
        let mut state = sync::load_state(&local, remote.as_ref(), username, now)?;

        if reset_due(&state, now) {
            apply_daily_reset(&mut state, now, advisor.as_deref());
        }

        local.write_session(username)?;
        let mut session = Self {
            state,
            local,
            remote,
            advisor,
            last_clock_tick: now,
            terminated: false,
        };
        session.persist(now);
        Ok(session)
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Applies one intent transactionally: the snapshot is cloned, the
    /// intent runs against the clone, and only a fully successful run is
    /// committed and persisted.
    pub fn dispatch(&mut self, intent: Intent, now: i64) -> Result<Vec<GameEvent>, GameError> {
        if self.terminated {
            return Err(GameError::Invariant(
                "session has been terminated".to_string(),
            ));
        }

        let mut snapshot = self.state.clone();
        let events = apply_intent(&mut snapshot, self.advisor.as_deref(), intent, now)?;
        self.state = snapshot;
        // A committed intent is a wall-clock touchpoint: the next tick's
        // elapsed window starts here, so a countdown armed after a long
        // tick gap still gets its full grace period.
        self.last_clock_tick = self.last_clock_tick.max(now);
        self.persist(now);
        Ok(events)
    }

    /// The periodic heartbeat. Advances running quest timers (completing
    /// any that finish), fires due reminders, catches up on the daily
    /// reset, and counts down a pending termination. Tolerant of jitter
    /// and long gaps: every decrement is based on wall-clock elapsed
    /// time, never an assumed interval.
    pub fn clock_tick(&mut self, now: i64) -> Vec<GameEvent> {
        if self.terminated {
            return Vec::new();
        }
        let elapsed = (now - self.last_clock_tick).max(0);
        self.last_clock_tick = now;

        let mut events = Vec::new();

        let finished: Vec<String> = self
            .state
            .tasks
            .iter_mut()
            .filter_map(|t| t.tick_timer(now).then(|| t.id.clone()))
            .collect();
        for id in finished {
            match complete_task(&mut self.state, &id, now) {
                Ok(more) => events.extend(more),
                Err(err) => eprintln!("timer completion failed for quest {}: {}", id, err),
            }
        }

        events.extend(poll_reminders(&mut self.state, now));

        if reset_due(&self.state, now) {
            let outcome = apply_daily_reset(&mut self.state, now, self.advisor.as_deref());
            events.extend(outcome.events);
        }

        if let Some(remaining) = self.state.termination_countdown {
            let remaining = remaining.saturating_sub(u32::try_from(elapsed).unwrap_or(u32::MAX));
            if remaining == 0 {
                self.terminate();
                events.push(GameEvent::TerminationElapsed);
                return events;
            }
            self.state.termination_countdown = Some(remaining);
        }

        self.persist(now);
        events
    }

    /// Wipes the account everywhere: local save, registry entry, session
    /// marker, and the remote mirror (best-effort).
    fn terminate(&mut self) {
        self.terminated = true;
        let username = self.state.username.clone();

        if let Err(err) = self.local.delete_state(&username) {
            eprintln!("failed to delete local save: {}", err);
        }
        if let Err(err) = self.local.remove_user(&username) {
            eprintln!("failed to remove account: {}", err);
        }
        if let Err(err) = self.local.clear_session() {
            eprintln!("failed to clear session marker: {}", err);
        }
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.delete_state(&username) {
                eprintln!("failed to delete remote save: {}", err);
            }
        }
    }

    /// Best-effort save after a committed mutation. Persistence failures
    /// are logged, never surfaced as gameplay errors.
    fn persist(&mut self, now: i64) {
        if let Err(err) = sync::save_state(&self.local, self.remote.as_ref(), &mut self.state, now)
        {
            eprintln!("save failed: {}", err);
        }
    }
}

fn apply_intent(
    state: &mut PlayerState,
    advisor: Option<&dyn PenaltyAdvisor>,
    intent: Intent,
    now: i64,
) -> Result<Vec<GameEvent>, GameError> {
    match intent {
        Intent::CreateTask(spec) => {
            let task = Task::new(spec, now)?;
            state.push_notification(
                format!("New quest accepted: {}", task.name),
                NotificationKind::Info,
                now,
            );
            state.tasks.push(task);
            Ok(Vec::new())
        }
        Intent::RecordProgress { task_id, reps } => {
            let task = task_mut(state, &task_id)?;
            let goal_reached = task.record_progress(reps, now)?;
            if goal_reached {
                complete_task(state, &task_id, now)
            } else {
                Ok(Vec::new())
            }
        }
        Intent::ToggleTimer { task_id } => {
            let task = task_mut(state, &task_id)?;
            let finished = task.toggle_timer(now);
            if finished {
                complete_task(state, &task_id, now)
            } else {
                Ok(Vec::new())
            }
        }
        Intent::RaiseGoal { task_id, new_goal } => {
            task_mut(state, &task_id)?.raise_goal(new_goal, now)?;
            Ok(Vec::new())
        }
        Intent::DeleteTask { task_id } => {
            let task = task_mut(state, &task_id)?;
            if !task.can_delete(now) {
                return Err(GameError::Invariant(
                    "quest is locked in: the deletion window has closed".to_string(),
                ));
            }
            state.tasks.retain(|t| t.id != task_id);
            state.completed_today.retain(|id| *id != task_id);
            Ok(Vec::new())
        }
        Intent::CompleteTask { task_id } => complete_task(state, &task_id, now),
        Intent::FailTask { task_id } => fail_task(state, &task_id, now),
        Intent::SpendStatPoint(stat) => spend_point(state, stat, now),
        Intent::ScheduleReminder { message, due_at } => {
            schedule_reminder(state, &message, due_at, now)?;
            Ok(Vec::new())
        }
        Intent::MarkNotificationsRead => {
            state.mark_notifications_read();
            Ok(Vec::new())
        }
        Intent::SelectTitle { title } => {
            if !state.titles_unlocked.iter().any(|t| *t == title) {
                return Err(GameError::Validation(format!(
                    "title '{}' has not been unlocked",
                    title
                )));
            }
            state.selected_title = title;
            Ok(Vec::new())
        }
        Intent::SetResetTime { reset_time } => {
            if NaiveTime::parse_from_str(&reset_time, "%H:%M").is_err() {
                return Err(GameError::Validation(
                    "reset time must be HH:MM".to_string(),
                ));
            }
            state.reset_time = reset_time;
            Ok(Vec::new())
        }
        Intent::TriggerReset => {
            let outcome = force_daily_reset(state, now, advisor);
            Ok(outcome.events)
        }
        Intent::StartTermination => {
            state.termination_countdown = Some(TERMINATION_COUNTDOWN_SECONDS);
            state.push_notification(
                format!(
                    "TERMINATION PROTOCOL ARMED. Account wipe in {} seconds.",
                    TERMINATION_COUNTDOWN_SECONDS
                ),
                NotificationKind::Warning,
                now,
            );
            Ok(Vec::new())
        }
        Intent::CancelTermination => {
            state.termination_countdown = None;
            state.push_notification(
                "Termination protocol cancelled.".to_string(),
                NotificationKind::Info,
                now,
            );
            Ok(Vec::new())
        }
    }
}

fn task_mut<'a>(state: &'a mut PlayerState, task_id: &str) -> Result<&'a mut Task, GameError> {
    state
        .task_mut(task_id)
        .ok_or_else(|| GameError::UnknownTask(task_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{Repeat, TaskCategory, TaskKind, TimerState};
    use uuid::Uuid;

    fn temp_store() -> LocalStore {
        let dir = std::env::temp_dir().join(format!("arise-test-{}", Uuid::new_v4()));
        LocalStore::with_root(dir).unwrap()
    }

    fn start_session(now: i64) -> Session {
        Session::start(temp_store(), None, None, "hunter", now).unwrap()
    }

    fn checkbox_spec(name: &str) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            category: TaskCategory::PhysicalHealth,
            kind: TaskKind::Checkbox,
            reps_target: 0,
            duration_minutes: 0,
            exp_value: 20,
            repeat: Repeat::Daily,
        }
    }

    fn first_task_id(session: &Session) -> String {
        session.state().tasks[0].id.clone()
    }

    #[test]
    fn test_create_and_complete_quest() {
        let mut session = start_session(0);
        session
            .dispatch(Intent::CreateTask(checkbox_spec("train")), 10)
            .unwrap();
        let id = first_task_id(&session);

        let events = session
            .dispatch(Intent::CompleteTask { task_id: id }, 20)
            .unwrap();

        assert!(matches!(events[0], GameEvent::TaskCompleted { .. }));
        assert_eq!(session.state().total_exp, 20);
        assert_eq!(session.state().stats.get(StatType::Strength), 1);
    }

    #[test]
    fn test_failed_intent_leaves_snapshot_untouched() {
        let mut session = start_session(0);
        session
            .dispatch(Intent::CreateTask(checkbox_spec("train")), 10)
            .unwrap();
        let before = serde_json::to_string(session.state()).unwrap();

        let err = session
            .dispatch(
                Intent::CompleteTask {
                    task_id: "no-such-quest".to_string(),
                },
                20,
            )
            .unwrap_err();

        assert!(matches!(err, GameError::UnknownTask(_)));
        // last_saved_at only moves on a committed mutation.
        assert_eq!(serde_json::to_string(session.state()).unwrap(), before);
    }

    #[test]
    fn test_state_survives_session_restart() {
        let dir = std::env::temp_dir().join(format!("arise-test-{}", Uuid::new_v4()));

        let mut session = Session::start(
            LocalStore::with_root(dir.clone()).unwrap(),
            None,
            None,
            "hunter",
            0,
        )
        .unwrap();
        session
            .dispatch(Intent::CreateTask(checkbox_spec("train")), 10)
            .unwrap();
        let id = first_task_id(&session);
        session
            .dispatch(Intent::CompleteTask { task_id: id }, 20)
            .unwrap();
        let exp = session.state().total_exp;
        drop(session);

        let reopened = Session::start(
            LocalStore::with_root(dir).unwrap(),
            None,
            None,
            "hunter",
            30,
        )
        .unwrap();
        assert_eq!(reopened.state().total_exp, exp);
        assert_eq!(reopened.state().tasks.len(), 1);
    }

    #[test]
    fn test_start_catches_up_on_missed_reset() {
        let dir = std::env::temp_dir().join(format!("arise-test-{}", Uuid::new_v4()));

        let mut session = Session::start(
            LocalStore::with_root(dir.clone()).unwrap(),
            None,
            None,
            "hunter",
            0,
        )
        .unwrap();
        session
            .dispatch(Intent::CreateTask(checkbox_spec("missed")), 10)
            .unwrap();
        drop(session);

        // Reopen two days later: the missed daily reset applies before
        // any interaction.
        let reopened = Session::start(
            LocalStore::with_root(dir).unwrap(),
            None,
            None,
            "hunter",
            2 * 86_400,
        )
        .unwrap();
        assert_eq!(reopened.state().streak, 0);
        assert_eq!(reopened.state().missed_today.len(), 1);
        assert_eq!(reopened.state().last_reset_at, 2 * 86_400);
    }

    #[test]
    fn test_reps_progress_auto_completes_at_goal() {
        let mut session = start_session(0);
        session
            .dispatch(
                Intent::CreateTask(TaskSpec {
                    name: "pushups".to_string(),
                    category: TaskCategory::PhysicalHealth,
                    kind: TaskKind::Reps,
                    reps_target: 10,
                    duration_minutes: 0,
                    exp_value: 10,
                    repeat: Repeat::Daily,
                }),
                0,
            )
            .unwrap();
        let id = first_task_id(&session);

        let events = session
            .dispatch(
                Intent::RecordProgress {
                    task_id: id.clone(),
                    reps: 6,
                },
                10,
            )
            .unwrap();
        assert!(events.is_empty());

        assert_eq!(session.state().tasks[0].reps_done, 6);

        let events = session
            .dispatch(Intent::RecordProgress { task_id: id, reps: 10 }, 20)
            .unwrap();
        assert!(matches!(events[0], GameEvent::TaskCompleted { .. }));
    }

    #[test]
    fn test_clock_tick_completes_finished_timer() {
        let mut session = start_session(0);
        session
            .dispatch(
                Intent::CreateTask(TaskSpec {
                    name: "meditate".to_string(),
                    category: TaskCategory::MentalHealth,
                    kind: TaskKind::Duration,
                    reps_target: 0,
                    duration_minutes: 1,
                    exp_value: 10,
                    repeat: Repeat::Daily,
                }),
                0,
            )
            .unwrap();
        let id = first_task_id(&session);
        session
            .dispatch(Intent::ToggleTimer { task_id: id.clone() }, 0)
            .unwrap();

        // A delayed tick well past the 60s duration still completes it.
        let events = session.clock_tick(90);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TaskCompleted { .. })));
        assert!(session.state().task(&id).unwrap().completed);
        assert_eq!(
            session.state().task(&id).unwrap().timer_state,
            TimerState::Completed
        );
    }

    #[test]
    fn test_delete_lock_enforced_through_intent() {
        let mut session = start_session(0);
        session
            .dispatch(Intent::CreateTask(checkbox_spec("regret")), 0)
            .unwrap();
        let id = first_task_id(&session);

        let err = session
            .dispatch(Intent::DeleteTask { task_id: id.clone() }, 600)
            .unwrap_err();
        assert!(matches!(err, GameError::Invariant(_)));
        assert_eq!(session.state().tasks.len(), 1);

        // Within the window it goes through.
        session
            .dispatch(Intent::CreateTask(checkbox_spec("fresh")), 700)
            .unwrap();
        let fresh = session.state().tasks[1].id.clone();
        session
            .dispatch(Intent::DeleteTask { task_id: fresh }, 750)
            .unwrap();
        assert_eq!(session.state().tasks.len(), 1);
    }

    #[test]
    fn test_select_title_requires_unlock() {
        let mut session = start_session(0);
        let err = session
            .dispatch(
                Intent::SelectTitle {
                    title: "Shadow Monarch".to_string(),
                },
                0,
            )
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));

        session
            .dispatch(Intent::CreateTask(checkbox_spec("first")), 0)
            .unwrap();
        let id = first_task_id(&session);
        session
            .dispatch(Intent::CompleteTask { task_id: id }, 10)
            .unwrap();

        // Clearing the first quest unlocks "Novice Hunter".
        session
            .dispatch(
                Intent::SelectTitle {
                    title: "Novice Hunter".to_string(),
                },
                20,
            )
            .unwrap();
        assert_eq!(session.state().selected_title, "Novice Hunter");
    }

    #[test]
    fn test_set_reset_time_validates_format() {
        let mut session = start_session(0);
        assert!(session
            .dispatch(
                Intent::SetResetTime {
                    reset_time: "25:99".to_string()
                },
                0
            )
            .is_err());
        session
            .dispatch(
                Intent::SetResetTime {
                    reset_time: "05:30".to_string(),
                },
                0,
            )
            .unwrap();
        assert_eq!(session.state().reset_time, "05:30");
    }

    #[test]
    fn test_termination_countdown_and_cancel() {
        let mut session = start_session(0);
        session.dispatch(Intent::StartTermination, 0).unwrap();
        assert_eq!(
            session.state().termination_countdown,
            Some(TERMINATION_COUNTDOWN_SECONDS)
        );

        session.clock_tick(30);
        assert_eq!(session.state().termination_countdown, Some(30));

        session.dispatch(Intent::CancelTermination, 40).unwrap();
        assert_eq!(session.state().termination_countdown, None);
        assert!(!session.is_terminated());
    }

    #[test]
    fn test_arming_after_tick_gap_keeps_full_grace_period() {
        let mut session = start_session(0);

        // A long stretch without heartbeats (backgrounded), then the user
        // arms termination; the next tick lands one second later.
        session.dispatch(Intent::StartTermination, 100).unwrap();
        let events = session.clock_tick(101);

        assert!(
            !session.is_terminated(),
            "the grace period starts at arming, not at the last heartbeat"
        );
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::TerminationElapsed)));
        assert_eq!(
            session.state().termination_countdown,
            Some(TERMINATION_COUNTDOWN_SECONDS - 1)
        );
    }

    #[test]
    fn test_termination_wipes_account() {
        let dir = std::env::temp_dir().join(format!("arise-test-{}", Uuid::new_v4()));
        let store = LocalStore::with_root(dir.clone()).unwrap();
        store.register_user("hunter", "pw", 0).unwrap();

        let mut session = Session::start(store, None, None, "hunter", 0).unwrap();
        session.dispatch(Intent::StartTermination, 0).unwrap();

        let events = session.clock_tick(TERMINATION_COUNTDOWN_SECONDS as i64 + 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TerminationElapsed)));
        assert!(session.is_terminated());

        let store = LocalStore::with_root(dir).unwrap();
        assert!(store.load_state("hunter").unwrap().is_none());
        assert!(!store.verify_user("hunter", "pw").unwrap());
        assert!(store.read_session().unwrap().is_none());

        // A terminated session accepts nothing further.
        assert!(session.dispatch(Intent::CancelTermination, 100).is_err());
    }

    #[test]
    fn test_force_reset_intent_runs_same_day() {
        let mut session = start_session(100);
        session
            .dispatch(Intent::CreateTask(checkbox_spec("train")), 100)
            .unwrap();
        let id = first_task_id(&session);
        session
            .dispatch(Intent::CompleteTask { task_id: id }, 110)
            .unwrap();

        let events = session.dispatch(Intent::TriggerReset, 120).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::ResetApplied { .. })));
        assert_eq!(session.state().streak, 1);
    }
}
