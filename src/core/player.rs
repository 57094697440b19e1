//! The root progression aggregate owned by a session.
//!
//! `PlayerState` is the single snapshot every mutation operates on. It is
//! plain data: the engine, daily cycle and merge modules provide the
//! transitions. The whole struct serializes to the JSON blob used for
//! local saves, remote mirroring and user-facing backups, so every field
//! must round-trip exactly; `#[serde(default)]` keeps older blobs loadable.

use crate::constants::{DEFAULT_TITLE, MAX_ANALYTICS_DAYS, MAX_NOTIFICATIONS};
use crate::core::progression::{efficiency, rank_for, Rank};
use crate::core::reminders::Reminder;
use crate::core::stats::Stats;
use crate::core::task::Task;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Level,
    Rank,
}

/// One entry in the append-only system message log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: i64,
    pub read: bool,
}

/// One calendar day of analytics, keyed by ISO date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsEntry {
    pub date: String,
    pub exp_earned: u64,
    pub tasks_completed: u32,
    pub efficiency: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerState {
    pub username: String,
    pub selected_title: String,
    pub titles_unlocked: Vec<String>,
    pub level: u32,
    pub rank: Rank,
    /// EXP within the current level, always below the level threshold.
    pub total_exp: u64,
    /// Lifetime EXP, the source of truth for rank. Only the penalty
    /// protocol ever reduces it.
    pub cumulative_exp: u64,
    pub stat_points: u32,
    pub stats: Stats,
    pub streak: u32,
    /// Daily reset boundary, "HH:MM".
    pub reset_time: String,
    pub last_reset_at: i64,
    pub tasks: Vec<Task>,
    pub completed_today: Vec<String>,
    pub missed_today: Vec<String>,
    pub analytics: Vec<AnalyticsEntry>,
    pub notifications: Vec<Notification>,
    pub reminders: Vec<Reminder>,
    /// Seconds left on the account self-destruct countdown, if armed.
    pub termination_countdown: Option<u32>,
    pub total_tasks_completed: u64,
    pub created_at: i64,
    pub last_saved_at: i64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new("", 0)
    }
}

impl PlayerState {
    pub fn new(username: &str, now: i64) -> Self {
        Self {
            username: username.to_string(),
            selected_title: DEFAULT_TITLE.to_string(),
            titles_unlocked: vec![DEFAULT_TITLE.to_string()],
            level: 1,
            rank: Rank::E,
            total_exp: 0,
            cumulative_exp: 0,
            stat_points: 0,
            stats: Stats::new(),
            streak: 0,
            reset_time: "00:00".to_string(),
            last_reset_at: now,
            tasks: Vec::new(),
            completed_today: Vec::new(),
            missed_today: Vec::new(),
            analytics: Vec::new(),
            notifications: Vec::new(),
            reminders: Vec::new(),
            termination_countdown: None,
            total_tasks_completed: 0,
            created_at: now,
            last_saved_at: now,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Appends a system message, newest first, evicting the oldest past
    /// the cap.
    pub fn push_notification(&mut self, message: String, kind: NotificationKind, now: i64) {
        self.notifications.insert(
            0,
            Notification {
                id: Uuid::new_v4().to_string(),
                message,
                kind,
                timestamp: now,
                read: false,
            },
        );
        self.notifications.truncate(MAX_NOTIFICATIONS);
    }

    pub fn mark_notifications_read(&mut self) {
        for n in &mut self.notifications {
            n.read = true;
        }
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Adds a title to the unlocked set. Returns true if it was new.
    pub fn unlock_title(&mut self, title: &str) -> bool {
        if self.titles_unlocked.iter().any(|t| t == title) {
            return false;
        }
        self.titles_unlocked.push(title.to_string());
        true
    }

    /// Completion ratio of today's quest log.
    pub fn today_efficiency(&self) -> u32 {
        efficiency(self.completed_today.len(), self.tasks.len())
    }

    /// Upserts today's analytics entry, keyed by calendar date, and trims
    /// the history window.
    pub fn record_analytics(&mut self, date: &str, exp_delta: u64) {
        let tasks_completed = self.completed_today.len() as u32;
        let eff = self.today_efficiency();
        if let Some(entry) = self.analytics.iter_mut().find(|e| e.date == date) {
            entry.exp_earned += exp_delta;
            entry.tasks_completed = tasks_completed;
            entry.efficiency = eff;
        } else {
            self.analytics.push(AnalyticsEntry {
                date: date.to_string(),
                exp_earned: exp_delta,
                tasks_completed,
                efficiency: eff,
            });
        }
        if self.analytics.len() > MAX_ANALYTICS_DAYS {
            let excess = self.analytics.len() - MAX_ANALYTICS_DAYS;
            self.analytics.drain(0..excess);
        }
    }

    /// Keeps the derived rank consistent with lifetime EXP.
    pub fn recompute_rank(&mut self) -> Rank {
        self.rank = rank_for(self.cumulative_exp);
        self.rank
    }

    /// Read-only snapshot handed to the external chat collaborator as
    /// prompt context. Never includes credentials or raw notifications.
    pub fn prompt_context(&self) -> PromptContext {
        PromptContext {
            username: self.username.clone(),
            title: self.selected_title.clone(),
            level: self.level,
            rank: self.rank.label().to_string(),
            streak: self.streak,
            stat_points: self.stat_points,
            stats: self.stats,
            today_efficiency: self.today_efficiency(),
            active_quests: self
                .tasks
                .iter()
                .map(|t| QuestSummary {
                    name: t.name.clone(),
                    completed: t.completed,
                    exp_value: t.exp_value,
                })
                .collect(),
        }
    }
}

/// Context surface for the AI collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub username: String,
    pub title: String,
    pub level: u32,
    pub rank: String,
    pub streak: u32,
    pub stat_points: u32,
    pub stats: Stats,
    pub today_efficiency: u32,
    pub active_quests: Vec<QuestSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestSummary {
    pub name: String,
    pub completed: bool,
    pub exp_value: u32,
}

/// UTC calendar date of a unix timestamp.
pub fn utc_date(timestamp: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .date_naive()
}

/// ISO date key ("YYYY-MM-DD") used for analytics entries.
pub fn date_key(timestamp: i64) -> String {
    utc_date(timestamp).to_string()
}
