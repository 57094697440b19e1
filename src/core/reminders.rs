//! Scheduled reminders and the cooperative polling check.
//!
//! Reminders are created by the user or by the external chat collaborator
//! through its `create_reminder` tool call. A periodic poll fires each due
//! reminder at-most-once: "at or after due time, never before", tolerant
//! of poll-interval jitter.

use crate::constants::REMINDER_RETENTION_SECONDS;
use crate::core::engine::GameEvent;
use crate::core::player::{NotificationKind, PlayerState};
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: String,
    pub message: String,
    pub due_at: i64,
    /// At-most-once guard: set when the reminder fires.
    pub triggered: bool,
    pub created_at: i64,
}

/// Schedules a reminder. A due time in the past is allowed — it fires on
/// the next poll. Returns the new reminder's id.
pub fn schedule_reminder(
    state: &mut PlayerState,
    message: &str,
    due_at: i64,
    now: i64,
) -> Result<String, GameError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(GameError::Validation(
            "reminder message cannot be empty".to_string(),
        ));
    }
    let id = Uuid::new_v4().to_string();
    state.reminders.push(Reminder {
        id: id.clone(),
        message: message.to_string(),
        due_at,
        triggered: false,
        created_at: now,
    });
    Ok(id)
}

/// Fires every untriggered reminder whose due time has passed, emitting a
/// notification per firing, then prunes fired reminders older than the
/// retention window.
pub fn poll_reminders(state: &mut PlayerState, now: i64) -> Vec<GameEvent> {
    let mut fired = Vec::new();
    for reminder in &mut state.reminders {
        if !reminder.triggered && now >= reminder.due_at {
            reminder.triggered = true;
            fired.push((reminder.id.clone(), reminder.message.clone()));
        }
    }

    let mut events = Vec::new();
    for (id, message) in fired {
        state.push_notification(format!("Reminder: {}", message), NotificationKind::Info, now);
        events.push(GameEvent::ReminderFired {
            reminder_id: id,
            message,
        });
    }

    state
        .reminders
        .retain(|r| !r.triggered || now - r.due_at < REMINDER_RETENTION_SECONDS);

    events
}
