//! Arise - Habit Progression Engine
//!
//! A gamified habit tracker: daily quests earn EXP, EXP drives levels,
//! ranks and stat points, and a daily reset cycle rewards streaks and
//! punishes missed quests. This library holds the full engine — the
//! progression rules, the daily cycle, persistence (local saves plus a
//! best-effort remote mirror), snapshot reconciliation, reminders and
//! the session layer that ties them together. Presentation lives in the
//! consuming frontends.

pub mod constants;
pub mod core;
pub mod error;
pub mod local_store;
pub mod remote_store;
pub mod session;
pub mod sync;
