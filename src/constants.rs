//! Shared balance constants for the progression engine.
//!
//! All tunable policy numbers live here. Change once, test everywhere.
//! The rank threshold/modifier tables sit next to the `Rank` type in
//! `core::progression`.

// =============================================================================
// LEVELING CURVE
// =============================================================================

/// EXP required to clear level 1.
pub const XP_CURVE_BASE: f64 = 100.0;

/// Per-level growth for levels 1-9.
pub const XP_GROWTH_TIER_1: f64 = 1.25;

/// Per-level growth for levels 10-19 (the first wall).
pub const XP_GROWTH_TIER_2: f64 = 1.30;

/// Per-level growth for level 20 and beyond.
pub const XP_GROWTH_TIER_3: f64 = 1.35;

/// Stat points awarded per level gained.
pub const STAT_POINTS_PER_LEVEL: u32 = 5;

// =============================================================================
// STREAK BONUSES
// =============================================================================

/// Streak length at which the first EXP bonus kicks in.
pub const STREAK_BONUS_MIN_DAYS: u32 = 3;

/// Streak length for the full EXP bonus.
pub const STREAK_BONUS_MAX_DAYS: u32 = 7;

/// EXP multiplier for streaks of at least [`STREAK_BONUS_MIN_DAYS`].
pub const STREAK_BONUS_MIN_MULTIPLIER: f64 = 1.10;

/// EXP multiplier for streaks of at least [`STREAK_BONUS_MAX_DAYS`].
pub const STREAK_BONUS_MAX_MULTIPLIER: f64 = 1.25;

// =============================================================================
// PENALTIES
// =============================================================================

/// Fraction of a quest's modified EXP value lost on failure or a missed
/// daily reset.
pub const FAIL_PENALTY_RATIO: f64 = 0.5;

// =============================================================================
// TASK LIFECYCLE
// =============================================================================

/// Window after creation during which an incomplete quest may still be
/// deleted. Once it elapses the quest is hardened and can only be
/// cleared or failed.
pub const DELETE_LOCK_SECONDS: i64 = 5 * 60;

/// Default EXP value for a new quest when the caller does not set one.
pub const DEFAULT_TASK_EXP: u32 = 10;

// =============================================================================
// LOG CAPS
// =============================================================================

/// Maximum notifications retained (oldest evicted first).
pub const MAX_NOTIFICATIONS: usize = 100;

/// Analytics history window, one entry per calendar day.
pub const MAX_ANALYTICS_DAYS: usize = 365;

/// Fired reminders are pruned once they are older than this.
pub const REMINDER_RETENTION_SECONDS: i64 = 24 * 60 * 60;

// =============================================================================
// ACCOUNT TERMINATION
// =============================================================================

/// Grace countdown (seconds) before an account wipe takes effect.
pub const TERMINATION_COUNTDOWN_SECONDS: u32 = 60;

// =============================================================================
// REMOTE STORE
// =============================================================================

/// Per-call timeout for the remote blob store.
pub const REMOTE_TIMEOUT_SECONDS: u64 = 5;

/// Retries after the first failed remote call.
pub const REMOTE_MAX_RETRIES: u32 = 2;

/// Base backoff between remote retries; grows linearly per attempt.
pub const REMOTE_BACKOFF_BASE_SECONDS: u64 = 1;

// =============================================================================
// TITLES
// =============================================================================

/// Title every new account starts with.
pub const DEFAULT_TITLE: &str = "Unawakened";
