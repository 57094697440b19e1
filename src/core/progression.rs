//! Progression arithmetic: level thresholds, ranks, efficiency.
//!
//! Everything in this module is a pure function of its inputs. The level
//! curve and rank tables are policy — callers and tests rely only on
//! positivity and monotonicity.

use crate::constants::{
    STREAK_BONUS_MAX_DAYS, STREAK_BONUS_MAX_MULTIPLIER, STREAK_BONUS_MIN_DAYS,
    STREAK_BONUS_MIN_MULTIPLIER, XP_CURVE_BASE, XP_GROWTH_TIER_1, XP_GROWTH_TIER_2,
    XP_GROWTH_TIER_3,
};
use serde::{Deserialize, Serialize};

/// Hunter rank, derived from lifetime EXP and never set directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    E,
    D,
    C,
    B,
    A,
    S,
    #[serde(rename = "SS")]
    Ss,
}

impl Rank {
    pub fn all() -> [Rank; 7] {
        [
            Rank::E,
            Rank::D,
            Rank::C,
            Rank::B,
            Rank::A,
            Rank::S,
            Rank::Ss,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
            Rank::Ss => "SS",
        }
    }

    /// Lifetime EXP required to hold this rank.
    pub fn threshold(&self) -> u64 {
        match self {
            Rank::E => 0,
            Rank::D => 1_000,
            Rank::C => 3_000,
            Rank::B => 7_000,
            Rank::A => 15_000,
            Rank::S => 30_000,
            Rank::Ss => 60_000,
        }
    }
}

impl Default for Rank {
    fn default() -> Self {
        Rank::E
    }
}

/// EXP required to advance from `level` to `level + 1`.
///
/// Piecewise exponential: base 100, 25% growth per level, stepping up to
/// 30% past level 10 and 35% past level 20. Built iteratively so the
/// curve is strictly increasing by construction. Saturates at `u64::MAX`
/// for absurd levels rather than wrapping.
pub fn level_threshold(level: u32) -> u64 {
    let mut required = XP_CURVE_BASE;
    for reached in 1..level {
        required *= growth_for_level(reached);
        if !required.is_finite() {
            return u64::MAX;
        }
    }
    required.floor() as u64
}

/// Growth factor applied when moving past `level`.
fn growth_for_level(level: u32) -> f64 {
    match level {
        0..=9 => XP_GROWTH_TIER_1,
        10..=19 => XP_GROWTH_TIER_2,
        _ => XP_GROWTH_TIER_3,
    }
}

/// Highest rank whose threshold is at or below `cumulative_exp`.
pub fn rank_for(cumulative_exp: u64) -> Rank {
    let mut rank = Rank::E;
    for candidate in Rank::all() {
        if cumulative_exp >= candidate.threshold() {
            rank = candidate;
        }
    }
    rank
}

/// Per-rank EXP award scalar. Higher ranks earn reduced marginal reward —
/// a balancing knob, not a derived quantity.
pub fn rank_award_modifier(rank: Rank) -> f64 {
    match rank {
        Rank::E => 1.0,
        Rank::D => 0.90,
        Rank::C => 0.85,
        Rank::B => 0.80,
        Rank::A => 0.75,
        Rank::S => 0.70,
        Rank::Ss => 0.65,
    }
}

/// Streak EXP multiplier — a monotone non-decreasing step function.
pub fn streak_multiplier(streak: u32) -> f64 {
    if streak >= STREAK_BONUS_MAX_DAYS {
        STREAK_BONUS_MAX_MULTIPLIER
    } else if streak >= STREAK_BONUS_MIN_DAYS {
        STREAK_BONUS_MIN_MULTIPLIER
    } else {
        1.0
    }
}

/// Daily completion percentage. An empty quest log counts as full credit.
pub fn efficiency(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}
