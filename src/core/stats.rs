//! The five hunter stats and the stat-point allocation currency.

use crate::error::GameError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    Strength,
    Vitality,
    Agility,
    Intelligence,
    Sense,
}

impl StatType {
    pub fn all() -> [StatType; 5] {
        [
            StatType::Strength,
            StatType::Vitality,
            StatType::Agility,
            StatType::Intelligence,
            StatType::Sense,
        ]
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            StatType::Strength => "STR",
            StatType::Vitality => "VIT",
            StatType::Agility => "AGI",
            StatType::Intelligence => "INT",
            StatType::Sense => "SEN",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StatType::Strength => 0,
            StatType::Vitality => 1,
            StatType::Agility => 2,
            StatType::Intelligence => 3,
            StatType::Sense => 4,
        }
    }
}

/// Stat block. New accounts start from zero in everything; points come
/// from level-ups and per-quest category increments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Stats {
    values: [u32; 5],
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: StatType) -> u32 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: StatType, value: u32) {
        self.values[stat.index()] = value;
    }

    pub fn increment(&mut self, stat: StatType) {
        self.values[stat.index()] = self.values[stat.index()].saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

/// Spends one point from `balance` on `stat`. Rejected at zero balance,
/// leaving both untouched.
pub fn spend_stat_point(stats: &mut Stats, balance: &mut u32, stat: StatType) -> Result<(), GameError> {
    if *balance == 0 {
        return Err(GameError::Invariant(
            "no stat points available to spend".to_string(),
        ));
    }
    *balance -= 1;
    stats.increment(stat);
    Ok(())
}
