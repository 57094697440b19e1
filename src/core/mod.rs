//! Core progression state and logic.

pub mod daily_reset;
pub mod engine;
pub mod merge;
pub mod player;
pub mod progression;
pub mod reminders;
pub mod stats;
pub mod task;

pub use daily_reset::*;
pub use engine::*;
pub use merge::*;
pub use player::*;
pub use progression::*;
pub use reminders::*;
pub use stats::*;
pub use task::*;
