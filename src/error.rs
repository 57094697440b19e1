//! Domain error taxonomy for the progression engine.
//!
//! Validation and invariant errors are local and immediate: the snapshot
//! is either fully updated or untouched. Infrastructure errors (remote
//! store) live in [`crate::remote_store`] and never become fatal here.

use std::error::Error;
use std::fmt;

/// A rejected mutation. State is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Malformed input at the boundary (empty name, zero target, bad blob).
    Validation(String),
    /// A committed rule was violated (goal shrink, locked delete,
    /// spending a stat point with zero balance).
    Invariant(String),
    /// The referenced task id does not exist in the quest log.
    UnknownTask(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Validation(msg) => write!(f, "validation failed: {}", msg),
            GameError::Invariant(msg) => write!(f, "invariant violated: {}", msg),
            GameError::UnknownTask(id) => write!(f, "unknown task: {}", id),
        }
    }
}

impl Error for GameError {}
