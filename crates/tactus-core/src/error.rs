//! Error types for tactus-core.
//!
//! Gesture disambiguation itself never errors: a rejected interpretation is a
//! `Failed` transition. These errors only describe misuse at the API boundary.

use crate::arena::GestureId;
use crate::touch::TouchId;
use thiserror::Error;

/// Errors returned by the arena and configuration loading.
#[derive(Debug, Error)]
pub enum GestureError {
    /// The same touch id appeared twice in one delivery.
    #[error("duplicate touch id {id} in one delivery")]
    DuplicateTouch {
        /// The repeated id.
        id: TouchId,
    },

    /// The handle does not name a live recognizer in this arena.
    #[error("unknown gesture {0}")]
    UnknownGesture(GestureId),

    /// The recognizer is already being processed further up the call stack.
    #[error("gesture {0} is already being processed")]
    Reentrant(GestureId),

    /// A gesture profile could not be parsed.
    #[error("invalid gesture profile: {0}")]
    Config(#[from] toml::de::Error),

    /// A gesture profile relation names an entry that does not exist.
    #[error("gesture profile references unknown entry '{0}'")]
    UnknownProfileEntry(String),

    /// Two gesture profile entries share a name.
    #[error("gesture profile defines '{0}' more than once")]
    DuplicateProfileEntry(String),
}

/// Result alias for fallible engine operations.
pub type Result<T> = std::result::Result<T, GestureError>;
