//! Multi-touch gesture recognition for Tactus.
//!
//! This crate turns a stream of touch frames into high-level gestures:
//! - Recognizers: tap, long press, pan, scale, rotate, their one-touch
//!   variants and swipe, all sharing [`RecognizerCore`] bookkeeping
//! - Arbitration: [`GestureArena`] owns recognizers, decides which may run
//!   together and holds back gestures that must wait for others to fail
//! - Time: an injectable [`Clock`] and [`Scheduler`] so timeouts are
//!   deterministic under test
//! - Configuration: serde types loadable from TOML via [`GestureProfile`]
//!
//! Coordinates are pixels with y growing upward; thresholds are in physical
//! units (inches at 200 DPI by default) converted through [`DeviceInfo`].

mod arena;
mod config;
mod device;
mod error;
mod geometry;
pub mod gestures;
mod recognizer;
mod relations;
mod schedule;
mod time;
mod touch;
mod velocity;

pub use arena::{GestureArena, GestureId};
pub use config::{
    ArenaConfig, GestureConfig, GestureEntry, GestureProfile, RecognizerOptions,
    RecognizerOverrides, ALL_GESTURES, DEFAULT_END_GRACE_SECONDS,
};
pub use device::{DeviceInfo, DEFAULT_DPI, MIN_UNIT_MULTIPLIER};
pub use error::{GestureError, Result};
pub use geometry::Point;
pub use recognizer::{
    GestureHooks, GestureKind, GestureRecognizer, GestureState, GestureTimer, HookContext,
    RecognizerCore, StateListener, Transition, ViewId,
};
pub use relations::{Peer, RelationGraph};
pub use schedule::{ScheduledTask, Scheduler, TimerQueue};
pub use time::{Clock, ManualClock, SystemClock};
pub use touch::{ensure_unique_ids, TouchId, TouchPayload, TouchPhase, TouchPoint};
pub use velocity::{VelocityTracker, VELOCITY_HISTORY};
