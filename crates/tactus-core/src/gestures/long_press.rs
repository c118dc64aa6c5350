//! Press-and-hold recognition.

use crate::recognizer::{GestureHooks, GestureState, HookContext};
use crate::time::seconds_between;
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Long-press configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongPressConfig {
    /// How long the touch must be held.
    pub minimum_duration_seconds: f32,
    /// How far the focus may drift before the press fails.
    pub threshold_units: f32,
}

impl Default for LongPressConfig {
    fn default() -> Self {
        Self {
            minimum_duration_seconds: 0.6,
            threshold_units: 0.35,
        }
    }
}

/// Long-press recognizer state.
///
/// The hold is measured on moved and stationary deliveries, so the host must
/// keep reporting a resting finger every frame.
#[derive(Debug, Clone, Default)]
pub struct LongPressGesture {
    /// Configuration.
    pub config: LongPressConfig,
    pressed_at: Option<Duration>,
}

impl LongPressGesture {
    /// Create with a configuration.
    #[must_use]
    pub fn with_config(config: LongPressConfig) -> Self {
        Self {
            config,
            pressed_at: None,
        }
    }
}

impl GestureHooks for LongPressGesture {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, _touches: &[TouchPoint]) {
        self.pressed_at = Some(cx.now());
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        cx.calculate_focus();
        let state = cx.state();
        if state.is_in_progress() {
            cx.request(GestureState::Executing);
        } else if state == GestureState::Possible && cx.touch_count_in_range() {
            let moved = cx.distance(cx.core().distance_x(), cx.core().distance_y());
            let held = self
                .pressed_at
                .map_or(0.0, |pressed| seconds_between(pressed, cx.now()));
            if moved > self.config.threshold_units {
                cx.request(GestureState::Failed);
            } else if held >= self.config.minimum_duration_seconds {
                cx.request(GestureState::Began);
            } else {
                cx.request(GestureState::Possible);
            }
        }
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        if cx.state().is_in_progress() {
            cx.calculate_focus();
            cx.request(GestureState::Ended);
        } else {
            cx.request(GestureState::Failed);
        }
    }

    fn reset(&mut self) {
        self.pressed_at = None;
    }
}
