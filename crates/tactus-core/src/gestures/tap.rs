//! Tap and multi-tap recognition.

use crate::recognizer::{GestureHooks, GestureState, GestureTimer, HookContext};
use crate::time::seconds_between;
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Taps needed to end the gesture.
    pub number_of_taps_required: u32,
    /// Longest a tap may be held, and longest pause between repeat taps.
    pub threshold_seconds: f32,
    /// How far a tap may land from the first tap's start position.
    pub threshold_units: f32,
    /// Report `Began` on touch down.
    pub send_begin_state: bool,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            number_of_taps_required: 1,
            threshold_seconds: 0.4,
            threshold_units: 0.3,
            send_begin_state: false,
        }
    }
}

/// Tap recognizer state.
#[derive(Debug, Clone, Default)]
pub struct TapGesture {
    /// Configuration.
    pub config: TapConfig,
    tap_count: u32,
    timer_started: Option<Duration>,
    tap_touches: Vec<TouchPoint>,
}

impl TapGesture {
    /// Create with a configuration.
    #[must_use]
    pub fn with_config(config: TapConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Taps completed in the current attempt.
    #[must_use]
    pub const fn tap_count(&self) -> u32 {
        self.tap_count
    }

    /// Touches that started taps in the current attempt.
    #[must_use]
    pub fn tap_touches(&self) -> &[TouchPoint] {
        &self.tap_touches
    }

    fn elapsed(&self, cx: &HookContext<'_>) -> f32 {
        self.timer_started
            .map_or(0.0, |started| seconds_between(started, cx.now()))
    }

    fn clear(&mut self) {
        self.tap_count = 0;
        self.timer_started = None;
        self.tap_touches.clear();
    }
}

impl GestureHooks for TapGesture {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, touches: &[TouchPoint]) {
        for touch in touches {
            if !cx.ignore_touch(touch.id()) {
                cx.request(GestureState::Failed);
                return;
            }
        }

        cx.calculate_focus();
        self.timer_started = Some(cx.now());
        if self.tap_count == 0 {
            cx.track_start_locations();
        }
        self.tap_touches.extend_from_slice(touches);

        if self.config.send_begin_state && cx.touch_count_in_range() {
            cx.request(GestureState::Began);
        } else {
            cx.request(GestureState::Possible);
        }
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        cx.calculate_focus();
        if self.elapsed(cx) >= self.config.threshold_seconds {
            cx.request(GestureState::Failed);
        }
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        if self.elapsed(cx) > self.config.threshold_seconds {
            cx.request(GestureState::Failed);
            return;
        }

        cx.calculate_focus();
        if !cx.tracked_touches_within(self.config.threshold_units) {
            cx.request(GestureState::Failed);
            return;
        }

        self.tap_count += 1;
        if self.tap_count >= self.config.number_of_taps_required.max(1) {
            cx.request(GestureState::Ended);
        } else {
            self.timer_started = Some(cx.now());
            let wait = Duration::try_from_secs_f32(self.config.threshold_seconds).unwrap_or_default();
            cx.run_after(wait, GestureTimer::TapTimeout);
        }
    }

    fn timer_fired(&mut self, cx: &mut HookContext<'_>, timer: GestureTimer) {
        if timer == GestureTimer::TapTimeout
            && cx.state() == GestureState::Possible
            && self.elapsed(cx) >= self.config.threshold_seconds
        {
            tracing::trace!(taps = self.tap_count, "repeat tap timed out");
            cx.request(GestureState::Failed);
        }
    }

    fn state_changed(&mut self, state: GestureState) {
        if matches!(state, GestureState::Failed | GestureState::Ended) {
            self.clear();
        }
    }

    fn reset(&mut self) {
        self.clear();
    }
}
