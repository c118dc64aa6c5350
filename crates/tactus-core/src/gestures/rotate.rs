//! Two-finger twist recognition.

use crate::recognizer::{GestureHooks, GestureState, HookContext};
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};

/// Smallest opposite-sign step that reverses the rotation direction.
const MIN_ANGLE_TO_CHANGE_DIRECTION: f32 = 0.15;

/// Signed difference `a - b` wrapped into (-π, π].
#[must_use]
pub fn angle_difference(a: f32, b: f32) -> f32 {
    let angle = a - b;
    angle.sin().atan2(angle.cos())
}

/// Rotate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    /// Angle change in radians that starts the gesture.
    pub angle_threshold: f32,
    /// Focus distance required before the angle is considered.
    pub threshold_units: f32,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            angle_threshold: 0.05,
            threshold_units: 0.0,
        }
    }
}

/// Angle bookkeeping shared by the rotate recognizers.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RotationTracker {
    start_angle: Option<f32>,
    previous_angle: f32,
    previous_sign: f32,
    pub(crate) radians: f32,
    pub(crate) radians_delta: f32,
}

impl RotationTracker {
    /// Latch the start angle, then request `Began` once the angle moved far
    /// enough from it.
    pub(crate) fn check_for_start(
        &mut self,
        cx: &mut HookContext<'_>,
        angle: f32,
        angle_threshold: f32,
    ) {
        match self.start_angle {
            None => {
                self.start_angle = Some(angle);
                self.previous_angle = angle;
            }
            Some(start) => {
                if angle_difference(angle, start).abs() >= angle_threshold {
                    self.previous_sign = 0.0;
                    cx.request(GestureState::Began);
                }
            }
        }
    }

    /// Publish rotation for `angle`, ignoring small wobbles against the
    /// current direction.
    pub(crate) fn update(&mut self, cx: &mut HookContext<'_>, angle: f32) {
        let from_previous = angle_difference(angle, self.previous_angle);
        if from_previous == 0.0 {
            return;
        }
        let sign = if from_previous >= 0.0 { 1.0 } else { -1.0 };
        let accepted = self.previous_sign == 0.0
            || sign == self.previous_sign
            || from_previous.abs() >= MIN_ANGLE_TO_CHANGE_DIRECTION;
        if !accepted {
            return;
        }
        if sign == self.previous_sign {
            let start = self.start_angle.unwrap_or(self.previous_angle);
            self.radians = angle_difference(angle, start);
            self.radians_delta = from_previous;
            self.previous_angle = angle;
            cx.request(GestureState::Executing);
        } else {
            self.previous_sign = sign;
            self.start_angle = Some(angle);
            self.previous_angle = angle;
        }
    }

    pub(crate) fn state_changed(&mut self, state: GestureState) {
        if matches!(state, GestureState::Ended | GestureState::Failed) {
            self.start_angle = None;
            self.radians = 0.0;
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Ending rule shared by the rotate recognizers.
pub(crate) fn end_rotation(cx: &mut HookContext<'_>) {
    match cx.state() {
        GestureState::Possible => cx.request(GestureState::Failed),
        GestureState::Began | GestureState::Executing => {
            cx.calculate_focus();
            cx.request(GestureState::Ended);
        }
        _ => {}
    }
}

/// Two-finger rotate recognizer state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateGesture {
    /// Configuration.
    pub config: RotateConfig,
    tracker: RotationTracker,
}

impl RotateGesture {
    /// Create with a configuration.
    #[must_use]
    pub fn with_config(config: RotateConfig) -> Self {
        Self {
            config,
            tracker: RotationTracker::default(),
        }
    }

    /// Rotation since the gesture began, in radians.
    #[must_use]
    pub const fn rotation_radians(&self) -> f32 {
        self.tracker.radians
    }

    /// Rotation of the last update, in radians.
    #[must_use]
    pub const fn rotation_radians_delta(&self) -> f32 {
        self.tracker.radians_delta
    }

    /// Rotation since the gesture began, in degrees.
    #[must_use]
    pub fn rotation_degrees(&self) -> f32 {
        self.tracker.radians.to_degrees()
    }

    /// Rotation of the last update, in degrees.
    #[must_use]
    pub fn rotation_degrees_delta(&self) -> f32 {
        self.tracker.radians_delta.to_degrees()
    }

    fn current_angle(cx: &HookContext<'_>) -> Option<f32> {
        match cx.touches() {
            [a, b, ..] => Some((a.y() - b.y()).atan2(a.x() - b.x())),
            _ => None,
        }
    }
}

impl GestureHooks for RotateGesture {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, _touches: &[TouchPoint]) {
        cx.calculate_focus();
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        if cx.touches().len() != cx.core().max_touches() {
            return;
        }
        match cx.state() {
            GestureState::Possible => {
                cx.calculate_focus();
                let core = cx.core();
                if !cx.touch_count_in_range()
                    || cx.distance(core.distance_x(), core.distance_y())
                        < self.config.threshold_units
                {
                    return;
                }
                if let Some(angle) = Self::current_angle(cx) {
                    self.tracker
                        .check_for_start(cx, angle, self.config.angle_threshold);
                }
            }
            GestureState::Began | GestureState::Executing => {
                cx.calculate_focus();
                if let Some(angle) = Self::current_angle(cx) {
                    self.tracker.update(cx, angle);
                }
            }
            _ => {}
        }
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        end_rotation(cx);
    }

    fn state_changed(&mut self, state: GestureState) {
        self.tracker.state_changed(state);
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}
