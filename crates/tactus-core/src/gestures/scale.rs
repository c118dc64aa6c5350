//! Two-finger pinch recognition.
//!
//! Distance changes between the two touches go through a hysteresis filter on
//! squared distances so finger jitter neither publishes tiny zoom steps nor
//! flips the zoom direction back and forth.

use crate::recognizer::{GestureHooks, GestureState, HookContext};
use crate::time::seconds_between;
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Squared-distance ratio accepted while the fingers keep moving.
const MINIMUM_RESOLUTION_SQUARED: f32 = 1.005;
/// Squared-distance ratio accepted after the fingers rested.
const STATIONARY_RESOLUTION_SQUARED: f32 = 1.05;
/// Squared-distance ratio needed to reverse the zoom direction.
const HYSTERESIS_RATIO_SQUARED: f32 = 1.15;
/// Time without an accepted change after which the fingers count as resting.
const STATIONARY_SECONDS: f32 = 0.1;
/// Time without an accepted change after which the direction is forgotten.
const RESET_DIRECTION_SECONDS: f32 = 0.25;
/// Per-update multiplier bounds.
const MIN_SCALE: f32 = 0.25;
const MAX_SCALE: f32 = 4.0;

/// Scale configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Amplifies each step away from 1.0.
    pub zoom_speed: f32,
    /// Change in finger distance that starts the gesture.
    pub threshold_units: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            zoom_speed: 3.0,
            threshold_units: 0.15,
        }
    }
}

/// Two-finger scale recognizer state.
#[derive(Debug, Clone)]
pub struct ScaleGesture {
    /// Configuration.
    pub config: ScaleConfig,
    scale_multiplier: f32,
    scale_multiplier_x: f32,
    scale_multiplier_y: f32,
    previous_distance: f32,
    previous_distance_x: f32,
    previous_distance_y: f32,
    previous_direction: f32,
    last_change_at: Option<Duration>,
}

impl Default for ScaleGesture {
    fn default() -> Self {
        Self::with_config(ScaleConfig::default())
    }
}

impl ScaleGesture {
    /// Create with a configuration.
    #[must_use]
    pub const fn with_config(config: ScaleConfig) -> Self {
        Self {
            config,
            scale_multiplier: 1.0,
            scale_multiplier_x: 1.0,
            scale_multiplier_y: 1.0,
            previous_distance: 0.0,
            previous_distance_x: 0.0,
            previous_distance_y: 0.0,
            previous_direction: 0.0,
            last_change_at: None,
        }
    }

    /// Scale step of the last update; multiply the current zoom by it.
    #[must_use]
    pub const fn scale_multiplier(&self) -> f32 {
        self.scale_multiplier
    }

    /// Horizontal scale step of the last update.
    #[must_use]
    pub const fn scale_multiplier_x(&self) -> f32 {
        self.scale_multiplier_x
    }

    /// Vertical scale step of the last update.
    #[must_use]
    pub const fn scale_multiplier_y(&self) -> f32 {
        self.scale_multiplier_y
    }

    fn step(&self, ratio: f32) -> f32 {
        let value = ratio.clamp(MIN_SCALE, MAX_SCALE);
        if self.config.zoom_speed == 1.0 {
            return value;
        }
        let amplified = if value < 1.0 {
            value - (1.0 - value) * self.config.zoom_speed
        } else {
            value + (value - 1.0) * self.config.zoom_speed
        };
        amplified.clamp(MIN_SCALE, MAX_SCALE)
    }

    fn reset_multipliers(&mut self) {
        self.scale_multiplier = 1.0;
        self.scale_multiplier_x = 1.0;
        self.scale_multiplier_y = 1.0;
    }

    fn remember(&mut self, distance: f32, distance_x: f32, distance_y: f32) {
        self.previous_distance = distance;
        self.previous_distance_x = distance_x;
        self.previous_distance_y = distance_y;
    }

    fn track_change(&mut self, cx: &mut HookContext<'_>, distance: f32, dx: f32, dy: f32) {
        let now = cx.now();
        let since_change = self
            .last_change_at
            .map_or(f32::INFINITY, |at| seconds_between(at, now));

        let mut jitter = if since_change <= STATIONARY_SECONDS {
            MINIMUM_RESOLUTION_SQUARED
        } else {
            STATIONARY_RESOLUTION_SQUARED
        };
        let current_sq = distance * distance;
        let previous_sq = self.previous_distance * self.previous_distance;
        if (current_sq - previous_sq) * self.previous_direction < 0.0 {
            jitter = jitter.max(HYSTERESIS_RATIO_SQUARED);
        }

        if previous_sq > jitter * current_sq || current_sq > jitter * previous_sq {
            self.last_change_at = Some(now);
            let direction = if current_sq > previous_sq { 1.0 } else { -1.0 };
            if direction == self.previous_direction {
                self.scale_multiplier = self.step(ratio(distance, self.previous_distance));
                self.scale_multiplier_x = self.step(ratio(dx, self.previous_distance_x));
                self.scale_multiplier_y = self.step(ratio(dy, self.previous_distance_y));
                cx.request(GestureState::Executing);
            } else {
                self.reset_multipliers();
                self.previous_direction = direction;
            }
            self.remember(distance, dx, dy);
        } else if since_change > RESET_DIRECTION_SECONDS {
            self.previous_direction = 0.0;
        }
    }
}

fn ratio(current: f32, previous: f32) -> f32 {
    if previous == 0.0 {
        1.0
    } else {
        current / previous
    }
}

impl GestureHooks for ScaleGesture {
    fn touches_began(&mut self, _cx: &mut HookContext<'_>, _touches: &[TouchPoint]) {
        self.previous_distance = 0.0;
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        cx.calculate_focus();
        if !cx.touch_count_in_range() {
            return;
        }

        let (a, b) = match cx.touches() {
            [a, b, ..] => (a.position(), b.position()),
            _ => return,
        };
        let distance = cx.distance_between(a, b);
        let distance_x = cx.length(a.x - b.x);
        let distance_y = cx.length(a.y - b.y);

        match cx.state() {
            GestureState::Possible => {
                if self.previous_distance == 0.0 {
                    self.remember(distance, distance_x, distance_y);
                } else if (self.previous_distance - distance).abs() >= self.config.threshold_units
                {
                    cx.request(GestureState::Began);
                }
            }
            GestureState::Executing => {
                if distance != self.previous_distance {
                    self.track_change(cx, distance, distance_x, distance_y);
                }
            }
            GestureState::Began => {
                self.reset_multipliers();
                self.previous_direction = 0.0;
                self.remember(distance, distance_x, distance_y);
                cx.request(GestureState::Executing);
            }
            _ => cx.request(GestureState::Possible),
        }
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        if cx.state() == GestureState::Executing {
            cx.calculate_focus();
            cx.request(GestureState::Ended);
        } else {
            cx.request(GestureState::Failed);
        }
    }

    fn reset(&mut self) {
        self.reset_multipliers();
        self.remember(0.0, 0.0, 0.0);
        self.previous_direction = 0.0;
        self.last_change_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_step_clamped() {
        let scale = ScaleGesture::with_config(ScaleConfig {
            zoom_speed: 1.0,
            ..ScaleConfig::default()
        });
        assert_eq!(scale.step(10.0), MAX_SCALE);
        assert_eq!(scale.step(0.01), MIN_SCALE);
        assert_eq!(scale.step(1.5), 1.5);
    }

    #[test]
    fn test_scale_step_amplified_by_zoom_speed() {
        let scale = ScaleGesture::default();
        assert!((scale.step(1.1) - 1.4).abs() < 1e-5);
        assert!((scale.step(0.9) - 0.6).abs() < 1e-5);
        assert_eq!(scale.step(1.0), 1.0);
        assert_eq!(scale.step(3.0), MAX_SCALE);
    }

    #[test]
    fn test_ratio_guards_zero() {
        assert_eq!(ratio(5.0, 0.0), 1.0);
        assert_eq!(ratio(6.0, 3.0), 2.0);
    }

    #[test]
    fn test_scale_defaults() {
        let scale = ScaleGesture::default();
        assert_eq!(scale.scale_multiplier(), 1.0);
        assert_eq!(scale.scale_multiplier_x(), 1.0);
        assert_eq!(scale.scale_multiplier_y(), 1.0);
        assert!((scale.config.zoom_speed - 3.0).abs() < 1e-6);
    }
}
