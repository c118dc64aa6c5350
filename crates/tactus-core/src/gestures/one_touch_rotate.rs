//! One-finger rotation around an anchor or the touch's start point.

use super::rotate::{end_rotation, RotationTracker};
use crate::geometry::Point;
use crate::recognizer::{GestureHooks, GestureState, HookContext};
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};

/// One-touch rotate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneTouchRotateConfig {
    /// Angle change in radians that starts the gesture.
    pub angle_threshold: f32,
    /// Focus distance required before the angle is considered.
    pub threshold_units: f32,
    /// Pixel position the angle is measured around. Without one the angle is
    /// that of the focus displacement from its start.
    pub anchor: Option<Point>,
}

impl Default for OneTouchRotateConfig {
    fn default() -> Self {
        Self {
            angle_threshold: 0.0,
            threshold_units: 0.15,
            anchor: None,
        }
    }
}

/// One-touch rotate recognizer state.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneTouchRotateGesture {
    /// Configuration.
    pub config: OneTouchRotateConfig,
    tracker: RotationTracker,
}

impl OneTouchRotateGesture {
    /// Create with a configuration.
    #[must_use]
    pub fn with_config(config: OneTouchRotateConfig) -> Self {
        Self {
            config,
            tracker: RotationTracker::default(),
        }
    }

    /// Measure the angle around `anchor` (pixels), e.g. the centre of the
    /// object being turned.
    pub fn set_anchor(&mut self, anchor: Option<Point>) {
        self.config.anchor = anchor;
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

    fn current_angle(&self, cx: &HookContext<'_>) -> f32 {
        match (self.config.anchor, cx.touches().first()) {
            (Some(anchor), Some(touch)) => (touch.y() - anchor.y).atan2(touch.x() - anchor.x),
            _ => {
                let distance = cx.core().distance();
                distance.y.atan2(distance.x)
            }
        }
    }
}

impl GestureHooks for OneTouchRotateGesture {
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
                let angle = self.current_angle(cx);
                self.tracker
                    .check_for_start(cx, angle, self.config.angle_threshold);
            }
            GestureState::Began | GestureState::Executing => {
                cx.calculate_focus();
                let angle = self.current_angle(cx);
                self.tracker.update(cx, angle);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_touch_rotate_defaults() {
        let gesture = OneTouchRotateGesture::default();
        assert_eq!(gesture.config.angle_threshold, 0.0);
        assert!((gesture.config.threshold_units - 0.15).abs() < 1e-6);
        assert!(gesture.config.anchor.is_none());
        assert_eq!(gesture.rotation_radians(), 0.0);
    }

    #[test]
    fn test_one_touch_rotate_anchor_from_toml() {
        let config: OneTouchRotateConfig =
            toml::from_str("anchor = { x = 100.0, y = 50.0 }").expect("valid config");
        assert_eq!(config.anchor, Some(Point::new(100.0, 50.0)));

        let mut gesture = OneTouchRotateGesture::with_config(config);
        gesture.set_anchor(None);
        assert!(gesture.config.anchor.is_none());
    }
}
