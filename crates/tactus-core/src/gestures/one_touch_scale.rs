//! One-finger zoom: drag up to zoom in, down to zoom out.

use crate::recognizer::{GestureHooks, GestureState, HookContext};
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};

/// One-touch scale configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneTouchScaleConfig {
    /// Scale change per unit dragged; negate to invert the drag direction.
    pub zoom_speed: f32,
    /// Focus distance that starts the gesture.
    pub threshold_units: f32,
}

impl Default for OneTouchScaleConfig {
    fn default() -> Self {
        Self {
            zoom_speed: 0.2,
            threshold_units: 0.15,
        }
    }
}

/// One-touch scale recognizer state.
#[derive(Debug, Clone)]
pub struct OneTouchScaleGesture {
    /// Configuration.
    pub config: OneTouchScaleConfig,
    scale_multiplier: f32,
    scale_multiplier_x: f32,
    scale_multiplier_y: f32,
}

impl Default for OneTouchScaleGesture {
    fn default() -> Self {
        Self::with_config(OneTouchScaleConfig::default())
    }
}

impl OneTouchScaleGesture {
    /// Create with a configuration.
    #[must_use]
    pub const fn with_config(config: OneTouchScaleConfig) -> Self {
        Self {
            config,
            scale_multiplier: 1.0,
            scale_multiplier_x: 1.0,
            scale_multiplier_y: 1.0,
        }
    }

    /// Scale step of the last update.
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

    fn reset_multipliers(&mut self) {
        self.scale_multiplier = 1.0;
        self.scale_multiplier_x = 1.0;
        self.scale_multiplier_y = 1.0;
    }
}

/// Sign that is zero for zero, unlike [`f32::signum`].
fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl GestureHooks for OneTouchScaleGesture {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, _touches: &[TouchPoint]) {
        cx.calculate_focus();
        cx.request(GestureState::Possible);
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        cx.calculate_focus();
        if !cx.touch_count_in_range() {
            return;
        }

        let core = cx.core();
        if cx.state() == GestureState::Possible {
            if cx.distance(core.distance_x(), core.distance_y()) < self.config.threshold_units {
                return;
            }
            self.reset_multipliers();
            cx.request(GestureState::Began);
        } else {
            let (dx, dy) = (core.delta_x(), core.delta_y());
            if dx == 0.0 && dy == 0.0 {
                return;
            }
            let speed = self.config.zoom_speed;
            self.scale_multiplier = 1.0 + cx.distance(dx, dy) * sign(dy) * speed;
            self.scale_multiplier_x = 1.0 + cx.length(dx) * -sign(dx) * speed;
            self.scale_multiplier_y = 1.0 + cx.length(dy) * sign(dy) * speed;
            cx.request(GestureState::Executing);
        }
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        if cx.state() == GestureState::Possible {
            cx.request(GestureState::Failed);
        } else {
            cx.calculate_focus();
            cx.request(GestureState::Ended);
        }
    }

    fn reset(&mut self) {
        self.reset_multipliers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(-0.5), -1.0);
    }

    #[test]
    fn test_one_touch_scale_defaults() {
        let gesture = OneTouchScaleGesture::default();
        assert!((gesture.config.zoom_speed - 0.2).abs() < 1e-6);
        assert!((gesture.config.threshold_units - 0.15).abs() < 1e-6);
        assert_eq!(gesture.scale_multiplier(), 1.0);
    }
}
