//! Drag recognition.

use crate::recognizer::{GestureHooks, GestureState, HookContext};
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};

/// Pan configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Focus distance that starts the pan.
    pub threshold_units: f32,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            threshold_units: 0.2,
        }
    }
}

/// Pan recognizer state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanGesture {
    /// Configuration.
    pub config: PanConfig,
}

impl PanGesture {
    /// Create with a configuration.
    #[must_use]
    pub const fn with_config(config: PanConfig) -> Self {
        Self { config }
    }

    fn process(&self, cx: &mut HookContext<'_>, reset_focus: bool) {
        let first = if reset_focus {
            cx.recalculate_focus_from_here()
        } else {
            cx.calculate_focus()
        };
        let state = cx.state();
        if state.is_in_progress() {
            cx.request(GestureState::Executing);
        } else if first {
            cx.request(GestureState::Possible);
        } else if state == GestureState::Possible && cx.touch_count_in_range() {
            let moved = cx.distance(cx.core().distance_x(), cx.core().distance_y());
            if moved >= self.config.threshold_units {
                cx.request(GestureState::Began);
            } else {
                cx.request(GestureState::Possible);
            }
        }
    }
}

impl GestureHooks for PanGesture {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, _touches: &[TouchPoint]) {
        self.process(cx, true);
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        self.process(cx, false);
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        if cx.state() == GestureState::Possible {
            cx.request(GestureState::Failed);
        } else {
            self.process(cx, false);
            cx.request(GestureState::Ended);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_config_default() {
        assert!((PanConfig::default().threshold_units - 0.2).abs() < 1e-6);
        let pan = PanGesture::with_config(PanConfig {
            threshold_units: 0.5,
        });
        assert_eq!(pan.config.threshold_units, 0.5);
    }
}
