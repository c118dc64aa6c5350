//! Fast directional flick recognition.

use crate::recognizer::{GestureHooks, GestureState, HookContext, Transition};
use crate::touch::TouchPoint;
use serde::{Deserialize, Serialize};

/// Direction of a swipe. Vertical directions assume y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// Toward negative x.
    Left,
    /// Toward positive x.
    Right,
    /// Toward negative y.
    Down,
    /// Toward positive y.
    Up,
    /// Any direction, or not yet resolved.
    #[default]
    Any,
}

/// When a qualifying swipe ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwipeEndMode {
    /// End as soon as the swipe qualifies and release the touch.
    #[default]
    EndImmediately,
    /// End as soon as the swipe qualifies but keep the touch, so the same
    /// finger can swipe again.
    EndContinuously,
    /// End only when the touch lifts.
    EndWhenTouchEnds,
}

/// Swipe configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Direction to accept.
    pub direction: SwipeDirection,
    /// Focus distance the swipe must cover.
    pub minimum_distance_units: f32,
    /// Speed the swipe must reach, in units per second.
    pub minimum_speed_units: f32,
    /// How dominant the main axis must be; values <= 1 disable the check.
    pub direction_threshold: f32,
    /// When to end.
    pub end_mode: SwipeEndMode,
    /// Fail when the resolved direction changes mid-gesture.
    pub fail_on_direction_change: bool,
    /// Report `Began`/`Executing` while a qualifying swipe is in flight.
    pub send_begin_executing_states: bool,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            direction: SwipeDirection::Any,
            minimum_distance_units: 1.0,
            minimum_speed_units: 3.0,
            direction_threshold: 1.5,
            end_mode: SwipeEndMode::EndImmediately,
            fail_on_direction_change: false,
            send_begin_executing_states: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Pending,
    Ended,
    Failed,
}

/// Swipe recognizer state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeGesture {
    /// Configuration.
    pub config: SwipeConfig,
    end_direction: SwipeDirection,
}

impl SwipeGesture {
    /// Create with a configuration.
    #[must_use]
    pub fn with_config(config: SwipeConfig) -> Self {
        Self {
            config,
            end_direction: SwipeDirection::Any,
        }
    }

    /// Direction resolved for the current or last swipe.
    #[must_use]
    pub const fn end_direction(&self) -> SwipeDirection {
        self.end_direction
    }

    /// Resolve the direction from the focus velocity. `None` when the sample
    /// is inconclusive, `Some(false)` when a direction change failed the swipe.
    fn resolve_direction(&mut self, cx: &mut HookContext<'_>) -> Option<bool> {
        let previous = self.end_direction;
        let velocity = cx.core().velocity();
        let (abs_x, abs_y) = (velocity.x.abs(), velocity.y.abs());
        let threshold = self.config.direction_threshold;

        if abs_x > abs_y {
            if threshold > 1.0 && abs_x / abs_y < threshold {
                return None;
            }
            self.end_direction = if velocity.x > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
        } else {
            if threshold > 1.0 && abs_y / abs_x < threshold {
                return None;
            }
            self.end_direction = if velocity.y < 0.0 {
                SwipeDirection::Down
            } else {
                SwipeDirection::Up
            };
        }

        if self.config.fail_on_direction_change
            && cx.state() != GestureState::Possible
            && previous != SwipeDirection::Any
            && previous != self.end_direction
        {
            cx.request(GestureState::Failed);
            return Some(false);
        }
        Some(true)
    }

    fn check_completion(&mut self, cx: &mut HookContext<'_>, end: bool) -> Completion {
        let minimum_speed = cx.units_to_pixels(self.config.minimum_speed_units);
        if cx.core().speed() < minimum_speed || !cx.touch_count_in_range() {
            cx.recalculate_focus_from_here();
            return Completion::Pending;
        }

        let core = cx.core();
        let start = core.start_focus().unwrap_or_else(|| core.focus());
        if cx.distance_between(start, core.focus()) < self.config.minimum_distance_units {
            return Completion::Pending;
        }
        match self.resolve_direction(cx) {
            None => return Completion::Pending,
            Some(false) => return Completion::Failed,
            Some(true) => {}
        }

        let wanted = self.config.direction;
        if wanted != SwipeDirection::Any && wanted != self.end_direction {
            return Completion::Pending;
        }
        if end {
            let transition = Transition::to(GestureState::Ended);
            if self.config.end_mode == SwipeEndMode::EndContinuously {
                cx.request(transition);
            } else {
                cx.request(transition.releasing_touches());
            }
            return Completion::Ended;
        }
        if !self.config.send_begin_executing_states {
            cx.request(GestureState::Possible);
        } else if cx.state() == GestureState::Possible {
            cx.request(GestureState::Began);
        } else if cx.state().is_in_progress() {
            cx.request(GestureState::Executing);
        }
        Completion::Pending
    }
}

impl GestureHooks for SwipeGesture {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, _touches: &[TouchPoint]) {
        cx.calculate_focus();
        self.end_direction = SwipeDirection::Any;
        cx.request(GestureState::Possible);
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        cx.calculate_focus();
        let end = self.config.end_mode != SwipeEndMode::EndWhenTouchEnds;
        self.check_completion(cx, end);
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        cx.calculate_focus();
        let completion = if cx.state().is_trackable() {
            self.check_completion(cx, true)
        } else {
            Completion::Pending
        };
        if completion == Completion::Pending {
            cx.request(GestureState::Failed);
        }
    }

    fn reset(&mut self) {
        self.end_direction = SwipeDirection::Any;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_config_default() {
        let config = SwipeConfig::default();
        assert_eq!(config.direction, SwipeDirection::Any);
        assert_eq!(config.minimum_distance_units, 1.0);
        assert_eq!(config.minimum_speed_units, 3.0);
        assert_eq!(config.direction_threshold, 1.5);
        assert_eq!(config.end_mode, SwipeEndMode::EndImmediately);
        assert!(!config.fail_on_direction_change);
        assert!(config.send_begin_executing_states);
    }

    #[test]
    fn test_swipe_direction_serde_names() {
        let config: SwipeConfig =
            toml::from_str("direction = \"up\"\nend_mode = \"end_continuously\"").expect("valid");
        assert_eq!(config.direction, SwipeDirection::Up);
        assert_eq!(config.end_mode, SwipeEndMode::EndContinuously);
    }

    #[test]
    fn test_swipe_reset_clears_direction() {
        let mut swipe = SwipeGesture::default();
        swipe.end_direction = SwipeDirection::Left;
        swipe.reset();
        assert_eq!(swipe.end_direction(), SwipeDirection::Any);
    }
}
