//! Concrete gesture recognizers.
//!
//! Each kind pairs a serde `*Config` with a `*Gesture` state type that
//! implements [`GestureHooks`](crate::GestureHooks).

mod long_press;
mod one_touch_rotate;
mod one_touch_scale;
mod pan;
mod rotate;
mod scale;
mod swipe;
mod tap;

pub use long_press::{LongPressConfig, LongPressGesture};
pub use one_touch_rotate::{OneTouchRotateConfig, OneTouchRotateGesture};
pub use one_touch_scale::{OneTouchScaleConfig, OneTouchScaleGesture};
pub use pan::{PanConfig, PanGesture};
pub use rotate::{angle_difference, RotateConfig, RotateGesture};
pub use scale::{ScaleConfig, ScaleGesture};
pub use swipe::{SwipeConfig, SwipeDirection, SwipeEndMode, SwipeGesture};
pub use tap::{TapConfig, TapGesture};
