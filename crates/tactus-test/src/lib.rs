#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::manual_assert)]
#![allow(clippy::module_name_repetitions)]
//! Testing harness for Tactus gesture recognizers.
//!
//! Script touches frame by frame against named recognizers and assert on the
//! notifications they produced:
//!
//! ```
//! use tactus_core::{GestureRecognizer, GestureState};
//! use tactus_test::GestureHarness;
//!
//! let mut harness = GestureHarness::new();
//! harness.add("pan", GestureRecognizer::pan());
//! harness.touch_down(1, 0.0, 0.0).drag_to(1, 120.0, 0.0, 6).lift(1);
//! harness.assert_reached("pan", GestureState::Ended);
//! ```

mod harness;
mod transcript;

pub use harness::{GestureHarness, FRAME_MS};
pub use transcript::{StateChange, Transcript};
