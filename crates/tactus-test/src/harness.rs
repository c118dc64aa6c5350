//! Test harness for Tactus gesture recognizers.
//!
//! Drives an arena with a manual clock so gestures can be scripted frame by
//! frame and asserted on by name.

use std::collections::BTreeMap;
use tactus_core::{
    ArenaConfig, GestureArena, GestureId, GestureProfile, GestureRecognizer, GestureState,
    ManualClock, Result, TouchId, TouchPhase, TouchPoint,
};

use crate::transcript::Transcript;

/// Milliseconds between scripted frames.
pub const FRAME_MS: u64 = 16;

/// Scripted touch input against named recognizers.
pub struct GestureHarness {
    arena: GestureArena,
    clock: ManualClock,
    names: BTreeMap<String, GestureId>,
    transcript: Transcript,
    /// Touches currently down, by id.
    touches: BTreeMap<i32, TouchPoint>,
}

impl Default for GestureHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureHarness {
    /// Create a harness around an empty arena with default settings.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create a harness around an empty arena.
    pub fn with_config(config: ArenaConfig) -> Self {
        let clock = ManualClock::new();
        Self {
            arena: GestureArena::with_config(config).with_clock(clock.clone()),
            clock,
            names: BTreeMap::new(),
            transcript: Transcript::new(),
            touches: BTreeMap::new(),
        }
    }

    /// Create a harness with every recognizer of `profile` installed and
    /// recorded under its entry name.
    pub fn from_profile(profile: &GestureProfile) -> Result<Self> {
        let mut harness = Self::with_config(profile.arena);
        for (name, id) in profile.install(&mut harness.arena)? {
            let listener = harness.transcript.listener(name.as_str(), harness.clock.clone());
            if let Some(recognizer) = harness.arena.get_mut(id) {
                recognizer.set_listener(Some(listener));
            }
            harness.names.insert(name, id);
        }
        Ok(harness)
    }

    /// Register `recognizer` under `name` and record its notifications.
    pub fn add(&mut self, name: &str, recognizer: GestureRecognizer) -> GestureId {
        let mut recognizer = recognizer.with_label(name);
        recognizer.set_listener(Some(self.transcript.listener(name, self.clock.clone())));
        let id = self.arena.add(recognizer);
        self.names.insert(name.to_string(), id);
        id
    }

    // === Access ===

    /// The arena under test.
    pub fn arena(&self) -> &GestureArena {
        &self.arena
    }

    /// The arena under test, for relation setup.
    pub fn arena_mut(&mut self) -> &mut GestureArena {
        &mut self.arena
    }

    /// Clock driving the arena.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Handle of a named recognizer.
    pub fn id(&self, name: &str) -> Option<GestureId> {
        self.names.get(name).copied()
    }

    /// Named recognizer.
    pub fn recognizer(&self, name: &str) -> Option<&GestureRecognizer> {
        self.id(name).and_then(|id| self.arena.get(id))
    }

    /// Current state of a named recognizer.
    pub fn state(&self, name: &str) -> Option<GestureState> {
        self.recognizer(name).map(GestureRecognizer::state)
    }

    /// Everything recorded so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// States reported by a named recognizer.
    pub fn states_of(&self, name: &str) -> Vec<GestureState> {
        self.transcript.states_of(name)
    }

    // === Relations ===

    /// Let two named recognizers run together.
    ///
    /// # Panics
    ///
    /// Panics if either name is unknown.
    pub fn allow_simultaneous(&mut self, a: &str, b: &str) -> &mut Self {
        let (a, b) = (self.expect_id(a), self.expect_id(b));
        if let Err(err) = self.arena.allow_simultaneous(a, b) {
            panic!("allow_simultaneous failed: {err}");
        }
        self
    }

    /// Make `a` wait for `b` to fail.
    ///
    /// # Panics
    ///
    /// Panics if either name is unknown.
    pub fn require_failure_of(&mut self, a: &str, b: &str) -> &mut Self {
        let (a, b) = (self.expect_id(a), self.expect_id(b));
        if let Err(err) = self.arena.require_failure_of(a, b) {
            panic!("require_failure_of failed: {err}");
        }
        self
    }

    // === Input Simulation ===

    /// Put touch `id` down at `(x, y)`.
    pub fn touch_down(&mut self, id: i32, x: f32, y: f32) -> &mut Self {
        let touch = TouchPoint::new(TouchId(id), x, y).with_pressure(1.0);
        self.touches.insert(id, touch.clone());
        self.frame(vec![touch])
    }

    /// Move touch `id` to `(x, y)`. Unknown ids are ignored.
    pub fn move_to(&mut self, id: i32, x: f32, y: f32) -> &mut Self {
        self.move_all(&[(id, x, y)])
    }

    /// Move several touches in one frame. Unknown ids are ignored.
    pub fn move_all(&mut self, moves: &[(i32, f32, f32)]) -> &mut Self {
        let mut changed = Vec::new();
        for &(id, x, y) in moves {
            if let Some(touch) = self.touches.get_mut(&id) {
                *touch = touch.moved_to(x, y);
                changed.push(touch.clone());
            }
        }
        self.frame(changed)
    }

    /// Drag touch `id` in a straight line to `(x, y)` over `steps` frames,
    /// advancing the clock by [`FRAME_MS`] before each.
    pub fn drag_to(&mut self, id: i32, x: f32, y: f32, steps: u32) -> &mut Self {
        let Some(start) = self.touches.get(&id).map(TouchPoint::position) else {
            return self;
        };
        let steps = steps.max(1);
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            self.clock.advance_ms(FRAME_MS);
            self.move_to(id, start.x + (x - start.x) * t, start.y + (y - start.y) * t);
        }
        self
    }

    /// Lift touch `id`. Unknown ids are ignored.
    pub fn lift(&mut self, id: i32) -> &mut Self {
        self.release(id, TouchPhase::Ended)
    }

    /// Cancel touch `id`. Unknown ids are ignored.
    pub fn cancel(&mut self, id: i32) -> &mut Self {
        self.release(id, TouchPhase::Cancelled)
    }

    /// Let logical time pass and run due timers.
    pub fn advance_ms(&mut self, ms: u64) -> &mut Self {
        self.clock.advance_ms(ms);
        self.arena.poll_timers();
        self
    }

    /// Advance by `ms` and deliver a frame with every held touch stationary.
    pub fn tick(&mut self, ms: u64) -> &mut Self {
        self.clock.advance_ms(ms);
        let held: Vec<TouchPoint> = self
            .touches
            .values_mut()
            .map(|touch| {
                *touch = touch.in_place(TouchPhase::Stationary);
                touch.clone()
            })
            .collect();
        if held.is_empty() {
            self.arena.poll_timers();
            return self;
        }
        self.frame(held)
    }

    /// Tap with touch `id` at `(x, y)`, holding it for `hold_ms`.
    pub fn tap(&mut self, id: i32, x: f32, y: f32, hold_ms: u64) -> &mut Self {
        self.touch_down(id, x, y);
        self.clock.advance_ms(hold_ms);
        self.lift(id)
    }

    // === Assertions ===

    /// Assert the current state of a named recognizer.
    ///
    /// # Panics
    ///
    /// Panics if the state differs.
    pub fn assert_state(&self, name: &str, expected: GestureState) -> &Self {
        let actual = self.state(name);
        assert_eq!(
            actual,
            Some(expected),
            "Expected '{name}' to be {expected:?} but it is {actual:?}\n{}",
            self.transcript
        );
        self
    }

    /// Assert a named recognizer reported `state` at some point.
    ///
    /// # Panics
    ///
    /// Panics if it never did.
    pub fn assert_reached(&self, name: &str, state: GestureState) -> &Self {
        assert!(
            self.states_of(name).contains(&state),
            "Expected '{name}' to reach {state:?}\n{}",
            self.transcript
        );
        self
    }

    /// Assert a named recognizer never reported `state`.
    ///
    /// # Panics
    ///
    /// Panics if it did.
    pub fn assert_never(&self, name: &str, state: GestureState) -> &Self {
        assert!(
            !self.states_of(name).contains(&state),
            "Expected '{name}' never to be {state:?}\n{}",
            self.transcript
        );
        self
    }

    /// Assert the exact notifications of a named recognizer.
    ///
    /// # Panics
    ///
    /// Panics if they differ.
    pub fn assert_sequence(&self, name: &str, expected: &[GestureState]) -> &Self {
        let actual = self.states_of(name);
        assert_eq!(
            actual, expected,
            "Unexpected notifications for '{name}'\n{}",
            self.transcript
        );
        self
    }

    /// Assert how many recognizers are in the active registry.
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    pub fn assert_active_count(&self, expected: usize) -> &Self {
        let actual = self.arena.active_count();
        assert_eq!(
            actual, expected,
            "Expected {expected} active gestures but found {actual}"
        );
        self
    }

    // === Internal ===

    fn release(&mut self, id: i32, phase: TouchPhase) -> &mut Self {
        match self.touches.remove(&id) {
            Some(touch) => self.frame(vec![touch.in_place(phase)]),
            None => self,
        }
    }

    fn frame(&mut self, touches: Vec<TouchPoint>) -> &mut Self {
        if touches.is_empty() {
            return self;
        }
        if let Err(err) = self.arena.dispatch(&touches) {
            panic!("dispatch failed: {err}");
        }
        self
    }

    fn expect_id(&self, name: &str) -> GestureId {
        match self.id(name) {
            Some(id) => id,
            None => panic!("No recognizer named '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tactus_core::Clock;

    #[test]
    fn test_harness_names_recognizers() {
        let mut harness = GestureHarness::new();
        let id = harness.add("pan", GestureRecognizer::pan());
        assert_eq!(harness.id("pan"), Some(id));
        assert_eq!(
            harness.recognizer("pan").and_then(|r| r.core().label()),
            Some("pan")
        );
        assert!(harness.id("tap").is_none());
    }

    #[test]
    fn test_harness_tap() {
        let mut harness = GestureHarness::new();
        harness.add("tap", GestureRecognizer::tap());
        harness.tap(1, 10.0, 10.0, 50);
        harness
            .assert_reached("tap", GestureState::Ended)
            .assert_state("tap", GestureState::Possible);
    }

    #[test]
    fn test_harness_drag_moves_in_frames() {
        let mut harness = GestureHarness::new();
        harness.add("pan", GestureRecognizer::pan());
        harness.touch_down(1, 0.0, 0.0).drag_to(1, 200.0, 0.0, 4);
        assert_eq!(harness.clock().now(), Duration::from_millis(4 * FRAME_MS));
        harness.assert_state("pan", GestureState::Executing);
        harness.lift(1);
        harness.assert_reached("pan", GestureState::Ended);
    }

    #[test]
    fn test_harness_ignores_unknown_touch() {
        let mut harness = GestureHarness::new();
        harness.add("pan", GestureRecognizer::pan());
        harness.move_to(9, 10.0, 10.0).lift(9);
        assert!(harness.transcript().is_empty());
    }

    #[test]
    #[should_panic(expected = "Expected 'pan' to be Began")]
    fn test_harness_assert_state_fails() {
        let mut harness = GestureHarness::new();
        harness.add("pan", GestureRecognizer::pan());
        harness.assert_state("pan", GestureState::Began);
    }

    #[test]
    #[should_panic(expected = "No recognizer named 'ghost'")]
    fn test_harness_unknown_relation_name() {
        let mut harness = GestureHarness::new();
        harness.add("pan", GestureRecognizer::pan());
        harness.allow_simultaneous("pan", "ghost");
    }

    #[test]
    fn test_harness_from_profile() {
        let profile = GestureProfile::from_toml_str(
            r#"
            [[gestures]]
            name = "pan"
            gesture = { kind = "pan" }
            "#,
        )
        .expect("valid profile");
        let mut harness = GestureHarness::from_profile(&profile).expect("installs");
        harness.touch_down(1, 0.0, 0.0).drag_to(1, 100.0, 0.0, 2).lift(1);
        harness.assert_reached("pan", GestureState::Ended);
    }
}
