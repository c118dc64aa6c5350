//! Recognizer state shared by every gesture kind.
//!
//! A [`GestureRecognizer`] is a [`RecognizerCore`] (tracked touches, focus,
//! velocity, lifecycle flags) plus a [`GestureKind`] holding the kind-specific
//! logic. The arena drives the core through the entry points and calls the
//! kind's [`GestureHooks`], which read the core through a [`HookContext`] and
//! request transitions that the arena applies once the hook returns.

use crate::arena::GestureId;
use crate::config::RecognizerOptions;
use crate::device::DeviceInfo;
use crate::geometry::Point;
use crate::gestures::{
    LongPressGesture, OneTouchRotateGesture, OneTouchScaleGesture, PanGesture, RotateGesture,
    ScaleGesture, SwipeGesture, TapGesture,
};
use crate::touch::{TouchId, TouchPoint};
use crate::velocity::VelocityTracker;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GestureState {
    /// Watching touches, nothing recognized yet.
    #[default]
    Possible,
    /// Recognized; the first update of a continuous gesture.
    Began,
    /// Continuous gesture updating.
    Executing,
    /// Finished successfully.
    Ended,
    /// Wants to end but waits for a required recognizer to fail.
    EndPending,
    /// Rejected this touch sequence.
    Failed,
}

impl GestureState {
    /// `Possible`, `Began` or `Executing`: states that accept touches.
    #[must_use]
    pub const fn is_trackable(self) -> bool {
        matches!(self, Self::Possible | Self::Began | Self::Executing)
    }

    /// `Began` or `Executing`.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Began | Self::Executing)
    }
}

/// Opaque identifier of the platform view a recognizer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Kind-specific timers a recognizer can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureTimer {
    /// Tap: a repeat tap did not start in time.
    TapTimeout,
}

/// A state change requested by a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    target: GestureState,
    release_touches: bool,
}

impl Transition {
    /// Request `target`.
    #[must_use]
    pub const fn to(target: GestureState) -> Self {
        Self {
            target,
            release_touches: false,
        }
    }

    /// When this transition ends the gesture, drop the tracked touches even if
    /// the recognizer is configured to keep them.
    #[must_use]
    pub const fn releasing_touches(mut self) -> Self {
        self.release_touches = true;
        self
    }

    /// Requested state.
    #[must_use]
    pub const fn target(&self) -> GestureState {
        self.target
    }

    /// Whether tracked touches are released on end.
    #[must_use]
    pub const fn release_touches(&self) -> bool {
        self.release_touches
    }
}

impl From<GestureState> for Transition {
    fn from(target: GestureState) -> Self {
        Self::to(target)
    }
}

/// Callback fired on every committed state change.
pub type StateListener = Box<dyn FnMut(&GestureRecognizer)>;

// =============================================================================
// RecognizerCore
// =============================================================================

/// Engine-owned state common to all gesture kinds.
#[derive(Debug, Clone)]
pub struct RecognizerCore {
    id: Option<GestureId>,
    label: Option<String>,
    pub(crate) state: GestureState,
    options: RecognizerOptions,
    pub(crate) enabled: bool,
    view: Option<ViewId>,
    touches: Vec<TouchPoint>,
    ignored: HashSet<TouchId>,
    start_locations: Vec<Point>,
    start_focus: Option<Point>,
    previous_focus: Option<Point>,
    focus: Point,
    delta: Point,
    distance: Point,
    pressure: f32,
    velocity: VelocityTracker,
    pub(crate) just_failed: bool,
    pub(crate) just_ended: bool,
    pub(crate) restarting: bool,
    pub(crate) kept_touches_on_end: bool,
    last_tracked_count: usize,
    received_additional_touches: bool,
}

impl RecognizerCore {
    /// Create a core with the given options.
    #[must_use]
    pub fn new(options: RecognizerOptions) -> Self {
        Self {
            id: None,
            label: None,
            state: GestureState::Possible,
            options: options.normalized(),
            enabled: true,
            view: None,
            touches: Vec::new(),
            ignored: HashSet::new(),
            start_locations: Vec::new(),
            start_focus: None,
            previous_focus: None,
            focus: Point::ORIGIN,
            delta: Point::ORIGIN,
            distance: Point::ORIGIN,
            pressure: 0.0,
            velocity: VelocityTracker::new(),
            just_failed: false,
            just_ended: false,
            restarting: false,
            kept_touches_on_end: false,
            last_tracked_count: 0,
            received_additional_touches: false,
        }
    }

    // === Identity & configuration ===

    /// Handle assigned by the arena, once added.
    #[must_use]
    pub const fn id(&self) -> Option<GestureId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: GestureId) {
        self.id = Some(id);
    }

    /// Label used in logs and profiles.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set the label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    /// Whether deliveries are processed.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Effective options.
    #[must_use]
    pub const fn options(&self) -> &RecognizerOptions {
        &self.options
    }

    /// Replace all options, clamping touch counts.
    pub fn set_options(&mut self, options: RecognizerOptions) {
        self.options = options.normalized();
    }

    /// Minimum number of touches.
    #[must_use]
    pub const fn min_touches(&self) -> usize {
        self.options.min_touches
    }

    /// Maximum number of touches.
    #[must_use]
    pub const fn max_touches(&self) -> usize {
        self.options.max_touches
    }

    /// Set the minimum touch count; raises the maximum if needed.
    pub fn set_min_touches(&mut self, min: usize) {
        self.options.min_touches = min.max(1);
        if self.options.min_touches > self.options.max_touches {
            self.options.max_touches = self.options.min_touches;
        }
    }

    /// Set the maximum touch count; lowers the minimum if needed.
    pub fn set_max_touches(&mut self, max: usize) {
        self.options.max_touches = max.max(1);
        if self.options.max_touches < self.options.min_touches {
            self.options.min_touches = self.options.max_touches;
        }
    }

    /// Whether tracked touches are dropped when the gesture ends or fails.
    pub fn set_clear_tracked_touches_on_end_or_fail(&mut self, clear: bool) {
        self.options.clear_tracked_touches_on_end_or_fail = clear;
    }

    /// Whether ending performs a full reset.
    pub fn set_reset_on_end(&mut self, reset: bool) {
        self.options.reset_on_end = reset;
    }

    /// Whether recognizers on different views may run together regardless of
    /// simultaneous-execution rules.
    pub fn set_allow_simultaneous_if_views_differ(&mut self, allow: bool) {
        self.options.allow_simultaneous_if_views_differ = allow;
    }

    /// Platform view this recognizer belongs to.
    #[must_use]
    pub const fn view(&self) -> Option<ViewId> {
        self.view
    }

    /// Attach to a platform view.
    pub fn set_view(&mut self, view: Option<ViewId>) {
        self.view = view;
    }

    /// Set the view scale applied before unit conversion.
    pub fn set_view_scale(&mut self, scale: f32) {
        self.options.view_scale = scale;
    }

    // === Published values ===

    /// Tracked touches, sorted by id.
    #[must_use]
    pub fn tracked_touches(&self) -> &[TouchPoint] {
        &self.touches
    }

    /// Whether `id` is tracked.
    #[must_use]
    pub fn is_tracking(&self, id: TouchId) -> bool {
        self.touches.iter().any(|t| t.id() == id)
    }

    /// Mean position of the tracked touches.
    #[must_use]
    pub const fn focus(&self) -> Point {
        self.focus
    }

    /// Focus recorded at the start of the attempt.
    #[must_use]
    pub const fn start_focus(&self) -> Option<Point> {
        self.start_focus
    }

    /// Focus movement since the previous computation.
    #[must_use]
    pub const fn delta(&self) -> Point {
        self.delta
    }

    /// Horizontal focus movement since the previous computation.
    #[must_use]
    pub const fn delta_x(&self) -> f32 {
        self.delta.x
    }

    /// Vertical focus movement since the previous computation.
    #[must_use]
    pub const fn delta_y(&self) -> f32 {
        self.delta.y
    }

    /// Focus movement since the start of the attempt, in pixels.
    #[must_use]
    pub const fn distance(&self) -> Point {
        self.distance
    }

    /// Horizontal distance from the start focus, in pixels.
    #[must_use]
    pub const fn distance_x(&self) -> f32 {
        self.distance.x
    }

    /// Vertical distance from the start focus, in pixels.
    #[must_use]
    pub const fn distance_y(&self) -> f32 {
        self.distance.y
    }

    /// Mean pressure of the tracked touches.
    #[must_use]
    pub const fn pressure(&self) -> f32 {
        self.pressure
    }

    /// Focus velocity in pixels per second.
    #[must_use]
    pub const fn velocity(&self) -> Point {
        self.velocity.velocity()
    }

    /// Horizontal focus velocity.
    #[must_use]
    pub const fn velocity_x(&self) -> f32 {
        self.velocity.velocity_x()
    }

    /// Vertical focus velocity.
    #[must_use]
    pub const fn velocity_y(&self) -> f32 {
        self.velocity.velocity_y()
    }

    /// Focus speed in pixels per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.speed()
    }

    /// True while executing if the touch count changed since the previous
    /// executing update.
    #[must_use]
    pub const fn received_additional_touches(&self) -> bool {
        self.received_additional_touches
    }

    /// Whether a restart is pending.
    #[must_use]
    pub const fn is_restarting(&self) -> bool {
        self.restarting
    }

    // === Unit conversion ===

    /// Convert a pixel length to units, applying the view scale.
    #[must_use]
    pub fn to_units(&self, device: &DeviceInfo, pixels: f32) -> f32 {
        device.pixels_to_units(pixels.abs() * self.options.view_scale)
    }

    /// Length of `(dx, dy)` in units.
    #[must_use]
    pub fn distance_units(&self, device: &DeviceInfo, dx: f32, dy: f32) -> f32 {
        self.to_units(device, dx.hypot(dy))
    }

    /// Distance between two pixel positions, in units.
    #[must_use]
    pub fn distance_between_units(&self, device: &DeviceInfo, a: Point, b: Point) -> f32 {
        self.to_units(device, a.distance(&b))
    }

    // === Tracking ===

    pub(crate) fn touch_count_in_range(&self) -> bool {
        (self.options.min_touches..=self.options.max_touches).contains(&self.touches.len())
    }

    pub(crate) fn track_touches(&mut self, incoming: &[TouchPoint]) -> usize {
        let mut added = 0;
        for touch in incoming {
            let room =
                self.state == GestureState::Possible || self.touches.len() < self.options.max_touches;
            if room && !self.is_tracking(touch.id()) {
                self.touches.push(touch.clone());
                added += 1;
            }
        }
        if self.touches.len() > 1 {
            self.touches.sort();
        }
        added
    }

    pub(crate) fn update_tracked_touches(&mut self, incoming: &[TouchPoint]) {
        for touch in incoming {
            if let Some(slot) = self.touches.iter_mut().find(|t| t.id() == touch.id()) {
                *slot = touch.clone();
            }
        }
    }

    pub(crate) fn stop_tracking_touches(&mut self, outgoing: &[TouchPoint]) -> usize {
        let before = self.touches.len();
        self.touches
            .retain(|t| !outgoing.iter().any(|o| o.id() == t.id()));
        before - self.touches.len()
    }

    pub(crate) fn clear_tracked_touches(&mut self) {
        self.touches.clear();
    }

    pub(crate) fn intersects(&self, incoming: &[TouchPoint]) -> bool {
        incoming.iter().any(|t| self.is_tracking(t.id()))
    }

    pub(crate) fn ignore_touch(&mut self, id: TouchId) -> bool {
        self.ignored.insert(id)
    }

    pub(crate) fn release_ignored(&mut self, touches: &[TouchPoint]) {
        for touch in touches {
            self.ignored.remove(&touch.id());
        }
    }

    pub(crate) fn track_start_locations(&mut self) {
        self.start_locations = self.touches.iter().map(TouchPoint::position).collect();
    }

    pub(crate) fn clear_start_locations(&mut self) {
        self.start_locations.clear();
    }

    pub(crate) fn tracked_touches_within(&self, device: &DeviceInfo, threshold_units: f32) -> bool {
        if self.touches.is_empty() || self.start_locations.is_empty() {
            return false;
        }
        self.touches.iter().all(|touch| {
            self.start_locations.iter().any(|start| {
                self.distance_between_units(device, touch.position(), *start) <= threshold_units
            })
        })
    }

    /// Recompute focus, pressure, delta, distance and velocity from the tracked
    /// touches. Returns true when this is the first computation of the attempt.
    pub(crate) fn calculate_focus(&mut self, now: Duration, reset: bool) -> bool {
        if self.touches.is_empty() {
            return false;
        }
        let count = self.touches.len() as f32;
        let (sum, pressure) = self
            .touches
            .iter()
            .fold((Point::ORIGIN, 0.0), |(sum, pressure), t| {
                (sum + t.position(), pressure + t.pressure())
            });
        self.focus = sum.scale(1.0 / count);
        self.pressure = pressure / count;

        let first = reset || self.start_focus.is_none();
        if first {
            self.start_focus = Some(self.focus);
            self.delta = Point::ORIGIN;
            self.velocity.restart(now);
        } else if let Some(previous) = self.previous_focus {
            self.delta = self.focus - previous;
        }
        self.velocity.update(self.focus, now);
        self.distance = self.focus - self.start_focus.unwrap_or(self.focus);
        self.previous_focus = Some(self.focus);
        first
    }

    pub(crate) fn reset_accumulators(&mut self) {
        self.start_locations.clear();
        self.start_focus = None;
        self.previous_focus = None;
        self.focus = Point::ORIGIN;
        self.delta = Point::ORIGIN;
        self.distance = Point::ORIGIN;
        self.pressure = 0.0;
        self.velocity.reset();
    }

    pub(crate) fn update_touch_state(&mut self, executing: bool) {
        if executing && self.last_tracked_count != self.touches.len() {
            self.received_additional_touches = true;
            self.last_tracked_count = self.touches.len();
        } else {
            self.received_additional_touches = false;
        }
    }

    pub(crate) fn forget_touch_count(&mut self) {
        self.last_tracked_count = 0;
        self.received_additional_touches = false;
    }

    /// Whether a dependent waiting on this recognizer to fail must keep waiting.
    pub(crate) fn blocks_dependent_end(&self) -> bool {
        self.state.is_trackable()
            && (!self.touches.is_empty() || self.just_ended)
            && !self.just_failed
    }
}

// =============================================================================
// Hooks
// =============================================================================

/// View of a recognizer handed to [`GestureHooks`] callbacks.
///
/// Transitions and timers requested here are applied by the arena in request
/// order after the hook returns.
#[derive(Debug)]
pub struct HookContext<'a> {
    core: &'a mut RecognizerCore,
    now: Duration,
    device: DeviceInfo,
    requests: Vec<Transition>,
    timers: Vec<(Duration, GestureTimer)>,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(core: &'a mut RecognizerCore, now: Duration, device: DeviceInfo) -> Self {
        Self {
            core,
            now,
            device,
            requests: Vec::new(),
            timers: Vec::new(),
        }
    }

    pub(crate) fn into_effects(self) -> (Vec<Transition>, Vec<(Duration, GestureTimer)>) {
        (self.requests, self.timers)
    }

    /// Current logical time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Read-only access to the core.
    #[must_use]
    pub fn core(&self) -> &RecognizerCore {
        &*self.core
    }

    /// State before any transition requested by this hook.
    #[must_use]
    pub fn state(&self) -> GestureState {
        self.core.state
    }

    /// Tracked touches, sorted by id.
    #[must_use]
    pub fn touches(&self) -> &[TouchPoint] {
        &self.core.touches
    }

    /// Whether the tracked touch count is within [min, max].
    #[must_use]
    pub fn touch_count_in_range(&self) -> bool {
        self.core.touch_count_in_range()
    }

    /// Recompute focus; true on the first computation of the attempt.
    pub fn calculate_focus(&mut self) -> bool {
        self.core.calculate_focus(self.now, false)
    }

    /// Recompute focus and re-anchor the start focus at the result.
    pub fn recalculate_focus_from_here(&mut self) -> bool {
        self.core.calculate_focus(self.now, true)
    }

    /// Add `id` to the ignore set; false if it was already there.
    pub fn ignore_touch(&mut self, id: TouchId) -> bool {
        self.core.ignore_touch(id)
    }

    /// Remember where the tracked touches are now.
    pub fn track_start_locations(&mut self) {
        self.core.track_start_locations();
    }

    /// Whether every tracked touch is within `threshold_units` of a remembered
    /// start location.
    #[must_use]
    pub fn tracked_touches_within(&self, threshold_units: f32) -> bool {
        self.core.tracked_touches_within(&self.device, threshold_units)
    }

    /// Length of `(dx, dy)` pixels in units.
    #[must_use]
    pub fn distance(&self, dx: f32, dy: f32) -> f32 {
        self.core.distance_units(&self.device, dx, dy)
    }

    /// Absolute pixel length in units.
    #[must_use]
    pub fn length(&self, pixels: f32) -> f32 {
        self.core.to_units(&self.device, pixels)
    }

    /// Distance between two pixel positions in units.
    #[must_use]
    pub fn distance_between(&self, a: Point, b: Point) -> f32 {
        self.core.distance_between_units(&self.device, a, b)
    }

    /// Units to pixels.
    #[must_use]
    pub fn units_to_pixels(&self, units: f32) -> f32 {
        self.device.units_to_pixels(units)
    }

    /// Request a state change.
    pub fn request(&mut self, transition: impl Into<Transition>) {
        self.requests.push(transition.into());
    }

    /// Whether this hook already requested `state`.
    #[must_use]
    pub fn has_requested(&self, state: GestureState) -> bool {
        self.requests.iter().any(|t| t.target == state)
    }

    /// Ask for `timer` to fire after `delay`.
    pub fn run_after(&mut self, delay: Duration, timer: GestureTimer) {
        self.timers.push((delay, timer));
    }
}

/// Kind-specific reactions to deliveries.
pub trait GestureHooks {
    /// New touches were added to the tracked set.
    fn touches_began(&mut self, cx: &mut HookContext<'_>, touches: &[TouchPoint]);

    /// Tracked touches moved.
    fn touches_moved(&mut self, cx: &mut HookContext<'_>);

    /// Tracked touches lifted; they are still tracked during the call.
    fn touches_ended(&mut self, cx: &mut HookContext<'_>);

    /// A timer requested through [`HookContext::run_after`] fired.
    fn timer_fired(&mut self, _cx: &mut HookContext<'_>, _timer: GestureTimer) {}

    /// Runs after every committed transition, after the listener.
    fn state_changed(&mut self, _state: GestureState) {}

    /// Explicit reset of kind-specific state.
    fn reset(&mut self) {}
}

// =============================================================================
// GestureKind
// =============================================================================

/// The concrete gesture a recognizer looks for.
#[derive(Debug, Clone)]
pub enum GestureKind {
    /// Single or multi tap.
    Tap(TapGesture),
    /// Press and hold.
    LongPress(LongPressGesture),
    /// Drag.
    Pan(PanGesture),
    /// Two-finger pinch.
    Scale(ScaleGesture),
    /// One-finger vertical drag zoom.
    OneTouchScale(OneTouchScaleGesture),
    /// Two-finger twist.
    Rotate(RotateGesture),
    /// One-finger rotation around an anchor.
    OneTouchRotate(OneTouchRotateGesture),
    /// Fast directional flick.
    Swipe(SwipeGesture),
}

macro_rules! dispatch_kind {
    ($kind:expr, $g:ident => $body:expr) => {
        match $kind {
            GestureKind::Tap($g) => $body,
            GestureKind::LongPress($g) => $body,
            GestureKind::Pan($g) => $body,
            GestureKind::Scale($g) => $body,
            GestureKind::OneTouchScale($g) => $body,
            GestureKind::Rotate($g) => $body,
            GestureKind::OneTouchRotate($g) => $body,
            GestureKind::Swipe($g) => $body,
        }
    };
}

macro_rules! kind_accessors {
    ($($variant:ident, $ty:ty, $as_ref:ident, $as_mut:ident;)*) => {
        impl GestureKind {
            $(
                #[doc = concat!("The `", stringify!($variant), "` state, if this is one.")]
                #[must_use]
                pub const fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(g) => Some(g),
                        _ => None,
                    }
                }

                #[doc = concat!("Mutable `", stringify!($variant), "` state, if this is one.")]
                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Self::$variant(g) => Some(g),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<$ty> for GestureKind {
                fn from(gesture: $ty) -> Self {
                    Self::$variant(gesture)
                }
            }
        )*
    };
}

kind_accessors! {
    Tap, TapGesture, as_tap, as_tap_mut;
    LongPress, LongPressGesture, as_long_press, as_long_press_mut;
    Pan, PanGesture, as_pan, as_pan_mut;
    Scale, ScaleGesture, as_scale, as_scale_mut;
    OneTouchScale, OneTouchScaleGesture, as_one_touch_scale, as_one_touch_scale_mut;
    Rotate, RotateGesture, as_rotate, as_rotate_mut;
    OneTouchRotate, OneTouchRotateGesture, as_one_touch_rotate, as_one_touch_rotate_mut;
    Swipe, SwipeGesture, as_swipe, as_swipe_mut;
}

impl GestureKind {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tap(_) => "tap",
            Self::LongPress(_) => "long_press",
            Self::Pan(_) => "pan",
            Self::Scale(_) => "scale",
            Self::OneTouchScale(_) => "one_touch_scale",
            Self::Rotate(_) => "rotate",
            Self::OneTouchRotate(_) => "one_touch_rotate",
            Self::Swipe(_) => "swipe",
        }
    }

    /// Options a freshly created recognizer of this kind starts with.
    #[must_use]
    pub fn default_options(&self) -> RecognizerOptions {
        match self {
            Self::LongPress(_) => RecognizerOptions {
                clear_tracked_touches_on_end_or_fail: true,
                ..RecognizerOptions::default()
            },
            Self::Scale(_) => RecognizerOptions::with_touches(2, 2),
            Self::Rotate(_) => RecognizerOptions::with_touches(1, 2),
            _ => RecognizerOptions::default(),
        }
    }
}

impl GestureHooks for GestureKind {
    fn touches_began(&mut self, cx: &mut HookContext<'_>, touches: &[TouchPoint]) {
        dispatch_kind!(self, g => g.touches_began(cx, touches));
    }

    fn touches_moved(&mut self, cx: &mut HookContext<'_>) {
        dispatch_kind!(self, g => g.touches_moved(cx));
    }

    fn touches_ended(&mut self, cx: &mut HookContext<'_>) {
        dispatch_kind!(self, g => g.touches_ended(cx));
    }

    fn timer_fired(&mut self, cx: &mut HookContext<'_>, timer: GestureTimer) {
        dispatch_kind!(self, g => g.timer_fired(cx, timer));
    }

    fn state_changed(&mut self, state: GestureState) {
        dispatch_kind!(self, g => g.state_changed(state));
    }

    fn reset(&mut self) {
        dispatch_kind!(self, g => g.reset());
    }
}

// =============================================================================
// GestureRecognizer
// =============================================================================

/// A gesture interpretation competing for touches inside an arena.
pub struct GestureRecognizer {
    pub(crate) core: RecognizerCore,
    pub(crate) kind: GestureKind,
    listener: Option<StateListener>,
}

impl GestureRecognizer {
    /// Create a recognizer with the kind's default options.
    #[must_use]
    pub fn new(kind: impl Into<GestureKind>) -> Self {
        let kind = kind.into();
        Self {
            core: RecognizerCore::new(kind.default_options()),
            kind,
            listener: None,
        }
    }

    /// Tap recognizer with default configuration.
    #[must_use]
    pub fn tap() -> Self {
        Self::new(TapGesture::default())
    }

    /// Long-press recognizer with default configuration.
    #[must_use]
    pub fn long_press() -> Self {
        Self::new(LongPressGesture::default())
    }

    /// Pan recognizer with default configuration.
    #[must_use]
    pub fn pan() -> Self {
        Self::new(PanGesture::default())
    }

    /// Two-finger scale recognizer with default configuration.
    #[must_use]
    pub fn scale() -> Self {
        Self::new(ScaleGesture::default())
    }

    /// One-finger scale recognizer with default configuration.
    #[must_use]
    pub fn one_touch_scale() -> Self {
        Self::new(OneTouchScaleGesture::default())
    }

    /// Two-finger rotate recognizer with default configuration.
    #[must_use]
    pub fn rotate() -> Self {
        Self::new(RotateGesture::default())
    }

    /// One-finger rotate recognizer with default configuration.
    #[must_use]
    pub fn one_touch_rotate() -> Self {
        Self::new(OneTouchRotateGesture::default())
    }

    /// Swipe recognizer with default configuration.
    #[must_use]
    pub fn swipe() -> Self {
        Self::new(SwipeGesture::default())
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: RecognizerOptions) -> Self {
        self.core.set_options(options);
        self
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.core.set_label(label);
        self
    }

    /// Attach to a platform view.
    #[must_use]
    pub fn with_view(mut self, view: ViewId) -> Self {
        self.core.set_view(Some(view));
        self
    }

    /// Install the state-changed listener.
    #[must_use]
    pub fn on_state_changed(mut self, listener: impl FnMut(&Self) + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Replace the state-changed listener.
    pub fn set_listener(&mut self, listener: Option<StateListener>) {
        self.listener = listener;
    }

    /// Handle assigned by the arena.
    #[must_use]
    pub const fn id(&self) -> Option<GestureId> {
        self.core.id()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.core.state
    }

    /// Shared engine state.
    #[must_use]
    pub const fn core(&self) -> &RecognizerCore {
        &self.core
    }

    /// Mutable engine state, for configuration.
    pub fn core_mut(&mut self) -> &mut RecognizerCore {
        &mut self.core
    }

    /// Kind-specific state.
    #[must_use]
    pub const fn kind(&self) -> &GestureKind {
        &self.kind
    }

    /// Mutable kind-specific state, for configuration.
    pub fn kind_mut(&mut self) -> &mut GestureKind {
        &mut self.kind
    }

    pub(crate) fn fire_state_changed(&mut self) {
        tracing::debug!(
            gesture = ?self.core.id(),
            kind = self.kind.name(),
            label = self.core.label(),
            state = ?self.core.state,
            touches = self.core.touches.len(),
            "gesture state changed"
        );
        if let Some(mut listener) = self.listener.take() {
            listener(&*self);
            if self.listener.is_none() {
                self.listener = Some(listener);
            }
        }
        self.kind.state_changed(self.core.state);
    }
}

impl fmt::Debug for GestureRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureRecognizer")
            .field("core", &self.core)
            .field("kind", &self.kind)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
