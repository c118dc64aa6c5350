//! Touch values delivered to recognizers.

use crate::error::GestureError;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Touch identifier, stable for the lifetime of one contact.
///
/// Negative ids are free for virtual touches synthesized by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TouchId(pub i32);

impl fmt::Display for TouchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "touch#{}", self.0)
    }
}

/// Lifecycle phase of a touch within one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TouchPhase {
    /// Phase not reported by the platform.
    #[default]
    Unknown,
    /// Contact started this frame.
    Began,
    /// Contact is down but did not move.
    Stationary,
    /// Contact moved.
    Moved,
    /// Contact lifted.
    Ended,
    /// Contact was taken away by the platform.
    Cancelled,
}

/// Opaque platform data carried alongside a touch.
pub type TouchPayload = Arc<dyn Any + Send + Sync>;

/// One sample of a touch contact.
///
/// Values are immutable; the host produces a fresh value for the same id every
/// frame. Equality, ordering and hashing only consider the id, so a tracked set
/// holds at most one sample per contact.
#[derive(Clone)]
pub struct TouchPoint {
    id: TouchId,
    position: Point,
    previous: Point,
    pressure: f32,
    phase: TouchPhase,
    payload: Option<TouchPayload>,
}

impl TouchPoint {
    /// Create a touch at `(x, y)` in the [`TouchPhase::Began`] phase.
    ///
    /// The previous position starts equal to the current one.
    #[must_use]
    pub fn new(id: TouchId, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Point::new(x, y),
            previous: Point::new(x, y),
            pressure: 0.0,
            phase: TouchPhase::Began,
            payload: None,
        }
    }

    /// Set the previous position.
    #[must_use]
    pub const fn with_previous(mut self, x: f32, y: f32) -> Self {
        self.previous = Point::new(x, y);
        self
    }

    /// Set the pressure (0..1, 0 when unknown).
    #[must_use]
    pub const fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    /// Set the phase.
    #[must_use]
    pub const fn with_phase(mut self, phase: TouchPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Attach platform data.
    #[must_use]
    pub fn with_payload(mut self, payload: TouchPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Next sample of this contact at `(x, y)`, phase [`TouchPhase::Moved`].
    #[must_use]
    pub fn moved_to(&self, x: f32, y: f32) -> Self {
        Self {
            position: Point::new(x, y),
            previous: self.position,
            phase: TouchPhase::Moved,
            ..self.clone()
        }
    }

    /// Next sample of this contact without movement, in `phase`.
    #[must_use]
    pub fn in_place(&self, phase: TouchPhase) -> Self {
        Self {
            previous: self.position,
            phase,
            ..self.clone()
        }
    }

    /// Touch id.
    #[must_use]
    pub const fn id(&self) -> TouchId {
        self.id
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Current x in pixels.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.position.x
    }

    /// Current y in pixels.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.position.y
    }

    /// Position in the previous frame.
    #[must_use]
    pub const fn previous(&self) -> Point {
        self.previous
    }

    /// Horizontal movement since the previous frame.
    #[must_use]
    pub fn delta_x(&self) -> f32 {
        self.position.x - self.previous.x
    }

    /// Vertical movement since the previous frame.
    #[must_use]
    pub fn delta_y(&self) -> f32 {
        self.position.y - self.previous.y
    }

    /// Pressure.
    #[must_use]
    pub const fn pressure(&self) -> f32 {
        self.pressure
    }

    /// Phase.
    #[must_use]
    pub const fn phase(&self) -> TouchPhase {
        self.phase
    }

    /// Platform data, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&TouchPayload> {
        self.payload.as_ref()
    }
}

impl fmt::Debug for TouchPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchPoint")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("previous", &self.previous)
            .field("pressure", &self.pressure)
            .field("phase", &self.phase)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

impl PartialEq for TouchPoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TouchPoint {}

impl PartialOrd for TouchPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TouchPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TouchPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Reject a delivery that names the same contact twice.
pub fn ensure_unique_ids(touches: &[TouchPoint]) -> Result<(), GestureError> {
    let mut seen = HashSet::with_capacity(touches.len());
    for touch in touches {
        if !seen.insert(touch.id) {
            return Err(GestureError::DuplicateTouch { id: touch.id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_point_new() {
        let touch = TouchPoint::new(TouchId(1), 100.0, 200.0);
        assert_eq!(touch.id(), TouchId(1));
        assert_eq!(touch.position(), Point::new(100.0, 200.0));
        assert_eq!(touch.previous(), touch.position());
        assert_eq!(touch.phase(), TouchPhase::Began);
        assert_eq!(touch.pressure(), 0.0);
        assert!(touch.payload().is_none());
    }

    #[test]
    fn test_touch_point_moved_to_tracks_previous() {
        let touch = TouchPoint::new(TouchId(1), 10.0, 20.0).with_pressure(0.5);
        let moved = touch.moved_to(15.0, 25.0);
        assert_eq!(moved.previous(), Point::new(10.0, 20.0));
        assert_eq!(moved.delta_x(), 5.0);
        assert_eq!(moved.delta_y(), 5.0);
        assert_eq!(moved.phase(), TouchPhase::Moved);
        assert_eq!(moved.pressure(), 0.5);
    }

    #[test]
    fn test_touch_point_in_place() {
        let touch = TouchPoint::new(TouchId(2), 1.0, 1.0).moved_to(4.0, 5.0);
        let ended = touch.in_place(TouchPhase::Ended);
        assert_eq!(ended.position(), Point::new(4.0, 5.0));
        assert_eq!(ended.delta_x(), 0.0);
        assert_eq!(ended.phase(), TouchPhase::Ended);
    }

    #[test]
    fn test_touch_point_identity_is_id_only() {
        let a = TouchPoint::new(TouchId(7), 0.0, 0.0);
        let b = TouchPoint::new(TouchId(7), 50.0, 50.0).with_pressure(1.0);
        let c = TouchPoint::new(TouchId(-1), 0.0, 0.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(c < a);

        let set: HashSet<TouchPoint> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_touch_point_payload() {
        let touch = TouchPoint::new(TouchId(0), 0.0, 0.0).with_payload(Arc::new(42_u32));
        let payload = touch.payload().expect("payload attached");
        assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
        assert!(format!("{touch:?}").contains("payload: true"));
    }

    #[test]
    fn test_ensure_unique_ids() {
        let a = TouchPoint::new(TouchId(1), 0.0, 0.0);
        let b = TouchPoint::new(TouchId(2), 0.0, 0.0);
        assert!(ensure_unique_ids(&[a.clone(), b]).is_ok());

        let err = ensure_unique_ids(&[a.clone(), a]).unwrap_err();
        assert!(matches!(err, GestureError::DuplicateTouch { id } if id == TouchId(1)));
    }

    #[test]
    fn test_touch_id_display() {
        assert_eq!(TouchId(-3).to_string(), "touch#-3");
    }
}
