//! Weighted velocity estimation over recent focus movement.

use crate::geometry::Point;
use crate::time::seconds_between;
use std::collections::VecDeque;
use std::time::Duration;

/// Number of samples kept for the weighted average.
pub const VELOCITY_HISTORY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    velocity: Point,
    seconds: f32,
}

/// Estimates velocity (pixels per second) from successive positions.
///
/// Each update after the first contributes `displacement / elapsed`; the
/// published velocity is the average of the last [`VELOCITY_HISTORY`] samples
/// weighted by their elapsed time.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    history: VecDeque<Sample>,
    previous: Option<Point>,
    sample_started: Option<Duration>,
    velocity: Point,
}

impl VelocityTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear history and velocity and stop the sample timer.
    ///
    /// The next update reseeds the baseline instead of producing a sample.
    pub fn reset(&mut self) {
        self.history.clear();
        self.velocity = Point::ORIGIN;
        self.sample_started = None;
    }

    /// Reset and forget the baseline; the next update only seeds it.
    pub fn restart(&mut self, now: Duration) {
        self.previous = None;
        self.reset();
        self.sample_started = Some(now);
    }

    /// Reset and seed the baseline with `position`.
    pub fn restart_at(&mut self, position: Point, now: Duration) {
        self.previous = Some(position);
        self.reset();
        self.sample_started = Some(now);
    }

    /// Feed the latest position.
    ///
    /// An update with no logical time elapsed since the last sample keeps the
    /// old baseline so its displacement is folded into the next sample.
    pub fn update(&mut self, position: Point, now: Duration) {
        let Some(started) = self.sample_started else {
            self.previous = Some(position);
            self.sample_started = Some(now);
            return;
        };
        if let Some(previous) = self.previous {
            let seconds = seconds_between(started, now);
            if seconds <= 0.0 {
                return;
            }
            let displacement = position - previous;
            self.push(
                Point::new(displacement.x / seconds, displacement.y / seconds),
                seconds,
                now,
            );
        }
        self.previous = Some(position);
    }

    fn push(&mut self, velocity: Point, seconds: f32, now: Duration) {
        if self.history.len() == VELOCITY_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(Sample { velocity, seconds });
        self.sample_started = Some(now);

        let total: f32 = self.history.iter().map(|s| s.seconds).sum();
        self.velocity = self
            .history
            .iter()
            .fold(Point::ORIGIN, |acc, s| acc + s.velocity.scale(s.seconds / total));
    }

    /// Weighted velocity in pixels per second.
    #[must_use]
    pub const fn velocity(&self) -> Point {
        self.velocity
    }

    /// Horizontal velocity in pixels per second.
    #[must_use]
    pub const fn velocity_x(&self) -> f32 {
        self.velocity.x
    }

    /// Vertical velocity in pixels per second.
    #[must_use]
    pub const fn velocity_y(&self) -> f32 {
        self.velocity.y
    }

    /// Magnitude of the velocity.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Number of samples currently weighted.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.history.len()
    }
}
