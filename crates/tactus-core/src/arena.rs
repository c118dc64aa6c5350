//! Recognizer ownership, touch delivery and arbitration.
//!
//! The [`GestureArena`] owns every recognizer behind a generational
//! [`GestureId`] handle, together with the relationship graph, the registry of
//! active recognizers and the timer queue. All state transitions go through
//! the arena so that arbitration and fail-dependency resolution see a
//! consistent picture.
//!
//! While a recognizer is being processed it is checked out of its slot. A
//! cascade that reaches a checked-out recognizer (a relationship cycle) skips
//! it with a warning.

use crate::config::ArenaConfig;
use crate::device::DeviceInfo;
use crate::error::{GestureError, Result};
use crate::recognizer::{
    GestureHooks, GestureRecognizer, GestureState, GestureTimer, HookContext, Transition,
};
use crate::relations::{Peer, RelationGraph};
use crate::schedule::{ScheduledTask, Scheduler, TimerQueue};
use crate::time::{Clock, SystemClock};
use crate::touch::{ensure_unique_ids, TouchId, TouchPhase, TouchPoint};
use std::collections::BTreeMap;
use std::fmt;
use std::slice;
use std::time::Duration;

/// Handle to a recognizer owned by a [`GestureArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GestureId {
    index: u32,
    generation: u32,
}

impl GestureId {
    /// Build a handle from its parts.
    #[must_use]
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation; bumped every time the slot is disposed.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gesture#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    live: bool,
    recognizer: Option<GestureRecognizer>,
}

#[derive(Debug, Clone, Copy)]
enum Hook<'t> {
    Began(&'t [TouchPoint]),
    Moved,
    Ended,
    Timer(GestureTimer),
}

/// Owner of recognizers and their shared arbitration state.
///
/// The arena is single-threaded: listeners are not `Send`, so neither is the
/// arena.
#[derive(Debug)]
pub struct GestureArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<GestureId>,
    relations: RelationGraph,
    active: BTreeMap<GestureId, u64>,
    epoch: u64,
    config: ArenaConfig,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn Scheduler>,
}

impl Default for GestureArena {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureArena {
    /// Create an arena with the default configuration, the system clock and a
    /// [`TimerQueue`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an arena with a custom configuration.
    #[must_use]
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            relations: RelationGraph::new(),
            active: BTreeMap::new(),
            epoch: 0,
            config,
            clock: Box::new(SystemClock::new()),
            scheduler: Box::new(TimerQueue::new()),
        }
    }

    /// Use `clock` as the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use `scheduler` for delayed work.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    /// Arena configuration.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Pixel to unit conversion used by every recognizer.
    #[must_use]
    pub const fn device_info(&self) -> DeviceInfo {
        self.config.device
    }

    /// Replace the pixel to unit conversion, e.g. after a display change.
    pub fn set_device_info(&mut self, device: DeviceInfo) {
        self.config.device = device;
    }

    /// Current logical time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Register a recognizer; it receives deliveries after those already
    /// registered.
    pub fn add(&mut self, mut recognizer: GestureRecognizer) -> GestureId {
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            GestureId::from_raw_parts(index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                live: true,
                recognizer: None,
            });
            GestureId::from_raw_parts((self.slots.len() - 1) as u32, 0)
        };
        recognizer.core.set_id(id);
        tracing::debug!(gesture = %id, kind = recognizer.kind.name(), "gesture added");
        self.slots[id.index as usize].recognizer = Some(recognizer);
        self.order.push(id);
        id
    }

    /// Remove a recognizer together with all of its relations and its active
    /// registry membership.
    ///
    /// Dependents parked in [`GestureState::EndPending`] on it are not
    /// released; they stay parked until their next touch release or reset.
    pub fn dispose(&mut self, id: GestureId) -> Result<GestureRecognizer> {
        let recognizer = self.check_out(id)?;
        let slot = &mut self.slots[id.index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|&g| g != id);
        self.relations.remove(id);
        self.active.remove(&id);
        tracing::debug!(gesture = %id, "gesture disposed");
        Ok(recognizer)
    }

    /// Look up a recognizer.
    #[must_use]
    pub fn get(&self, id: GestureId) -> Option<&GestureRecognizer> {
        self.slot(id).and_then(|slot| slot.recognizer.as_ref())
    }

    /// Look up a recognizer mutably, e.g. to change its configuration.
    pub fn get_mut(&mut self, id: GestureId) -> Option<&mut GestureRecognizer> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .and_then(|slot| slot.recognizer.as_mut())
    }

    /// State of a recognizer.
    #[must_use]
    pub fn state(&self, id: GestureId) -> Option<GestureState> {
        self.get(id).map(GestureRecognizer::state)
    }

    /// Registered recognizers in delivery order.
    #[must_use]
    pub fn ids(&self) -> &[GestureId] {
        &self.order
    }

    /// Number of registered recognizers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no recognizer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Relationship graph.
    #[must_use]
    pub const fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    /// Let `a` and `b` be active at the same time.
    pub fn allow_simultaneous(&mut self, a: GestureId, b: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.ensure_known(b)?;
        self.relations.allow_simultaneous(a, Peer::Gesture(b));
        Ok(())
    }

    /// Let `a` be active alongside any recognizer.
    pub fn allow_simultaneous_with_all(&mut self, a: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.relations.allow_simultaneous(a, Peer::All);
        Ok(())
    }

    /// Undo [`allow_simultaneous`](Self::allow_simultaneous).
    pub fn disallow_simultaneous(&mut self, a: GestureId, b: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.relations.disallow_simultaneous(a, Peer::Gesture(b));
        Ok(())
    }

    /// Undo [`allow_simultaneous_with_all`](Self::allow_simultaneous_with_all).
    pub fn disallow_simultaneous_with_all(&mut self, a: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.relations.disallow_simultaneous(a, Peer::All);
        Ok(())
    }

    /// Make `a` wait for `b` to fail before it may end.
    pub fn require_failure_of(&mut self, a: GestureId, b: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.ensure_known(b)?;
        self.relations.require_failure(a, b);
        Ok(())
    }

    /// Undo [`require_failure_of`](Self::require_failure_of).
    pub fn remove_required_failure(&mut self, a: GestureId, b: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.relations.remove_required_failure(a, b);
        Ok(())
    }

    /// Drop every fail requirement of `a`.
    pub fn clear_required_failures(&mut self, a: GestureId) -> Result<()> {
        self.ensure_known(a)?;
        self.relations.clear_required_failures(a);
        Ok(())
    }

    // =========================================================================
    // Active registry
    // =========================================================================

    /// Number of recognizers in the active registry.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether `id` is in the active registry.
    #[must_use]
    pub fn is_active(&self, id: GestureId) -> bool {
        self.active.contains_key(&id)
    }

    /// Recognizers in the active registry, in handle order.
    pub fn active_gestures(&self) -> impl Iterator<Item = GestureId> + '_ {
        self.active.keys().copied()
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Enable or disable a recognizer; either way it is reset.
    pub fn set_enabled(&mut self, id: GestureId, enabled: bool) -> Result<()> {
        self.with_recognizer(id, |arena, rec| {
            rec.core.enabled = enabled;
            arena.reset_recognizer(id, rec);
        })
    }

    /// Return a recognizer to `Possible`, dropping its tracked touches and
    /// kind-specific progress.
    pub fn reset(&mut self, id: GestureId) -> Result<()> {
        self.with_recognizer(id, |arena, rec| arena.reset_recognizer(id, rec))
    }

    /// Ask a recognizer that ended while keeping its touches to start over
    /// with them on their next move. Returns false when not applicable.
    pub fn begin_restart(&mut self, id: GestureId) -> Result<bool> {
        let rec = self
            .get_mut(id)
            .ok_or(GestureError::UnknownGesture(id))?;
        let core = &mut rec.core;
        let allowed = core.state == GestureState::Ended
            || (core.state == GestureState::Possible
                && core.kept_touches_on_end
                && !core.tracked_touches().is_empty());
        if allowed {
            core.restarting = true;
        }
        Ok(allowed)
    }

    /// Request a state change as if a hook had asked for it. Returns whether
    /// the transition was committed.
    pub fn request_state(&mut self, id: GestureId, state: GestureState) -> Result<bool> {
        self.with_recognizer(id, |arena, rec| arena.transition(id, rec, state.into()))
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Deliver touches that started this frame.
    pub fn process_touches_began(&mut self, id: GestureId, touches: &[TouchPoint]) -> Result<()> {
        ensure_unique_ids(touches)?;
        self.with_recognizer(id, |arena, rec| arena.touches_began(id, rec, touches))
    }

    /// Deliver touches that moved or rested this frame.
    pub fn process_touches_moved(&mut self, id: GestureId, touches: &[TouchPoint]) -> Result<()> {
        ensure_unique_ids(touches)?;
        self.with_recognizer(id, |arena, rec| arena.touches_moved(id, rec, touches))
    }

    /// Deliver touches that lifted this frame.
    pub fn process_touches_ended(&mut self, id: GestureId, touches: &[TouchPoint]) -> Result<()> {
        ensure_unique_ids(touches)?;
        self.with_recognizer(id, |arena, rec| arena.touches_ended(id, rec, touches))
    }

    /// Deliver touches the platform cancelled this frame.
    pub fn process_touches_cancelled(
        &mut self,
        id: GestureId,
        touches: &[TouchPoint],
    ) -> Result<()> {
        ensure_unique_ids(touches)?;
        self.with_recognizer(id, |arena, rec| arena.touches_cancelled(id, rec, touches))
    }

    /// Deliver a whole frame to every recognizer.
    pub fn dispatch(&mut self, frame: &[TouchPoint]) -> Result<()> {
        self.dispatch_filtered(frame, |_, _| true)
    }

    /// Deliver a whole frame, letting `admit` decide which began touches each
    /// recognizer sees.
    ///
    /// Due timers run first. Touches are grouped by phase; each recognizer, in
    /// registration order, receives began, moved (including stationary), ended
    /// and cancelled touches in that order.
    pub fn dispatch_filtered(
        &mut self,
        frame: &[TouchPoint],
        mut admit: impl FnMut(&GestureRecognizer, &TouchPoint) -> bool,
    ) -> Result<()> {
        ensure_unique_ids(frame)?;
        self.poll_timers();

        let mut began = Vec::new();
        let mut moved = Vec::new();
        let mut ended = Vec::new();
        let mut cancelled = Vec::new();
        for touch in frame {
            match touch.phase() {
                TouchPhase::Began => began.push(touch.clone()),
                TouchPhase::Moved | TouchPhase::Stationary => moved.push(touch.clone()),
                TouchPhase::Ended => ended.push(touch.clone()),
                TouchPhase::Cancelled => cancelled.push(touch.clone()),
                TouchPhase::Unknown => {
                    tracing::trace!(touch = %touch.id(), "dropped touch with unknown phase");
                }
            }
        }

        let order = self.order.clone();
        for id in order {
            self.with_recognizer(id, |arena, rec| {
                let admitted: Vec<TouchPoint> = began
                    .iter()
                    .filter(|touch| admit(rec, touch))
                    .cloned()
                    .collect();
                arena.touches_began(id, rec, &admitted);
                arena.touches_moved(id, rec, &moved);
                arena.touches_ended(id, rec, &ended);
                arena.touches_cancelled(id, rec, &cancelled);
            })?;
        }
        Ok(())
    }

    /// Drive touch id 0 through a flat `[x0, y0, x1, y1, ...]` path: began at
    /// the first pair, moved through the middle pairs, ended at the last.
    ///
    /// Returns false for an odd or empty coordinate list.
    pub fn simulate(&mut self, id: GestureId, path: &[f32]) -> Result<bool> {
        if path.len() < 2 || path.len() % 2 != 0 {
            return Ok(false);
        }
        let points: Vec<(f32, f32)> = path.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        let Some((&(x0, y0), rest)) = points.split_first() else {
            return Ok(false);
        };

        let mut touch = TouchPoint::new(TouchId(0), x0, y0).with_pressure(1.0);
        self.process_touches_began(id, slice::from_ref(&touch))?;
        let last = match rest.split_last() {
            Some((&(x, y), middle)) => {
                for &(mx, my) in middle {
                    touch = touch.moved_to(mx, my);
                    self.process_touches_moved(id, slice::from_ref(&touch))?;
                }
                touch.moved_to(x, y).with_phase(TouchPhase::Ended)
            }
            None => touch.in_place(TouchPhase::Ended),
        };
        self.process_touches_ended(id, slice::from_ref(&last))?;
        Ok(true)
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Run every scheduled task that is due. Returns how many ran.
    pub fn poll_timers(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        loop {
            let due = self.scheduler.take_due(now);
            if due.is_empty() {
                break;
            }
            ran += due.len();
            for task in due {
                self.run_task(task);
            }
        }
        ran
    }

    /// Number of scheduled tasks not yet run.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    fn run_task(&mut self, task: ScheduledTask) {
        match task {
            ScheduledTask::ExpireActive { gesture, epoch } => {
                if self.active.get(&gesture) == Some(&epoch) {
                    self.active.remove(&gesture);
                    tracing::trace!(gesture = %gesture, "end grace period expired");
                }
            }
            ScheduledTask::Fire { gesture, timer } => {
                tracing::trace!(gesture = %gesture, ?timer, "gesture timer fired");
                let fired = self.with_recognizer(gesture, |arena, rec| {
                    arena.run_hook(gesture, rec, Hook::Timer(timer));
                });
                if let Err(err) = fired {
                    tracing::trace!(error = %err, "dropped timer");
                }
            }
        }
    }

    // =========================================================================
    // Slots
    // =========================================================================

    fn slot(&self, id: GestureId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
    }

    fn ensure_known(&self, id: GestureId) -> Result<()> {
        self.slot(id)
            .map(|_| ())
            .ok_or(GestureError::UnknownGesture(id))
    }

    fn check_out(&mut self, id: GestureId) -> Result<GestureRecognizer> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .ok_or(GestureError::UnknownGesture(id))?;
        slot.recognizer.take().ok_or(GestureError::Reentrant(id))
    }

    fn check_in(&mut self, id: GestureId, recognizer: GestureRecognizer) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            slot.recognizer = Some(recognizer);
        }
    }

    fn with_recognizer<R>(
        &mut self,
        id: GestureId,
        f: impl FnOnce(&mut Self, &mut GestureRecognizer) -> R,
    ) -> Result<R> {
        let mut recognizer = self.check_out(id)?;
        let out = f(self, &mut recognizer);
        self.check_in(id, recognizer);
        Ok(out)
    }

    // =========================================================================
    // Deliveries
    // =========================================================================

    fn touches_began(&mut self, id: GestureId, rec: &mut GestureRecognizer, touches: &[TouchPoint]) {
        rec.core.just_failed = false;
        rec.core.just_ended = false;
        if !rec.core.enabled || touches.is_empty() {
            return;
        }
        tracing::trace!(gesture = %id, count = touches.len(), "touches began");
        if rec.core.state.is_trackable() && rec.core.track_touches(touches) > 0 {
            rec.core.kept_touches_on_end = false;
            if rec.core.tracked_touches().len() > rec.core.max_touches() {
                self.fail_now(id, rec);
            } else {
                self.run_hook(id, rec, Hook::Began(touches));
            }
        }
    }

    fn touches_moved(&mut self, id: GestureId, rec: &mut GestureRecognizer, touches: &[TouchPoint]) {
        if !rec.core.enabled || touches.is_empty() || !rec.core.intersects(touches) {
            return;
        }
        if rec.core.tracked_touches().len() > rec.core.max_touches()
            || !rec.core.state.is_trackable()
        {
            self.fail_now(id, rec);
        } else if !self.end_restart(id, rec, touches) {
            rec.core.update_tracked_touches(touches);
            self.run_hook(id, rec, Hook::Moved);
        }
    }

    fn touches_ended(&mut self, id: GestureId, rec: &mut GestureRecognizer, touches: &[TouchPoint]) {
        if !rec.core.enabled || touches.is_empty() {
            return;
        }
        rec.core.release_ignored(touches);
        if !rec.core.touch_count_in_range() || !rec.core.state.is_trackable() {
            self.fail_now(id, rec);
        } else if rec.core.intersects(touches) {
            rec.core.update_tracked_touches(touches);
            self.run_hook(id, rec, Hook::Ended);
        }
        rec.core.stop_tracking_touches(touches);
        rec.core.just_ended = true;
    }

    fn touches_cancelled(
        &mut self,
        id: GestureId,
        rec: &mut GestureRecognizer,
        touches: &[TouchPoint],
    ) {
        if !rec.core.enabled || touches.is_empty() || !rec.core.intersects(touches) {
            return;
        }
        self.fail_now(id, rec);
        rec.core.stop_tracking_touches(touches);
        rec.core.just_ended = true;
    }

    fn end_restart(&mut self, id: GestureId, rec: &mut GestureRecognizer, touches: &[TouchPoint]) -> bool {
        if !rec.core.restarting {
            return false;
        }
        let resumed: Vec<TouchPoint> = touches
            .iter()
            .filter(|touch| rec.core.is_tracking(touch.id()))
            .cloned()
            .collect();
        rec.core.clear_tracked_touches();
        rec.core.restarting = false;
        tracing::debug!(gesture = %id, touches = resumed.len(), "restarting gesture");
        self.touches_began(id, rec, &resumed);
        true
    }

    fn run_hook(&mut self, id: GestureId, rec: &mut GestureRecognizer, hook: Hook<'_>) {
        let now = self.clock.now();
        let (requests, timers) = {
            let GestureRecognizer { core, kind, .. } = rec;
            let mut cx = HookContext::new(core, now, self.config.device);
            match hook {
                Hook::Began(touches) => kind.touches_began(&mut cx, touches),
                Hook::Moved => kind.touches_moved(&mut cx),
                Hook::Ended => kind.touches_ended(&mut cx),
                Hook::Timer(timer) => kind.timer_fired(&mut cx, timer),
            }
            cx.into_effects()
        };
        for (delay, timer) in timers {
            self.scheduler
                .run_after(now, delay, ScheduledTask::Fire { gesture: id, timer });
        }
        for request in requests {
            if !self.transition(id, rec, request) {
                break;
            }
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn transition(&mut self, id: GestureId, rec: &mut GestureRecognizer, transition: Transition) -> bool {
        let target = transition.target();
        if target == GestureState::Failed {
            self.fail_now(id, rec);
            return true;
        }
        if !self.arbitrate(id, rec, target) {
            return false;
        }
        match target {
            GestureState::Ended if self.must_wait_for_failures(id) => {
                tracing::debug!(gesture = %id, "end deferred until required gestures fail");
                rec.core.state = GestureState::EndPending;
                rec.fire_state_changed();
                false
            }
            GestureState::Began | GestureState::Executing => {
                rec.core.state = target;
                self.activate(id);
                rec.core
                    .update_touch_state(target == GestureState::Executing);
                rec.fire_state_changed();
                true
            }
            GestureState::Ended => {
                self.end_gesture(id, rec, transition.release_touches());
                let epoch = self.activate(id);
                let now = self.clock.now();
                self.scheduler.run_after(
                    now,
                    self.config.end_grace_period(),
                    ScheduledTask::ExpireActive { gesture: id, epoch },
                );
                true
            }
            _ => {
                rec.core.state = target;
                rec.fire_state_changed();
                true
            }
        }
    }

    /// Fail `rec` if another active recognizer may not run alongside it.
    fn arbitrate(&mut self, id: GestureId, rec: &mut GestureRecognizer, target: GestureState) -> bool {
        let contested = matches!(
            target,
            GestureState::Began | GestureState::Executing | GestureState::Ended
        );
        if self.active.is_empty() || !contested || rec.core.state.is_in_progress() {
            return true;
        }
        let this: &GestureRecognizer = rec;
        let blocker = self
            .active
            .keys()
            .copied()
            .find(|&other| other != id && self.conflicts(id, this, other));
        if let Some(other) = blocker {
            tracing::debug!(gesture = %id, blocked_by = %other, "simultaneous execution refused");
            self.fail_now(id, rec);
            return false;
        }
        true
    }

    fn conflicts(&self, id: GestureId, rec: &GestureRecognizer, other: GestureId) -> bool {
        let Some(other_rec) = self.get(other) else {
            return false;
        };
        let same_view = !rec.core.options().allow_simultaneous_if_views_differ
            || other_rec.core.view() == rec.core.view();
        same_view && !self.relations.allows_together(id, other)
    }

    fn must_wait_for_failures(&self, id: GestureId) -> bool {
        self.relations
            .required_failures(id)
            .any(|required| {
                self.get(required)
                    .is_some_and(|r| r.core.blocks_dependent_end())
            })
    }

    fn activate(&mut self, id: GestureId) -> u64 {
        self.epoch += 1;
        self.active.insert(id, self.epoch);
        self.epoch
    }

    fn deactivate(&mut self, id: GestureId) {
        self.active.remove(&id);
    }

    fn fail_now(&mut self, id: GestureId, rec: &mut GestureRecognizer) {
        rec.core.state = GestureState::Failed;
        self.deactivate(id);
        rec.fire_state_changed();

        for dependent in self.relations.dependents(id) {
            self.relations.record_failure(dependent, id);
            let released = self.with_recognizer(dependent, |arena, dep| {
                if dep.core.state == GestureState::EndPending
                    && arena.relations.all_required_failed(dependent)
                {
                    tracing::debug!(gesture = %dependent, "required gestures failed, ending");
                    arena.transition(dependent, dep, Transition::to(GestureState::Ended));
                }
            });
            if let Err(err) = released {
                tracing::warn!(gesture = %dependent, error = %err, "skipped dependent of failed gesture");
            }
        }

        let clear = rec.core.options().clear_tracked_touches_on_end_or_fail;
        self.reset_internal(id, rec, clear);
        rec.core.just_failed = true;
        rec.core.kept_touches_on_end = false;
        rec.core.forget_touch_count();
    }

    fn end_gesture(&mut self, id: GestureId, rec: &mut GestureRecognizer, release_touches: bool) {
        rec.core.state = GestureState::Ended;
        rec.fire_state_changed();

        let options = *rec.core.options();
        if options.reset_on_end {
            let clear = release_touches || options.clear_tracked_touches_on_end_or_fail;
            self.reset_internal(id, rec, clear);
        } else {
            rec.core.state = GestureState::Possible;
            rec.fire_state_changed();
            rec.core.clear_start_locations();
            self.deactivate(id);
            self.relations.clear_failures(id);
        }
        rec.core.kept_touches_on_end = !rec.core.tracked_touches().is_empty();
        rec.core.forget_touch_count();

        for dependent in self.relations.dependents(id) {
            let failed = self.with_recognizer(dependent, |arena, dep| arena.fail_now(dependent, dep));
            if let Err(err) = failed {
                tracing::warn!(gesture = %dependent, error = %err, "skipped dependent of ended gesture");
            }
        }
    }

    fn reset_internal(&mut self, id: GestureId, rec: &mut GestureRecognizer, clear_touches: bool) {
        if clear_touches {
            rec.core.clear_tracked_touches();
        }
        self.relations.clear_failures(id);
        rec.core.reset_accumulators();
        self.deactivate(id);
        rec.core.state = GestureState::Possible;
        rec.fire_state_changed();
    }

    fn reset_recognizer(&mut self, id: GestureId, rec: &mut GestureRecognizer) {
        rec.core.restarting = false;
        rec.core.kept_touches_on_end = false;
        rec.core.forget_touch_count();
        self.reset_internal(id, rec, true);
        rec.kind.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn arena() -> (GestureArena, ManualClock) {
        let clock = ManualClock::new();
        (GestureArena::new().with_clock(clock.clone()), clock)
    }

    fn recorder() -> (Rc<RefCell<Vec<GestureState>>>, impl FnMut(&GestureRecognizer)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |r: &GestureRecognizer| sink.borrow_mut().push(r.state()))
    }

    fn touch(id: i32, x: f32, y: f32) -> TouchPoint {
        TouchPoint::new(TouchId(id), x, y)
    }

    // =========================================================================
    // Handles
    // =========================================================================

    #[test]
    fn test_add_assigns_handles_in_order() {
        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::tap());
        let b = arena.add(GestureRecognizer::pan());
        assert_eq!(arena.ids(), &[a, b]);
        assert_eq!(arena.get(a).and_then(GestureRecognizer::id), Some(a));
        assert_eq!(arena.len(), 2);
        assert!(!arena.is_empty());
    }

    #[test]
    fn test_dispose_invalidates_handle_and_reuses_slot() {
        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::tap());
        let b = arena.add(GestureRecognizer::pan());
        arena.allow_simultaneous(a, b).expect("known handles");
        arena.require_failure_of(b, a).expect("known handles");

        let disposed = arena.dispose(a).expect("live handle");
        assert!(disposed.kind().as_tap().is_some());
        assert!(arena.get(a).is_none());
        assert!(matches!(arena.dispose(a), Err(GestureError::UnknownGesture(_))));
        assert!(!arena.relations().allows_together(a, b));
        assert_eq!(arena.relations().required_failures(b).count(), 0);

        let c = arena.add(GestureRecognizer::swipe());
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert_eq!(arena.ids(), &[b, c]);
    }

    #[test]
    fn test_gesture_id_display() {
        assert_eq!(GestureId::from_raw_parts(3, 2).to_string(), "gesture#3v2");
    }

    #[test]
    fn test_duplicate_touch_rejected() {
        let (mut arena, _) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        let err = arena
            .process_touches_began(pan, &[touch(1, 0.0, 0.0), touch(1, 5.0, 5.0)])
            .unwrap_err();
        assert!(matches!(err, GestureError::DuplicateTouch { .. }));
        assert!(arena.get(pan).is_some_and(|r| r.core().tracked_touches().is_empty()));
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    #[test]
    fn test_over_max_touches_fails() {
        let (mut arena, _) = arena();
        let (log, listener) = recorder();
        let pan = arena.add(GestureRecognizer::pan().on_state_changed(listener));
        arena
            .process_touches_began(pan, &[touch(1, 0.0, 0.0), touch(2, 10.0, 0.0)])
            .expect("valid delivery");
        assert_eq!(
            *log.borrow(),
            vec![GestureState::Failed, GestureState::Possible]
        );
        assert_eq!(arena.state(pan), Some(GestureState::Possible));
    }

    #[test]
    fn test_fail_keeps_touches_unless_configured() {
        let (mut arena, _) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        arena.process_touches_began(pan, &[touch(1, 0.0, 0.0)]).expect("valid");
        arena.request_state(pan, GestureState::Failed).expect("live");
        assert_eq!(arena.get(pan).map(|r| r.core().tracked_touches().len()), Some(1));

        let press = arena.add(GestureRecognizer::long_press());
        arena.process_touches_began(press, &[touch(2, 0.0, 0.0)]).expect("valid");
        arena.request_state(press, GestureState::Failed).expect("live");
        assert_eq!(arena.get(press).map(|r| r.core().tracked_touches().len()), Some(0));
    }

    #[test]
    fn test_began_joins_active_registry_and_end_expires() {
        let (mut arena, clock) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        assert!(arena.request_state(pan, GestureState::Began).expect("live"));
        assert!(arena.is_active(pan));
        assert_eq!(arena.active_count(), 1);

        assert!(arena.request_state(pan, GestureState::Ended).expect("live"));
        assert_eq!(arena.state(pan), Some(GestureState::Possible));
        assert!(arena.is_active(pan), "stays active for the grace period");

        clock.advance_ms(2);
        assert_eq!(arena.poll_timers(), 1);
        assert!(!arena.is_active(pan));
    }

    #[test]
    fn test_stale_expiry_keeps_reactivated_gesture() {
        let (mut arena, clock) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        arena.request_state(pan, GestureState::Ended).expect("live");
        arena.request_state(pan, GestureState::Began).expect("live");
        clock.advance_ms(5);
        arena.poll_timers();
        assert!(arena.is_active(pan));
    }

    #[test]
    fn test_arbitration_fails_late_comer() {
        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::pan());
        let b = arena.add(GestureRecognizer::pan());
        assert!(arena.request_state(a, GestureState::Began).expect("live"));
        assert!(!arena.request_state(b, GestureState::Began).expect("live"));
        assert_eq!(arena.state(b), Some(GestureState::Possible));
        assert!(!arena.is_active(b));
    }

    #[test]
    fn test_arbitration_allows_simultaneous_pairs() {
        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::pan());
        let b = arena.add(GestureRecognizer::rotate());
        let c = arena.add(GestureRecognizer::scale());
        arena.allow_simultaneous(a, b).expect("known");
        arena.allow_simultaneous_with_all(c).expect("known");
        assert!(arena.request_state(a, GestureState::Began).expect("live"));
        assert!(arena.request_state(b, GestureState::Began).expect("live"));
        assert!(arena.request_state(c, GestureState::Began).expect("live"));
        assert_eq!(arena.active_count(), 3);
    }

    #[test]
    fn test_arbitration_ignores_other_views() {
        use crate::recognizer::ViewId;

        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::pan().with_view(ViewId(1)));
        let b = arena.add(GestureRecognizer::pan().with_view(ViewId(2)));
        assert!(arena.request_state(a, GestureState::Began).expect("live"));
        assert!(arena.request_state(b, GestureState::Began).expect("live"));

        let c = arena.add(GestureRecognizer::pan().with_view(ViewId(3)));
        if let Some(rec) = arena.get_mut(c) {
            rec.core_mut().set_allow_simultaneous_if_views_differ(false);
        }
        assert!(!arena.request_state(c, GestureState::Began).expect("live"));
    }

    #[test]
    fn test_end_pending_until_required_fails() {
        let (mut arena, _) = arena();
        let (log, listener) = recorder();
        let a = arena.add(GestureRecognizer::tap().on_state_changed(listener));
        let b = arena.add(GestureRecognizer::pan());
        arena.require_failure_of(a, b).expect("known");

        arena.process_touches_began(b, &[touch(1, 0.0, 0.0)]).expect("valid");
        assert!(!arena.request_state(a, GestureState::Ended).expect("live"));
        assert_eq!(arena.state(a), Some(GestureState::EndPending));

        arena.request_state(b, GestureState::Failed).expect("live");
        assert_eq!(arena.state(a), Some(GestureState::Possible));
        let log = log.borrow();
        assert_eq!(
            &log[log.len() - 3..],
            &[GestureState::EndPending, GestureState::Ended, GestureState::Possible]
        );
    }

    #[test]
    fn test_dispose_leaves_end_pending_dependent_parked() {
        let (mut arena, _) = arena();
        let (log, listener) = recorder();
        let a = arena.add(GestureRecognizer::tap().on_state_changed(listener));
        let b = arena.add(GestureRecognizer::pan());
        arena.require_failure_of(a, b).expect("known");
        arena.process_touches_began(b, &[touch(1, 0.0, 0.0)]).expect("valid");
        assert!(!arena.request_state(a, GestureState::Ended).expect("live"));

        arena.dispose(b).expect("live");
        assert_eq!(arena.state(a), Some(GestureState::EndPending));
        assert!(arena.relations().required_failures(a).next().is_none());

        arena.process_touches_ended(a, &[touch(1, 0.0, 0.0)]).expect("valid");
        assert_eq!(arena.state(a), Some(GestureState::Possible));
        let log = log.borrow();
        assert!(!log.contains(&GestureState::Ended));
        assert_eq!(
            &log[log.len() - 2..],
            &[GestureState::Failed, GestureState::Possible]
        );
    }

    #[test]
    fn test_required_gesture_at_rest_does_not_block() {
        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::tap());
        let b = arena.add(GestureRecognizer::pan());
        arena.require_failure_of(a, b).expect("known");
        assert!(arena.request_state(a, GestureState::Ended).expect("live"));
    }

    #[test]
    fn test_ending_fails_dependents() {
        let (mut arena, _) = arena();
        let (log, listener) = recorder();
        let a = arena.add(GestureRecognizer::tap().on_state_changed(listener));
        let b = arena.add(GestureRecognizer::tap());
        arena.require_failure_of(a, b).expect("known");
        arena.request_state(b, GestureState::Ended).expect("live");
        assert_eq!(
            *log.borrow(),
            vec![GestureState::Failed, GestureState::Possible]
        );
    }

    #[test]
    fn test_mutual_dependency_fails_cleanly() {
        let (mut arena, _) = arena();
        let a = arena.add(GestureRecognizer::tap());
        let b = arena.add(GestureRecognizer::tap());
        arena.require_failure_of(a, b).expect("known");
        arena.require_failure_of(b, a).expect("known");
        arena.request_state(a, GestureState::Failed).expect("live");
        assert_eq!(arena.state(a), Some(GestureState::Possible));
        assert_eq!(arena.state(b), Some(GestureState::Possible));
    }

    // =========================================================================
    // Control
    // =========================================================================

    #[test]
    fn test_disabled_recognizer_ignores_touches() {
        let (mut arena, _) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        arena.set_enabled(pan, false).expect("live");
        arena.process_touches_began(pan, &[touch(1, 0.0, 0.0)]).expect("valid");
        assert!(arena.get(pan).is_some_and(|r| r.core().tracked_touches().is_empty()));

        arena.set_enabled(pan, true).expect("live");
        arena.process_touches_began(pan, &[touch(1, 0.0, 0.0)]).expect("valid");
        assert_eq!(arena.get(pan).map(|r| r.core().tracked_touches().len()), Some(1));
    }

    #[test]
    fn test_reset_clears_touches() {
        let (mut arena, _) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        arena.process_touches_began(pan, &[touch(1, 0.0, 0.0)]).expect("valid");
        arena.reset(pan).expect("live");
        let rec = arena.get(pan).expect("live");
        assert!(rec.core().tracked_touches().is_empty());
        assert!(rec.core().start_focus().is_none());
    }

    #[test]
    fn test_cancel_fails_tracking_recognizer() {
        let (mut arena, _) = arena();
        let (log, listener) = recorder();
        let pan = arena.add(GestureRecognizer::pan().on_state_changed(listener));
        arena.process_touches_began(pan, &[touch(1, 0.0, 0.0)]).expect("valid");
        arena
            .process_touches_cancelled(pan, &[touch(9, 0.0, 0.0)])
            .expect("valid");
        assert!(!log.borrow().contains(&GestureState::Failed));

        arena
            .process_touches_cancelled(pan, &[touch(1, 0.0, 0.0).with_phase(TouchPhase::Cancelled)])
            .expect("valid");
        assert!(log.borrow().contains(&GestureState::Failed));
        assert!(arena.get(pan).is_some_and(|r| r.core().tracked_touches().is_empty()));
    }

    #[test]
    fn test_simulate_rejects_bad_paths() {
        let (mut arena, _) = arena();
        let pan = arena.add(GestureRecognizer::pan());
        assert!(!arena.simulate(pan, &[]).expect("live"));
        assert!(!arena.simulate(pan, &[1.0, 2.0, 3.0]).expect("live"));
        assert!(arena.simulate(pan, &[1.0, 2.0]).expect("live"));
    }

    #[test]
    fn test_unknown_handle_errors() {
        let (mut arena, _) = arena();
        let ghost = GestureId::from_raw_parts(7, 0);
        assert!(matches!(
            arena.process_touches_began(ghost, &[touch(1, 0.0, 0.0)]),
            Err(GestureError::UnknownGesture(id)) if id == ghost
        ));
        assert!(arena.begin_restart(ghost).is_err());
        assert!(arena.allow_simultaneous_with_all(ghost).is_err());
    }
}
