//! Next reaction method (Anderson's formulation) for semi-Markov clocks.

use std::collections::HashMap;

use rand::RngCore;

use crate::queue::{FiringQueue, QueueHandle};
use crate::{ClockEvent, ClockKey, Hazard, Process, Sampler};

/// Per-clock bookkeeping: the unit-exponential residual drawn when the
/// clock was first enabled, and its position in the firing queue.
/// `heap_handle` is `None` while the clock is disabled with its residual
/// preserved.
#[derive(Clone, Copy, Debug)]
struct TransitionRecord {
    exponential_interval: f64,
    heap_handle: Option<QueueHandle>,
}

/// Stateful propagator that preserves each clock's unit-exponential
/// residual across enable, modify and disable cycles.
///
/// The residual measures how much integrated hazard remains until the
/// clock fires. When a hazard is modified, the putative firing time is
/// recomputed from the same residual against the new hazard, which thins
/// the process without re-randomizing. A fresh residual is drawn only
/// when a clock is first enabled, or when it re-enables after firing:
/// firing deletes the record, so unbounded-lifetime models do not
/// accumulate state.
#[derive(Clone, Debug)]
pub struct NextReaction<K: ClockKey> {
    firing_queue: FiringQueue<K>,
    transition_state: HashMap<K, TransitionRecord>,
    init: bool,
}

impl<K: ClockKey> Default for NextReaction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ClockKey> NextReaction<K> {
    pub fn new() -> Self {
        Self {
            firing_queue: FiringQueue::new(),
            transition_state: HashMap::new(),
            init: true,
        }
    }

    /// Number of clocks currently queued to fire.
    pub fn queued(&self) -> usize {
        self.firing_queue.len()
    }

    fn enable(&mut self, clock: &K, hazard: &dyn Hazard, when: f64, rng: &mut dyn RngCore) {
        if let Some(record) = self.transition_state.get_mut(clock) {
            // Known clock: reuse the preserved residual against the
            // (possibly modified) hazard.
            let firing = hazard.putative(when, record.exponential_interval);
            debug_assert!(firing >= when, "putative firing time in the past");
            tracing::trace!(clock = ?clock, firing, "rescheduled");
            match record.heap_handle {
                Some(handle) => self.firing_queue.update(handle, firing),
                None => {
                    record.heap_handle = Some(self.firing_queue.push(firing, clock.clone()));
                }
            }
        } else {
            let (firing, interval) = hazard.measured_sample(when, rng);
            tracing::trace!(clock = ?clock, firing, "scheduled");
            let handle = self.firing_queue.push(firing, clock.clone());
            self.transition_state.insert(
                clock.clone(),
                TransitionRecord {
                    exponential_interval: interval,
                    heap_handle: Some(handle),
                },
            );
        }
    }

    fn disable(&mut self, clock: &K, event: ClockEvent) {
        let record = self
            .transition_state
            .get_mut(clock)
            .unwrap_or_else(|| panic!("disable of unknown clock {:?}", clock));
        let handle = record
            .heap_handle
            .take()
            .unwrap_or_else(|| panic!("clock {:?} is not queued", clock));
        let (_, removed) = self.firing_queue.remove(handle);
        assert!(
            removed == *clock,
            "firing queue entry does not match clock {:?}",
            clock
        );
        if event == ClockEvent::Fired {
            // Policy: delete on fire; a re-enabled clock draws fresh.
            tracing::trace!(clock = ?clock, "retired");
            self.transition_state.remove(clock);
        } else {
            tracing::trace!(clock = ?clock, "parked");
        }
    }
}

impl<K: ClockKey> Sampler<K> for NextReaction<K> {
    fn next(
        &mut self,
        process: &dyn Process<Key = K>,
        rng: &mut dyn RngCore,
    ) -> (f64, Option<K>) {
        if self.init {
            self.init = false;
            let mut bootstrap =
                |clock: &K, hazard: &dyn Hazard, when: f64, _event: ClockEvent, visit_rng: &mut dyn RngCore| {
                    self.enable(clock, hazard, when, visit_rng);
                };
            process.hazards(&mut *rng, &mut bootstrap);
        }
        match self.firing_queue.peek() {
            Some((firing, clock)) => (firing, Some(clock.clone())),
            None => (f64::INFINITY, None),
        }
    }

    fn observe(
        &mut self,
        clock: &K,
        hazard: &dyn Hazard,
        when: f64,
        event: ClockEvent,
        rng: &mut dyn RngCore,
    ) {
        match event {
            ClockEvent::Enabled | ClockEvent::Modified => self.enable(clock, hazard, when, rng),
            ClockEvent::Disabled | ClockEvent::Fired => self.disable(clock, event),
        }
    }
}
