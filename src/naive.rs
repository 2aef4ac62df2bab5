//! Re-sampling baseline, deliberately incorrect for non-memoryless models.

use std::collections::{HashMap, HashSet};

use rand::RngCore;

use crate::queue::{FiringQueue, QueueHandle};
use crate::{ClockEvent, ClockKey, Hazard, Process, Sampler};

/// Propagator with the queue machinery of [`crate::NextReaction`] but no
/// residual preservation: every `Enabled` or `Modified` event re-samples
/// the firing time from scratch.
///
/// On memoryless models its marginals match the first reaction method;
/// anywhere else it biases the joint distribution, which is exactly why
/// it is kept: as the incorrect baseline for differential tests.
///
/// Re-enabling a clock that was previously disabled is permitted and
/// silently draws a fresh firing time; that path is unsafe in the sense
/// that it discards the disabled clock's history.
#[derive(Clone, Debug)]
pub struct Naive<K: ClockKey> {
    firing_queue: FiringQueue<K>,
    queued: HashMap<K, QueueHandle>,
    disabled: HashSet<K>,
    init: bool,
}

impl<K: ClockKey> Default for Naive<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ClockKey> Naive<K> {
    pub fn new() -> Self {
        Self {
            firing_queue: FiringQueue::new(),
            queued: HashMap::new(),
            disabled: HashSet::new(),
            init: true,
        }
    }
}

impl<K: ClockKey> Sampler<K> for Naive<K> {
    fn next(
        &mut self,
        process: &dyn Process<Key = K>,
        rng: &mut dyn RngCore,
    ) -> (f64, Option<K>) {
        if self.init {
            self.init = false;
            let mut bootstrap =
                |clock: &K, hazard: &dyn Hazard, when: f64, event: ClockEvent, visit_rng: &mut dyn RngCore| {
                    self.observe(clock, hazard, when, event, visit_rng);
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
            ClockEvent::Enabled | ClockEvent::Modified => {
                self.disabled.remove(clock);
                let firing = hazard.sample(when, rng);
                debug_assert!(firing >= when, "hazard sampled into the past");
                match self.queued.get(clock) {
                    Some(&handle) => self.firing_queue.update(handle, firing),
                    None => {
                        let handle = self.firing_queue.push(firing, clock.clone());
                        self.queued.insert(clock.clone(), handle);
                    }
                }
            }
            ClockEvent::Disabled | ClockEvent::Fired => {
                if let Some(handle) = self.queued.remove(clock) {
                    let (_, removed) = self.firing_queue.remove(handle);
                    debug_assert!(removed == *clock, "firing queue entry mismatch");
                }
                self.disabled.insert(clock.clone());
            }
        }
    }
}
