//! First reaction method for arbitrary semi-Markov clocks.

use rand::RngCore;

use crate::{ClockEvent, ClockKey, Hazard, Process, Sampler};

/// Stateless minimum over per-clock putative firing times.
///
/// Every `next` samples a firing time from each enabled clock's hazard
/// and takes the earliest, which is correct for arbitrary waiting-time
/// distributions at the cost of O(n) samples per step.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstReaction;

impl FirstReaction {
    pub fn new() -> Self {
        Self
    }
}

impl<K: ClockKey> Sampler<K> for FirstReaction {
    fn next(
        &mut self,
        process: &dyn Process<Key = K>,
        rng: &mut dyn RngCore,
    ) -> (f64, Option<K>) {
        let now = process.time();
        let mut best_time = f64::INFINITY;
        let mut best_clock: Option<K> = None;
        process.hazards(&mut *rng, &mut |clock, hazard, _when, _event, visit_rng| {
            let firing = hazard.sample(now, visit_rng);
            debug_assert!(firing >= now, "hazard sampled into the past");
            if firing < best_time {
                best_time = firing;
                best_clock = Some(clock.clone());
            }
        });
        (best_time, best_clock)
    }

    fn observe(
        &mut self,
        _clock: &K,
        _hazard: &dyn Hazard,
        _when: f64,
        _event: ClockEvent,
        _rng: &mut dyn RngCore,
    ) {
        // Stateless: every step re-samples from the process's hazards.
    }
}
