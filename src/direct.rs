//! Direct (Gillespie) method over exponential clocks.

use rand::{Rng, RngCore};

use crate::{ClockEvent, ClockKey, Hazard, Process, Sampler, TIME_EPSILON};

/// One-shot cumulative-sum selection over the enabled exponential clocks.
///
/// Holds no state between steps: every `next` re-enumerates the process's
/// clocks, reads each rate as the first hazard parameter and selects in
/// O(n). The process must guarantee exponential hazards; anything else is
/// undefined behavior for this sampler.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl Direct {
    pub fn new() -> Self {
        Self
    }
}

impl<K: ClockKey> Sampler<K> for Direct {
    fn next(
        &mut self,
        process: &dyn Process<Key = K>,
        rng: &mut dyn RngCore,
    ) -> (f64, Option<K>) {
        let now = process.time();
        let mut cumulative: Vec<f64> = Vec::new();
        let mut keys: Vec<K> = Vec::new();
        let mut total = 0.0;
        process.hazards(
            &mut *rng,
            &mut |clock, hazard, _when, _event, _visit_rng| {
                total += hazard.parameters()[0];
                cumulative.push(total);
                keys.push(clock.clone());
            },
        );
        if total <= TIME_EPSILON {
            return (f64::INFINITY, None);
        }
        let target = rng.r#gen::<f64>() * total;
        let chosen = cumulative.partition_point(|&c| c < target);
        assert!(chosen < keys.len(), "cumulative rate scan overran");
        let u: f64 = rng.r#gen();
        (now - u.ln() / total, Some(keys[chosen].clone()))
    }

    fn observe(
        &mut self,
        _clock: &K,
        _hazard: &dyn Hazard,
        _when: f64,
        _event: ClockEvent,
        _rng: &mut dyn RngCore,
    ) {
        // Stateless: the next call re-reads everything from the process.
    }
}
