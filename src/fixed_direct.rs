//! Fixed direct method: Gillespie selection over fixed clock slots.

use rand::{Rng, RngCore};

use crate::tree::RateTree;
use crate::{ClockEvent, Hazard, Process, Sampler, SlotKey, TIME_EPSILON};

/// Stateful Gillespie sampler over a prefix-sum tree indexed by the
/// clocks' fixed slots.
///
/// Requires every clock to carry a stable slot in `[0, capacity)` (the
/// [`SlotKey`] contract) and exponential hazards whose rate is the first
/// parameter. Selection is O(log capacity); observer updates are one
/// leaf write each.
#[derive(Clone, Debug)]
pub struct FixedDirect<K: SlotKey> {
    tree: RateTree,
    clock_index: Vec<Option<K>>,
    init: bool,
}

impl<K: SlotKey> FixedDirect<K> {
    /// A sampler over `capacity` clock slots, all initially empty. The
    /// first `next` call bootstraps from the process.
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: RateTree::new(capacity),
            clock_index: vec![None; capacity],
            init: true,
        }
    }

    /// Sum of rates over the currently enabled clocks.
    pub fn total_rate(&self) -> f64 {
        self.tree.total()
    }

    fn set_slot(&mut self, clock: &K, rate: f64) {
        let slot = clock.slot();
        assert!(
            slot < self.clock_index.len(),
            "clock {:?} slot {} out of range {}",
            clock,
            slot,
            self.clock_index.len()
        );
        self.clock_index[slot] = Some(clock.clone());
        self.tree.update(slot, rate);
    }
}

impl<K: SlotKey> Sampler<K> for FixedDirect<K> {
    fn next(
        &mut self,
        process: &dyn Process<Key = K>,
        rng: &mut dyn RngCore,
    ) -> (f64, Option<K>) {
        if self.init {
            self.init = false;
            let mut updates: Vec<(usize, f64)> = Vec::new();
            let clock_index = &mut self.clock_index;
            process.hazards(&mut *rng, &mut |clock, hazard, _when, _event, _rng| {
                let slot = clock.slot();
                assert!(
                    slot < clock_index.len(),
                    "clock {:?} slot {} out of range {}",
                    clock,
                    slot,
                    clock_index.len()
                );
                clock_index[slot] = Some(clock.clone());
                updates.push((slot, hazard.parameters()[0]));
            });
            self.tree.bulk_update(&updates);
        }

        let total = self.tree.total();
        if total <= TIME_EPSILON {
            return (f64::INFINITY, None);
        }
        let (slot, _rate) = self.tree.choose(rng.r#gen::<f64>() * total);
        let clock = self.clock_index[slot]
            .clone()
            .expect("chosen slot has no recorded clock");
        let u: f64 = rng.r#gen();
        (process.time() - u.ln() / total, Some(clock))
    }

    fn observe(
        &mut self,
        clock: &K,
        hazard: &dyn Hazard,
        _when: f64,
        event: ClockEvent,
        _rng: &mut dyn RngCore,
    ) {
        match event {
            ClockEvent::Enabled | ClockEvent::Modified => {
                let rate = hazard.parameters()[0];
                tracing::trace!(clock = ?clock, rate, "slot enabled");
                self.set_slot(clock, rate);
            }
            ClockEvent::Disabled | ClockEvent::Fired => {
                tracing::trace!(clock = ?clock, "slot cleared");
                // The stale key stays in clock_index; it is re-set on the
                // next enable of this slot.
                self.tree.update(clock.slot(), 0.0);
            }
        }
    }
}
