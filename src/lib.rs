//! Stochastic trajectory samplers for semi-Markov jump processes.
//!
//! A process exposes its currently enabled clocks (transitions), each
//! carrying a [`Hazard`]; a sampler answers *which clock fires next, and
//! when*, and observes clock-state changes to keep its internal structures
//! consistent. Five interoperable engines are provided:
//!
//! - [`Direct`]: classical Gillespie over exponential clocks, O(n) per step.
//! - [`FixedDirect`]: Gillespie over a prefix-sum tree indexed by fixed
//!   clock slots, O(log n) selection.
//! - [`FirstReaction`]: general semi-Markov, minimum over per-clock samples.
//! - [`NextReaction`]: Anderson's method; per-clock unit-exponential
//!   residuals preserved across enable/modify/disable, amortized O(log n).
//! - [`Naive`]: deliberately biased re-sampling baseline, kept for
//!   differential testing.
//!
//! The outer loop alternates [`Sampler::next`] with [`Sampler::observe`]
//! for every clock-state change caused by the fired clock; the
//! [`simulate`] module supplies that loop and a rayon ensemble driver.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use rand::RngCore;
use thiserror::Error;

mod direct;
mod first_reaction;
mod fixed_direct;
mod hazard;
mod naive;
mod next_reaction;
mod queue;
pub mod simulate;
mod tree;

pub use direct::Direct;
pub use first_reaction::FirstReaction;
pub use fixed_direct::FixedDirect;
pub use hazard::{Deterministic, Exponential, Hazard, PiecewiseExponential, Weibull};
pub use naive::Naive;
pub use next_reaction::NextReaction;
pub use queue::{FiringQueue, QueueHandle};
pub use simulate::{JumpProcess, Trajectory, run_ensemble, simulate_trajectory};
pub use tree::RateTree;

/// Total rates at or below this are treated as zero; the degenerate
/// result is `(f64::INFINITY, None)` rather than an error so the outer
/// loop can terminate cleanly.
pub const TIME_EPSILON: f64 = 1e-12;

/// Clock-state change delivered to a sampler's observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// The clock became enabled (or re-enabled after a disable or fire).
    Enabled,
    /// The clock's hazard changed while it stayed enabled.
    Modified,
    /// The clock became disabled without firing.
    Disabled,
    /// The clock fired.
    Fired,
}

/// Identity of a clock. Keys are opaque handles compared by equality;
/// samplers clone them into their own records and never inspect them.
pub trait ClockKey: Clone + Eq + Hash + fmt::Debug {}

impl<K: Clone + Eq + Hash + fmt::Debug> ClockKey for K {}

/// A clock key carrying a fixed slot index in `[0, capacity)`, required
/// by the fixed-direct sampler. Slots must be stable for the lifetime of
/// a trajectory.
pub trait SlotKey: ClockKey {
    fn slot(&self) -> usize;
}

/// Callback receiving one clock-state change:
/// `(clock, hazard, when, event, rng)`. The hazard reference accompanies
/// every event; disable/fire handlers ignore it.
pub type ClockObserver<'a, K> =
    &'a mut dyn FnMut(&K, &dyn Hazard, f64, ClockEvent, &mut dyn RngCore);

/// The process side of the contract: current time plus enumeration of
/// the currently enabled clocks. Stateful samplers call
/// [`Process::hazards`] once, on their first `next`, to bootstrap, and
/// are kept current through [`Sampler::observe`] afterwards; the
/// stateless engines re-enumerate on every step, so the enumeration must
/// always reflect the current state.
pub trait Process {
    type Key: ClockKey;

    /// Current absolute simulation time.
    fn time(&self) -> f64;

    /// Invoke `visit` once per currently enabled clock with the clock's
    /// hazard, its enabling time and [`ClockEvent::Enabled`].
    fn hazards(&self, rng: &mut dyn RngCore, visit: ClockObserver<'_, Self::Key>);
}

/// A sampling engine together with its per-trajectory state.
///
/// `next` is non-destructive: repeated calls without an intervening
/// observed event describe the same pending firing (stateful samplers
/// return the identical pair; stateless ones re-sample). Observer calls
/// for all state changes caused by a firing must be delivered before the
/// following `next`.
pub trait Sampler<K: ClockKey> {
    /// Which clock fires next and at what absolute time;
    /// `(f64::INFINITY, None)` when nothing can fire.
    fn next(&mut self, process: &dyn Process<Key = K>, rng: &mut dyn RngCore)
    -> (f64, Option<K>);

    /// Apply one clock-state change to the sampler's internal state.
    fn observe(
        &mut self,
        clock: &K,
        hazard: &dyn Hazard,
        when: f64,
        event: ClockEvent,
        rng: &mut dyn RngCore,
    );
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// Selector for the five engines, used by configuration surfaces and the
/// ensemble driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerKind {
    Direct,
    FixedDirect,
    FirstReaction,
    NextReaction,
    Naive,
}

impl SamplerKind {
    /// Build the corresponding engine. `capacity` is the slot count for
    /// [`FixedDirect`] and is ignored by the other kinds.
    pub fn build<K: SlotKey>(self, capacity: usize) -> AnySampler<K> {
        match self {
            SamplerKind::Direct => AnySampler::Direct(Direct::new()),
            SamplerKind::FixedDirect => AnySampler::FixedDirect(FixedDirect::new(capacity)),
            SamplerKind::FirstReaction => AnySampler::FirstReaction(FirstReaction::new()),
            SamplerKind::NextReaction => AnySampler::NextReaction(NextReaction::new()),
            SamplerKind::Naive => AnySampler::Naive(Naive::new()),
        }
    }
}

impl FromStr for SamplerKind {
    type Err = SimError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case("direct") {
            Ok(SamplerKind::Direct)
        } else if name.eq_ignore_ascii_case("fixed-direct") {
            Ok(SamplerKind::FixedDirect)
        } else if name.eq_ignore_ascii_case("first-reaction") {
            Ok(SamplerKind::FirstReaction)
        } else if name.eq_ignore_ascii_case("next-reaction") {
            Ok(SamplerKind::NextReaction)
        } else if name.eq_ignore_ascii_case("naive") {
            Ok(SamplerKind::Naive)
        } else {
            Err(SimError::InvalidArgument(format!(
                "unrecognized sampler '{}' (expected direct, fixed-direct, first-reaction, next-reaction, or naive)",
                name
            )))
        }
    }
}

/// Tagged union of the five engines, so one trajectory stays monomorphic
/// over a runtime-chosen sampler.
pub enum AnySampler<K: SlotKey> {
    Direct(Direct),
    FixedDirect(FixedDirect<K>),
    FirstReaction(FirstReaction),
    NextReaction(NextReaction<K>),
    Naive(Naive<K>),
}

impl<K: SlotKey> Sampler<K> for AnySampler<K> {
    fn next(
        &mut self,
        process: &dyn Process<Key = K>,
        rng: &mut dyn RngCore,
    ) -> (f64, Option<K>) {
        match self {
            AnySampler::Direct(sampler) => sampler.next(process, rng),
            AnySampler::FixedDirect(sampler) => sampler.next(process, rng),
            AnySampler::FirstReaction(sampler) => sampler.next(process, rng),
            AnySampler::NextReaction(sampler) => sampler.next(process, rng),
            AnySampler::Naive(sampler) => sampler.next(process, rng),
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
        match self {
            AnySampler::Direct(sampler) => sampler.observe(clock, hazard, when, event, rng),
            AnySampler::FixedDirect(sampler) => sampler.observe(clock, hazard, when, event, rng),
            AnySampler::FirstReaction(sampler) => sampler.observe(clock, hazard, when, event, rng),
            AnySampler::NextReaction(sampler) => sampler.observe(clock, hazard, when, event, rng),
            AnySampler::Naive(sampler) => sampler.observe(clock, hazard, when, event, rng),
        }
    }
}
