//! Trajectory driver and parallel ensemble runner.
//!
//! A single trajectory alternates [`Sampler::next`] with the delivery of
//! every clock-state change caused by the chosen firing; ensembles fan
//! trajectories out over rayon with one counter-seeded ChaCha8 stream
//! per trajectory, so results are reproducible for a fixed seed at any
//! thread count.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::{ClockObserver, Process, Sampler, SimError};

/// The firing side of the process contract.
///
/// `fire` applies the chosen clock at `when` and reports every resulting
/// clock-state change through `observe` before returning, including the
/// [`crate::ClockEvent::Fired`] event for the chosen clock itself; after
/// it returns, [`Process::time`] equals `when`. The order of reports
/// within one firing is the process's choice; samplers are correct under
/// any order for distinct clocks.
pub trait JumpProcess: Process {
    fn fire(
        &mut self,
        clock: &Self::Key,
        when: f64,
        rng: &mut dyn RngCore,
        observe: ClockObserver<'_, Self::Key>,
    );
}

/// One realized trajectory: the `(time, fired clock)` pairs in order.
#[derive(Clone, Debug)]
pub struct Trajectory<K> {
    pub times: Vec<f64>,
    pub clocks: Vec<K>,
    /// Time at which the trajectory stopped: the horizon, or the last
    /// firing if the process died out first.
    pub duration: f64,
}

impl<K> Trajectory<K> {
    pub fn n_events(&self) -> usize {
        self.clocks.len()
    }
}

/// Run one trajectory until `t_end` or until no clock can fire.
pub fn simulate_trajectory<P, S>(
    process: &mut P,
    sampler: &mut S,
    t_end: f64,
    rng: &mut dyn RngCore,
) -> Result<Trajectory<P::Key>, SimError>
where
    P: JumpProcess,
    S: Sampler<P::Key> + ?Sized,
{
    if t_end <= 0.0 {
        return Err(SimError::InvalidArgument("t_end must be positive".into()));
    }
    let mut times = Vec::new();
    let mut clocks = Vec::new();
    let mut current_time = process.time();
    loop {
        let (when, chosen) = sampler.next(&*process, &mut *rng);
        // Died out: no clock can ever fire again.
        let Some(clock) = chosen else { break };
        if when > t_end {
            // Survived to the horizon with a firing still pending.
            current_time = t_end;
            break;
        }
        process.fire(
            &clock,
            when,
            &mut *rng,
            &mut |changed, hazard, at, event, observe_rng| {
                sampler.observe(changed, hazard, at, event, observe_rng);
            },
        );
        debug_assert!(when >= current_time, "firing time went backwards");
        current_time = when;
        times.push(when);
        clocks.push(clock);
    }
    tracing::debug!(events = clocks.len(), duration = current_time, "trajectory done");
    Ok(Trajectory {
        times,
        clocks,
        duration: current_time,
    })
}

/// Simulate `n_trajectories` independent trajectories in parallel.
///
/// `make_process(i)` and `make_sampler()` build a fresh process and
/// sampler per trajectory; trajectory `i` runs on a ChaCha8 stream
/// derived from `seed` and `i`, so a fixed seed reproduces the ensemble
/// regardless of thread count. `n_threads` installs a dedicated rayon
/// pool; `None` uses the global one.
pub fn run_ensemble<P, S, FP, FS>(
    make_process: FP,
    make_sampler: FS,
    t_end: f64,
    n_trajectories: usize,
    n_threads: Option<usize>,
    seed: Option<u64>,
) -> Result<Vec<Trajectory<P::Key>>, SimError>
where
    P: JumpProcess,
    P::Key: Send,
    S: Sampler<P::Key>,
    FP: Fn(usize) -> P + Sync,
    FS: Fn() -> S + Sync,
{
    if n_trajectories == 0 {
        return Err(SimError::InvalidArgument(
            "number of trajectories must be greater than zero".into(),
        ));
    }
    if t_end <= 0.0 {
        return Err(SimError::InvalidArgument("t_end must be positive".into()));
    }
    tracing::debug!(n_trajectories, t_end, "ensemble start");

    let simulate = || {
        (0..n_trajectories)
            .into_par_iter()
            .map(|traj_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, traj_idx as u64));
                let mut process = make_process(traj_idx);
                let mut sampler = make_sampler();
                simulate_trajectory(&mut process, &mut sampler, t_end, &mut rng)
            })
            .collect::<Result<Vec<_>, SimError>>()
    };

    match n_threads {
        Some(n) => ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?
            .install(simulate),
        None => simulate(),
    }
}

/// Split one base seed into per-trajectory streams (SplitMix64).
pub fn derive_seed(seed: Option<u64>, trajectory: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
    let base = seed.unwrap_or(0xDEADBEEFCAFEBABE);
    let z = base ^ (trajectory.wrapping_mul(GOLDEN_GAMMA));
    let mut result = z.wrapping_add(GOLDEN_GAMMA);
    result = (result ^ (result >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    result = (result ^ (result >> 27)).wrapping_mul(0x94D049BB133111EB);
    result ^ (result >> 31)
}
