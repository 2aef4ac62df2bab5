//! Hazard (intensity) functions for competing clocks.
//!
//! A hazard describes a single clock's instantaneous firing rate from the
//! moment the clock was enabled. Implementors provide the integrated
//! hazard Λ and its inverse; putative firing times, plain samples and
//! residual-measured samples all derive from those two, so the residual
//! bookkeeping of the next-reaction sampler works uniformly across
//! distributions.
//!
//! Hazards are anchored at their enabling time. A process that modifies a
//! clock mid-life hands the sampler an updated view of the same hazard
//! history (see [`PiecewiseExponential`]), which is what keeps a stored
//! unit-exponential residual valid across the modification.

use rand::{Rng, RngCore};

/// A clock's intensity, anchored at the clock's enabling time.
pub trait Hazard {
    /// Distribution parameters; the rate comes first for exponential
    /// hazards, which is what the exponential-only samplers read.
    fn parameters(&self) -> Vec<f64>;

    /// Integrated hazard Λ(t) from the enabling time to `t`.
    fn cumulative(&self, t: f64) -> f64;

    /// The time at which Λ reaches `xi`; infinite when it never does.
    fn inverse_cumulative(&self, xi: f64) -> f64;

    /// Deterministic firing time implied by a previously drawn
    /// unit-exponential residual `xi`. Never earlier than `now`.
    fn putative(&self, now: f64, xi: f64) -> f64 {
        self.inverse_cumulative(xi).max(now)
    }

    /// Draw a firing time conditional on survival to `now`, returning it
    /// together with the unit-exponential residual consumed.
    fn measured_sample(&self, now: f64, rng: &mut dyn RngCore) -> (f64, f64) {
        let u: f64 = rng.r#gen();
        let xi = self.cumulative(now) - u.ln();
        (self.inverse_cumulative(xi).max(now), xi)
    }

    /// Draw an absolute firing time conditional on survival to `now`.
    fn sample(&self, now: f64, rng: &mut dyn RngCore) -> f64 {
        self.measured_sample(now, rng).0
    }
}

/// Constant-rate hazard: Λ(t) = rate · (t − origin).
#[derive(Clone, Copy, Debug)]
pub struct Exponential {
    rate: f64,
    origin: f64,
}

impl Exponential {
    /// A clock with constant `rate`, enabled at `origin`.
    pub fn new(rate: f64, origin: f64) -> Self {
        assert!(rate > 0.0 && rate.is_finite(), "rate must be positive");
        Self { rate, origin }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Hazard for Exponential {
    fn parameters(&self) -> Vec<f64> {
        vec![self.rate]
    }

    fn cumulative(&self, t: f64) -> f64 {
        self.rate * (t - self.origin).max(0.0)
    }

    fn inverse_cumulative(&self, xi: f64) -> f64 {
        self.origin + xi / self.rate
    }
}

/// Weibull hazard: Λ(t) = ((t − origin) / scale)^shape.
///
/// Shape > 1 ages (rate grows with enabled time), shape < 1 burns in.
#[derive(Clone, Copy, Debug)]
pub struct Weibull {
    shape: f64,
    scale: f64,
    origin: f64,
}

impl Weibull {
    pub fn new(shape: f64, scale: f64, origin: f64) -> Self {
        assert!(shape > 0.0 && shape.is_finite(), "shape must be positive");
        assert!(scale > 0.0 && scale.is_finite(), "scale must be positive");
        Self {
            shape,
            scale,
            origin,
        }
    }
}

impl Hazard for Weibull {
    fn parameters(&self) -> Vec<f64> {
        vec![self.shape, self.scale]
    }

    fn cumulative(&self, t: f64) -> f64 {
        ((t - self.origin).max(0.0) / self.scale).powf(self.shape)
    }

    fn inverse_cumulative(&self, xi: f64) -> f64 {
        self.origin + self.scale * xi.powf(1.0 / self.shape)
    }
}

/// Piecewise-constant rate, the hazard of a clock whose rate was set or
/// changed at known times. Segment `i` applies from `starts[i]` until the
/// next start; the last segment extends forever.
#[derive(Clone, Debug)]
pub struct PiecewiseExponential {
    starts: Vec<f64>,
    rates: Vec<f64>,
}

impl PiecewiseExponential {
    /// Build from `(start, rate)` pairs sorted by start ascending. The
    /// first start is the clock's enabling time. Rates may be zero; a
    /// trailing zero-rate segment makes the firing time infinite.
    pub fn new(segments: &[(f64, f64)]) -> Self {
        assert!(!segments.is_empty(), "at least one segment required");
        let mut starts = Vec::with_capacity(segments.len());
        let mut rates = Vec::with_capacity(segments.len());
        for &(start, rate) in segments {
            if let Some(&previous) = starts.last() {
                assert!(start > previous, "segment starts must be increasing");
            }
            assert!(rate >= 0.0 && rate.is_finite(), "rates must be nonnegative");
            starts.push(start);
            rates.push(rate);
        }
        Self { starts, rates }
    }

    /// Append a rate change at `start`, which must follow every existing
    /// segment. This is how a process records a modification.
    pub fn push_rate(&mut self, start: f64, rate: f64) {
        assert!(
            start > *self.starts.last().expect("segments are never empty"),
            "segment starts must be increasing"
        );
        assert!(rate >= 0.0 && rate.is_finite(), "rates must be nonnegative");
        self.starts.push(start);
        self.rates.push(rate);
    }

    fn segment_end(&self, idx: usize) -> f64 {
        self.starts.get(idx + 1).copied().unwrap_or(f64::INFINITY)
    }
}

impl Hazard for PiecewiseExponential {
    fn parameters(&self) -> Vec<f64> {
        // Most recent rate first; exponential-only samplers read [0].
        vec![*self.rates.last().expect("segments are never empty")]
    }

    fn cumulative(&self, t: f64) -> f64 {
        let mut acc = 0.0;
        for (idx, &rate) in self.rates.iter().enumerate() {
            let start = self.starts[idx];
            if t <= start {
                break;
            }
            let end = self.segment_end(idx).min(t);
            acc += rate * (end - start);
        }
        acc
    }

    fn inverse_cumulative(&self, xi: f64) -> f64 {
        let mut remaining = xi;
        for (idx, &rate) in self.rates.iter().enumerate() {
            let start = self.starts[idx];
            let end = self.segment_end(idx);
            if end.is_infinite() {
                return if rate > 0.0 {
                    start + remaining / rate
                } else {
                    f64::INFINITY
                };
            }
            let capacity = rate * (end - start);
            if rate > 0.0 && remaining <= capacity {
                return start + remaining / rate;
            }
            remaining -= capacity;
        }
        f64::INFINITY
    }
}

/// Dirac hazard: fires exactly at `at`; Λ steps to infinity there.
#[derive(Clone, Copy, Debug)]
pub struct Deterministic {
    at: f64,
}

impl Deterministic {
    pub fn new(at: f64) -> Self {
        assert!(at.is_finite(), "firing time must be finite");
        Self { at }
    }
}

impl Hazard for Deterministic {
    fn parameters(&self) -> Vec<f64> {
        vec![self.at]
    }

    fn cumulative(&self, t: f64) -> f64 {
        if t < self.at { 0.0 } else { f64::INFINITY }
    }

    fn inverse_cumulative(&self, _xi: f64) -> f64 {
        self.at
    }
}
