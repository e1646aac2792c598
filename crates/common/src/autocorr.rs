//! Autocorrelated stochastic time-series generation and the smoothstep
//! curve used by the rotor speed model. Grounded in
//! `datagen/datagen/utils.py`'s `Autocorr` class and `smooth_step` function:
//! each step draws a Beta-distributed blend weight `a`, samples a fresh
//! value `x0` from the underlying distribution, and blends it with the
//! previous output, producing a smooth but non-stationary signal.

use rand::rngs::StdRng;
use rand_distr::{Beta, Distribution};

/// Default Beta shape parameters, matching `datagen/datagen/utils.py`'s
/// `Autocorr.__init__` defaults (`alpha=2., beta=20.`).
pub const DEFAULT_ALPHA: f64 = 2.0;
pub const DEFAULT_BETA: f64 = 20.0;

/// A reified autocorrelation source: a stateful object with a `next()`
/// method, replacing the original's lazy-generator-pipeline composition
/// (`make_*_iter`) with explicit state and an explicit call, per the
/// design notes on reifying generator-expression pipelines.
pub struct Autocorr<F>
where
    F: FnMut(&mut StdRng, f64) -> f64,
{
    dist: F,
    alpha: f64,
    beta: f64,
    offset: f64,
    increment: f64,
    residual: f64,
}

impl<F> Autocorr<F>
where
    F: FnMut(&mut StdRng, f64) -> f64,
{
    /// `dist` maps `(rng, offset)` to a fresh sample; `increment` is the
    /// per-tick advance of `offset` (typically `1 / ticks_per_period`).
    pub fn new(rng: &mut StdRng, mut dist: F, alpha: f64, beta: f64, increment: f64) -> Self {
        let offset = 0.0;
        let residual = dist(rng, offset);
        Autocorr {
            dist,
            alpha,
            beta,
            offset: offset + increment,
            increment,
            residual,
        }
    }

    pub fn with_defaults(rng: &mut StdRng, dist: F, increment: f64) -> Self {
        Self::new(rng, dist, DEFAULT_ALPHA, DEFAULT_BETA, increment)
    }

    /// Advances the generator and returns the next sample.
    pub fn next(&mut self, rng: &mut StdRng) -> f64 {
        let beta_dist = Beta::new(self.alpha, self.beta).expect("alpha and beta must be positive");
        let a: f64 = beta_dist.sample(rng);
        let x0 = (self.dist)(rng, self.offset);
        let x = a * x0 + (1.0 - a) * self.residual;
        self.residual = x;
        self.offset += self.increment;
        x
    }
}

/// Classic Hermite smoothstep: 0 below `offset`, 1 above `offset + width`,
/// cubic interpolation in between. <https://en.wikipedia.org/wiki/Smoothstep>
pub fn smooth_step(x: f64, offset: f64, width: f64) -> f64 {
    if x < offset {
        return 0.0;
    }
    if x > offset + width {
        return 1.0;
    }
    let t = (x - offset) / width;
    3.0 * t.powi(2) - 2.0 * t.powi(3)
}
