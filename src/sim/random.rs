//! Random draws used by the simulator

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the three kinds of draw the simulator needs
///
/// Implementations must be cheap to call; the simulator draws several times
/// per interaction.
pub trait RandomSource {
    /// Sample from Normal(mean, std_dev)
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;

    /// Sample from Uniform[low, high]
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.uniform(0.0, 1.0) < p
    }
}

/// `RandomSource` over any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Reproducible stream for a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Fresh stream seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return mean;
        }
        // Box-Muller; u1 in (0, 1] keeps ln() finite
        let u1: f64 = 1.0 - self.rng.random::<f64>();
        let u2: f64 = self.rng.random();
        let z = (-2.0_f64 * u1.ln()).sqrt() * (2.0_f64 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }
}

/// Deterministic source returning the centre of every distribution
///
/// `chance(p)` is therefore true exactly when `p > 0.5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSource;

impl RandomSource for MeanSource {
    fn normal(&mut self, mean: f64, _std_dev: f64) -> f64 {
        mean
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }
}
