//! Random-variate capability injected into generation and orbit placement.
//!
//! Nothing in the workspace reaches for a global generator: callers hand a
//! `RandomSource` to every routine that needs one, so a fixed seed reproduces
//! a whole population pass.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{LogNormal, Normal};

/// Source of random variates used by the population engine and orbit solver.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Normal sample with the given mean and standard deviation.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;

    /// Log-normal sample whose logarithm has mean `mu` and deviation `sigma`.
    fn log_normal(&mut self, mu: f64, sigma: f64) -> f64;

    /// Index drawn proportionally to `weights`, or `None` when no weight is positive.
    fn weighted_choice(&mut self, weights: &[f64]) -> Option<usize>;

    /// Uniform sample in `[low, high)`; returns `low` for an empty range.
    fn uniform_range(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.uniform()
    }

    /// A single Bernoulli trial succeeding with `probability`.
    fn chance(&mut self, probability: f64) -> bool {
        self.uniform() < probability
    }
}

/// `RandomSource` backed by the standard seedable generator.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic source for reproducible generation.
    pub fn seed_from(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    fn log_normal(&mut self, mu: f64, sigma: f64) -> f64 {
        match LogNormal::new(mu, sigma) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mu.exp(),
        }
    }

    fn weighted_choice(&mut self, weights: &[f64]) -> Option<usize> {
        let index = WeightedIndex::new(weights.iter().map(|w| w.max(0.0))).ok()?;
        Some(index.sample(&mut self.rng))
    }
}
