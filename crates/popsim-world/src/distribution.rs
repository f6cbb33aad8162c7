//! Stochastic samplers consumed by the life-event logic.
//!
//! Every sampler owns its generator, so each one is an independent stream
//! whose state persists across calls. Streams are only reproducible when the
//! generator was seeded explicitly.

use popsim_core::{Error, Result};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal as NormalDist, Poisson as PoissonDist};

/// A source of one number per call.
pub trait Sampler {
    fn sample(&mut self) -> f64;
}

/// Uniform over [0, 1)
pub struct ContinuousUniform {
    rng: ChaCha8Rng,
}

impl ContinuousUniform {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }
}

impl Sampler for ContinuousUniform {
    fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Poisson with an integer rate; yields non-negative whole numbers.
pub struct Poisson {
    dist: PoissonDist<f64>,
    rng: ChaCha8Rng,
}

impl Poisson {
    pub fn new(lambda: u32, rng: ChaCha8Rng) -> Result<Self> {
        if lambda == 0 {
            return Err(Error::Validation("Poisson rate must be positive".to_string()));
        }
        let dist = PoissonDist::new(lambda as f64)
            .map_err(|e| Error::Validation(format!("Invalid Poisson rate {}: {}", lambda, e)))?;
        Ok(Self { dist, rng })
    }
}

impl Sampler for Poisson {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Normal with mean and standard deviation. Samples may be negative.
pub struct Normal {
    dist: NormalDist<f64>,
    rng: ChaCha8Rng,
}

impl Normal {
    pub fn new(mean: f64, std_dev: f64, rng: ChaCha8Rng) -> Result<Self> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
            return Err(Error::Validation(format!(
                "Invalid normal parameters: mean={}, std_dev={}",
                mean, std_dev
            )));
        }
        let dist = NormalDist::new(mean, std_dev)
            .map_err(|e| Error::Validation(format!("Invalid normal parameters: {}", e)))?;
        Ok(Self { dist, rng })
    }
}

impl Sampler for Normal {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Exponential with a rate parameter (mean `1 / lambda`).
pub struct Exponential {
    dist: Exp<f64>,
    rng: ChaCha8Rng,
}

impl Exponential {
    pub fn new(lambda: f64, rng: ChaCha8Rng) -> Result<Self> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(Error::Validation(format!(
                "Exponential rate must be positive and finite, got {}",
                lambda
            )));
        }
        let dist = Exp::new(lambda)
            .map_err(|e| Error::Validation(format!("Invalid exponential rate: {}", e)))?;
        Ok(Self { dist, rng })
    }
}

impl Sampler for Exponential {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Always returns the same value. Used for replaying stubbed scenarios.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub f64);

impl Sampler for Fixed {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Returns a fixed sequence of values, wrapping around when exhausted.
#[derive(Debug, Clone)]
pub struct Scripted {
    values: Vec<f64>,
    cursor: usize,
}

impl Scripted {
    pub fn new(values: impl Into<Vec<f64>>) -> Result<Self> {
        let values = values.into();
        if values.is_empty() {
            return Err(Error::Validation("Scripted sampler needs at least one value".to_string()));
        }
        Ok(Self { values, cursor: 0 })
    }

    /// Number of samples drawn so far
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl Sampler for Scripted {
    fn sample(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
