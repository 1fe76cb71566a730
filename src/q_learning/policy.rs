//! Boltzmann (softmax) action selection over a Q-table row.
//!
//! Weights are `exp(t * (Q_i - max Q))`: subtracting the row maximum keeps
//! the exponent non-positive, so large values cannot overflow. A temperature
//! of zero gives the uniform policy and larger temperatures concentrate mass on
//! the best action.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{Result, error::Error, q_learning::QTable};

/// Softmax probabilities for one row of action values.
///
/// The result always sums to 1 for a finite, non-empty row.
pub fn probabilities(row: &[f64], temperature: f64) -> Vec<f64> {
    if row.is_empty() {
        return Vec::new();
    }
    let max_q = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = row
        .iter()
        .map(|q| (temperature * (q - max_q)).exp())
        .collect();
    let denominator: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / denominator).collect()
}

/// Inverse-CDF sampling: smallest index whose cumulative probability exceeds `u`.
///
/// Rounding can leave the total just below `u`; the last index is returned then.
pub fn sample_index(probabilities: &[f64], u: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if cumulative > u {
            return index;
        }
    }
    probabilities.len().saturating_sub(1)
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

pub(crate) fn validate_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature >= 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!(
            "temperature must be finite and non-negative, got {temperature}"
        )))
    }
}

/// Temperature-scaled probabilistic policy with its own random source.
#[derive(Debug, Clone)]
pub struct BoltzmannPolicy {
    temperature: f64,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl BoltzmannPolicy {
    pub fn new(temperature: f64) -> Result<Self> {
        validate_temperature(temperature)?;
        Ok(Self {
            temperature,
            rng: build_rng(None),
            rng_seed: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Restart the random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// Action distribution for `state` under the current temperature.
    pub fn distribution(&self, table: &QTable, state: usize) -> Result<Vec<f64>> {
        Ok(probabilities(table.row(state)?, self.temperature))
    }

    /// Draw an action index for `state`.
    pub fn select(&mut self, table: &QTable, state: usize) -> Result<usize> {
        let probs = self.distribution(table, state)?;
        let u: f64 = self.rng.random();
        Ok(sample_index(&probs, u))
    }
}
