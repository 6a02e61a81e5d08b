//! Inter-trial delay generation
//!
//! Delays only need a uniform spread, not real randomness, so the engine is
//! seeded with a fixed constant and every run with the same settings sleeps
//! through exactly the same sequence.

use rand::distr::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use thiserror::Error;

/// Seed used for every measurement run
pub const DEFAULT_SEED: u64 = 30378;

/// Error type for delay generation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DelayError {
    /// Lower bound is above the upper bound
    #[error("delay minimum {min}us is greater than maximum {max}us")]
    InvertedRange { min: u64, max: u64 },
}

/// Generate `count` delays drawn uniformly from `[min_us, max_us]` microseconds.
pub fn generate(count: usize, min_us: u64, max_us: u64, seed: u64) -> Result<Vec<Duration>, DelayError> {
    if min_us > max_us {
        return Err(DelayError::InvertedRange {
            min: min_us,
            max: max_us,
        });
    }

    let dist = Uniform::new_inclusive(min_us, max_us).map_err(|_| DelayError::InvertedRange {
        min: min_us,
        max: max_us,
    })?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    Ok((0..count)
        .map(|_| Duration::from_micros(dist.sample(&mut rng)))
        .collect())
}
