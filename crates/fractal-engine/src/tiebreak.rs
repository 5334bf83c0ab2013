//! Injectable randomness for tie-breaking.
//!
//! Ties among candidates at the maximum vote count are broken by uniform
//! random selection. The random source sits behind a trait so production
//! sessions draw from entropy while tests supply a seeded source and
//! assert exact outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Source of randomness for selecting among tied candidates.
pub trait TieBreaker: fmt::Debug + Send {
    /// Pick an index in `0..tied` uniformly. Callers guarantee `tied >= 1`.
    fn pick(&mut self, tied: usize) -> usize;
}

/// Entropy-seeded production tie-breaker.
#[derive(Debug)]
pub struct EntropyTieBreaker {
    rng: StdRng,
}

impl EntropyTieBreaker {
    /// Create a tie-breaker seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyTieBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl TieBreaker for EntropyTieBreaker {
    fn pick(&mut self, tied: usize) -> usize {
        self.rng.gen_range(0..tied)
    }
}

/// Deterministic tie-breaker for reproducible outcomes.
#[derive(Debug)]
pub struct SeededTieBreaker {
    rng: StdRng,
}

impl SeededTieBreaker {
    /// Create a tie-breaker with a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl TieBreaker for SeededTieBreaker {
    fn pick(&mut self, tied: usize) -> usize {
        self.rng.gen_range(0..tied)
    }
}
