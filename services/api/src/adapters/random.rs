//! services/api/src/adapters/random.rs
//!
//! This module contains the randomness adapters, implementing the
//! `RandomSource` port from the `core` crate. Production uses the thread
//! rng; the seeded adapter makes the simulated control flow reproducible.

use docqa_core::ports::RandomSource;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//=========================================================================================
// ThreadRngSource
//=========================================================================================

/// The production randomness source, backed by the thread-local rng.
#[derive(Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick(&self, lo: u64, hi: u64) -> u64 {
        rand::rng().random_range(lo..=hi)
    }

    fn chance(&self, probability: f64) -> bool {
        rand::rng().random_bool(probability.clamp(0.0, 1.0))
    }
}

//=========================================================================================
// SeededSource
//=========================================================================================

/// A deterministic randomness source for tests and reproducible runs.
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededSource {
    fn pick(&self, lo: u64, hi: u64) -> u64 {
        self.rng.lock().random_range(lo..=hi)
    }

    fn chance(&self, probability: f64) -> bool {
        self.rng.lock().random_bool(probability.clamp(0.0, 1.0))
    }
}
