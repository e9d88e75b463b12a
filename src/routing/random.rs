//! Random number sources for the weighted split.
//!
//! The split draws one uniform number per request. The source is injected so
//! tests can substitute a seeded or scripted generator.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random draws, shareable across concurrent requests.
pub trait RandomSource: Send + Sync + std::fmt::Debug {
    /// Draw from the right-open interval `[low, high)`.
    fn uniform(&self, low: f64, high: f64) -> f64;
}

/// Per-thread OS-seeded generator. No locking; each worker thread draws from
/// its own state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        rand::thread_rng().gen_range(low..high)
    }
}

/// Deterministic generator for reproducible runs.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(low..high)
    }
}
