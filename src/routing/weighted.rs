//! Canary split between a primary and a secondary backend.
//!
//! # Design Decisions
//! - One independent Bernoulli trial per request; no state between requests
//! - No client-identity hashing, no stickiness
//! - A static policy never touches the random source

use std::sync::Arc;

use crate::routing::random::RandomSource;
use crate::upstream::Backend;

/// Percentage of traffic sent to the primary backend, always in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Weight(u8);

impl Weight {
    /// Clamp any integer into `0..=100`.
    pub fn clamped(percent: i64) -> Self {
        Weight(percent.clamp(0, 100) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

/// How a route picks its backend.
#[derive(Debug, Clone)]
pub enum SplitPolicy {
    /// Always the same backend.
    Static(Arc<Backend>),
    /// `weight` percent to `primary`, the rest to `secondary`.
    /// When `enabled` is false everything goes to `primary`.
    Weighted {
        primary: Arc<Backend>,
        secondary: Arc<Backend>,
        weight: Weight,
        enabled: bool,
    },
}

/// Resolves a policy to a backend for a single request.
#[derive(Debug, Clone)]
pub struct WeightedRouter {
    rng: Arc<dyn RandomSource>,
}

impl WeightedRouter {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }

    pub fn choose<'a>(&self, policy: &'a SplitPolicy) -> &'a Arc<Backend> {
        match policy {
            SplitPolicy::Static(backend) => backend,
            SplitPolicy::Weighted {
                primary,
                enabled: false,
                ..
            } => primary,
            SplitPolicy::Weighted {
                primary,
                secondary,
                weight,
                enabled: true,
            } => {
                let r = self.rng.uniform(0.0, 100.0);
                if r < f64::from(weight.percent()) {
                    primary
                } else {
                    secondary
                }
            }
        }
    }
}
