//! Seed management for portal runs
//!
//! A session holds one master seed and derives a fresh seed for every
//! calculate invocation, so repeated runs differ but a whole session can be
//! replayed from the master seed alone.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Master seed for a planner session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSeeds {
    pub master: u64,
}

impl RunSeeds {
    pub fn from_master(master: u64) -> Self {
        Self { master }
    }

    /// Seed for the `run`-th calculate invocation.
    pub fn for_run(&self, run: u64) -> u64 {
        derive_seed(self.master, "portals", run)
    }

    /// Generator for the `run`-th calculate invocation.
    pub fn rng_for_run(&self, run: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.for_run(run))
    }
}

impl Default for RunSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

impl std::fmt::Display for RunSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.master)
    }
}

/// Derive a sub-seed from a master seed, a purpose, and a run number.
fn derive_seed(master: u64, purpose: &str, run: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    purpose.hash(&mut hasher);
    run.hash(&mut hasher);
    hasher.finish()
}
