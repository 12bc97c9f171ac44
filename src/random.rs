//! Deterministic random streams.
//!
//! Every simulation owns one master `RandomSource` built from the configured
//! seed. Entities never share it: each fuel rod and neutron gets its own
//! sub-stream derived from the master seed and a stable identity, so a large
//! grid does not draw in lock-step and identical seeds replay identically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::{map_range, Vec2};

/// Seeded `ChaCha8Rng` with the draws the simulation needs.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream for the entity with the given identity.
    pub fn derive(&self, identity: u64) -> RandomSource {
        RandomSource::new(mix(self.seed, identity))
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform draw in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        map_range(self.unit(), 0.0, 1.0, min, max)
    }

    /// Bernoulli trial: true with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p.clamp(0.0, 1.0)
    }

    /// Random unit vector, each component drawn from `[-1, 1)` then normalised.
    pub fn direction(&mut self) -> Vec2 {
        loop {
            let candidate = Vec2::new(self.range(-1.0, 1.0), self.range(-1.0, 1.0));
            if let Some(dir) = candidate.try_normalize() {
                return dir;
            }
        }
    }
}

/// splitmix64 finaliser over the seed/identity pair.
fn mix(seed: u64, identity: u64) -> u64 {
    let mut z = seed ^ identity.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
