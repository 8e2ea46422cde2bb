//! Random number streams consumed by the light transport code.

use lux_math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of numbers in `[0, 1)`.
///
/// Every (pixel, sample) pair gets its own reseeded stream so a render is
/// reproducible regardless of how work is scheduled across threads.
pub trait Sampler {
    /// Restart the stream for the given pixel and sample index.
    fn seed(&mut self, x: u32, y: u32, sample_index: u32);

    /// Next number in `[0, 1)`.
    fn next(&mut self) -> f32;

    fn next_2d(&mut self) -> Vec2 {
        let x = self.next();
        let y = self.next();
        Vec2::new(x, y)
    }
}

/// Uncorrelated pseudo-random sampler backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct IndependentSampler {
    base_seed: u64,
    rng: StdRng,
}

impl IndependentSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            base_seed: seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for IndependentSampler {
    fn seed(&mut self, x: u32, y: u32, sample_index: u32) {
        let mut h = splitmix64(self.base_seed);
        for v in [x, y, sample_index] {
            h = splitmix64(h ^ v as u64);
        }
        self.rng = StdRng::seed_from_u64(h);
    }

    fn next(&mut self) -> f32 {
        // gen::<f32>() is uniform in [0, 1)
        self.rng.gen::<f32>()
    }
}

/// SplitMix64 finaliser, used to decorrelate neighbouring seeds.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
