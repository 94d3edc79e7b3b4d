//! Local, non-cryptographic random generator.
//!
//! [`RandomGenerator`] is Bob Jenkins' small fast generator (JSF32). It is
//! seeded once per engine instance and never synchronised with anything;
//! effects are cosmetic and need no network-reproducible sequence. The
//! generator implements [`rand::RngCore`] and [`rand::SeedableRng`] so it
//! can drive any `rand` distribution as well.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::{Rng, RngCore, SeedableRng};

/// JSF32 state.
#[derive(Clone, Debug)]
pub struct RandomGenerator {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl RandomGenerator {
    /// Create a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self::from_u32_seed((seed ^ (seed >> 32)) as u32)
    }

    fn from_u32_seed(seed: u32) -> Self {
        let mut rng = Self {
            a: 0xf1ea_5eed,
            b: seed,
            c: seed,
            d: seed,
        };
        for _ in 0..20 {
            rng.step();
        }
        rng
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let e = self.a.wrapping_sub(self.b.rotate_left(27));
        self.a = self.b ^ self.c.rotate_left(17);
        self.b = self.c.wrapping_add(self.d);
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_float(&mut self) -> f32 {
        (self.step() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Uniform float in `[min, max)`.
    #[inline]
    pub fn next_float_range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_float()
    }

    /// Uniform integer in `[0, n)`; `0` when `n == 0`.
    pub fn next_bounded(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.random_range(0..n)
    }

    /// Returns `true` with probability `p` (values outside `[0, 1]` saturate).
    #[inline]
    pub fn try_with_chance(&mut self, p: f32) -> bool {
        self.next_float() < p
    }

    /// Uniformly distributed direction on the unit sphere.
    pub fn next_unit_vector(&mut self) -> Vec3 {
        let z = self.next_float_range(-1.0, 1.0);
        let phi = TAU * self.next_float();
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngCore for RandomGenerator {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.step() as u64;
        let lo = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for RandomGenerator {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::from_u32_seed(u32::from_le_bytes(seed))
    }
}
