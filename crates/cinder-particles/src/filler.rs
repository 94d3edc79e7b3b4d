//! Flock fillers: populate a fresh flock with particles.
//!
//! Two distributions are provided:
//!
//! - [`UniformFlockFiller`] picks directions from a fixed table of
//!   [`UNIT_SPHERE_SAMPLES`] evenly spread unit vectors.
//! - [`ConeFlockFiller`] samples directions inside a cone around an axis
//!   with the inverse-CDF method `z = min_z + (1 − min_z)·u`, `φ = 2π·v`,
//!   which is uniform over the spherical cap.

use std::f32::consts::{PI, TAU};
use std::sync::OnceLock;

use cinder_core::math::orthonormal_basis;
use cinder_core::{Particle, RandomGenerator};
use glam::Vec3;

use crate::flock::Flock;

/// Number of precomputed directions used by the uniform filler.
pub const UNIT_SPHERE_SAMPLES: usize = 162;

/// Evenly spread unit directions (Fibonacci sphere), built on first use.
pub fn unit_sphere_samples() -> &'static [Vec3; UNIT_SPHERE_SAMPLES] {
    static SAMPLES: OnceLock<[Vec3; UNIT_SPHERE_SAMPLES]> = OnceLock::new();
    SAMPLES.get_or_init(|| {
        let golden_angle = PI * (3.0 - 5.0f32.sqrt());
        let mut out = [Vec3::ZERO; UNIT_SPHERE_SAMPLES];
        for (i, v) in out.iter_mut().enumerate() {
            let z = 1.0 - 2.0 * (i as f32 + 0.5) / UNIT_SPHERE_SAMPLES as f32;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let phi = golden_angle * i as f32;
            *v = Vec3::new(r * phi.cos(), r * phi.sin(), z);
        }
        out
    })
}

/// What a fill produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillResult {
    /// Latest timeout among the new particles.
    pub max_timeout_at: i64,
    /// Number of particles written.
    pub count: usize,
}

/// Something that can populate a flock.
///
/// [`ParticleSystem`](crate::ParticleSystem) takes the returned
/// `max_timeout_at` as the flock's expiry, so a filler must report the
/// latest timeout it wrote.
pub trait FlockFiller {
    /// Replace the flock's particles with a new batch.
    fn fill(&self, flock: &mut Flock, rng: &mut RandomGenerator, current_time: i64) -> FillResult;
}

// ── Shared parameters ──────────────────────────────────────────────

/// Parameters common to every filler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillParams {
    /// Emission point.
    pub origin: Vec3,
    /// Added to `origin`, e.g. to lift impacts off a surface.
    pub offset: Vec3,
    /// Constant acceleration of every particle.
    pub accel: Vec3,
    /// Share of the flock capacity to fill, in `(0, 1]`.
    pub percentage: f32,
    /// Slowest emission speed.
    pub min_speed: f32,
    /// Fastest emission speed.
    pub max_speed: f32,
    /// Shortest lifetime in milliseconds.
    pub min_timeout_ms: u32,
    /// Longest lifetime in milliseconds.
    pub max_timeout_ms: u32,
    /// Fewest collision bounces.
    pub min_bounces: u8,
    /// Most collision bounces.
    pub max_bounces: u8,
}

impl Default for FillParams {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            offset: Vec3::ZERO,
            accel: Vec3::new(0.0, 0.0, -400.0),
            percentage: 1.0,
            min_speed: 100.0,
            max_speed: 200.0,
            min_timeout_ms: 300,
            max_timeout_ms: 700,
            min_bounces: 0,
            max_bounces: 0,
        }
    }
}

/// Float error tolerated before a fractional share rounds up to one more particle.
const FILL_SLACK: f32 = 1e-3;

impl FillParams {
    fn particle_count(&self, capacity: usize) -> usize {
        if capacity == 0 {
            return 0;
        }
        let exact = self.percentage.clamp(0.0, 1.0) * capacity as f32;
        let wanted = (exact - FILL_SLACK).ceil().max(0.0) as usize;
        wanted.clamp(1, capacity)
    }

    fn emit(
        &self,
        flock: &mut Flock,
        rng: &mut RandomGenerator,
        current_time: i64,
        dir: Vec3,
    ) -> Option<i64> {
        let timeout_ms = pick_u32(rng, self.min_timeout_ms, self.max_timeout_ms);
        let timeout_at = current_time + i64::from(timeout_ms);
        let mut p = Particle::new(self.origin + self.offset, current_time, timeout_at);
        p.velocity = dir * rng.next_float_range(self.min_speed, self.max_speed);
        p.accel = self.accel;
        p.bounces_left = pick_u32(rng, self.min_bounces.into(), self.max_bounces.into()) as u8;

        let appearance = flock.appearance;
        let palette_len = appearance.colors.len().min(u8::MAX as usize + 1) as u32;
        p.instance_color_index = rng.next_bounded(palette_len) as u8;
        p.instance_radius = 1.0 + appearance.radius_spread * rng.next_float();
        let color = match appearance.color_lifespan {
            Some(lifespan) => lifespan.color_at(0.0),
            None => appearance.base_color(&p),
        };
        flock.try_add_particle(p, color).then_some(timeout_at)
    }
}

fn pick_u32(rng: &mut RandomGenerator, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    min + rng.next_bounded(max - min + 1)
}

fn fill_with(
    params: &FillParams,
    flock: &mut Flock,
    rng: &mut RandomGenerator,
    current_time: i64,
    mut direction: impl FnMut(&mut RandomGenerator) -> Vec3,
) -> FillResult {
    flock.clear_particles();
    let count = params.particle_count(flock.capacity());
    let mut max_timeout_at = current_time;
    let mut written = 0;
    for _ in 0..count {
        let dir = direction(rng);
        if let Some(timeout_at) = params.emit(flock, rng, current_time, dir) {
            max_timeout_at = max_timeout_at.max(timeout_at);
            written += 1;
        }
    }
    flock.finish_fill(max_timeout_at);
    FillResult {
        max_timeout_at,
        count: written,
    }
}

// ── Uniform ────────────────────────────────────────────────────────

/// Particles flying out in every direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniformFlockFiller {
    /// Common parameters.
    pub params: FillParams,
}

impl FlockFiller for UniformFlockFiller {
    fn fill(&self, flock: &mut Flock, rng: &mut RandomGenerator, current_time: i64) -> FillResult {
        let samples = unit_sphere_samples();
        fill_with(&self.params, flock, rng, current_time, |rng| {
            samples[rng.next_bounded(UNIT_SPHERE_SAMPLES as u32) as usize]
        })
    }
}

// ── Cone ───────────────────────────────────────────────────────────

/// Particles flying out inside a cone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConeFlockFiller {
    /// Common parameters.
    pub params: FillParams,
    /// Cone axis; need not be normalised.
    pub axis: Vec3,
    /// Half-angle of the cone in degrees.
    pub angle_degrees: f32,
}

impl Default for ConeFlockFiller {
    fn default() -> Self {
        Self {
            params: FillParams::default(),
            axis: Vec3::Z,
            angle_degrees: 30.0,
        }
    }
}

impl FlockFiller for ConeFlockFiller {
    fn fill(&self, flock: &mut Flock, rng: &mut RandomGenerator, current_time: i64) -> FillResult {
        let axis = self.axis.try_normalize().unwrap_or(Vec3::Z);
        let (right, up) = orthonormal_basis(axis);
        let min_z = self.angle_degrees.clamp(0.0, 180.0).to_radians().cos();
        fill_with(&self.params, flock, rng, current_time, |rng| {
            let z = min_z + (1.0 - min_z) * rng.next_float();
            let phi = TAU * rng.next_float();
            let r = (1.0 - z * z).max(0.0).sqrt();
            right * (r * phi.cos()) + up * (r * phi.sin()) + axis * z
        })
    }
}
