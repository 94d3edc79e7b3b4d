//! Per-frame effects metrics.
//!
//! [`FrameMetrics`] aggregates the stats every subsystem reports for one
//! call to [`EffectsSystem::simulate_frame_and_submit`](crate::EffectsSystem::simulate_frame_and_submit).
//! Evictions are never logged; they are only counted here.

use cinder_hulls::HullFrameStats;
use cinder_particles::ParticleFrameStats;
use cinder_trails::TrailFrameStats;

/// Counts collected during a single frame.
///
/// Fields documented as cumulative count since the system was built; all
/// others describe this frame only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Live flocks after simulation.
    pub live_flocks: usize,
    /// Live particles after simulation.
    pub live_particles: usize,
    /// Live hulls after simulation.
    pub live_hulls: usize,
    /// Trails still fed by their entity.
    pub attached_trails: usize,
    /// Trails fading out on their own.
    pub lingering_trails: usize,
    /// Live transient sprites.
    pub live_sprites: usize,
    /// Particles disposed because their lifetime ran out.
    pub particles_disposed_by_timeout: u64,
    /// Particles disposed on impact.
    pub particles_disposed_by_collision: u64,
    /// Flocks released after their last particle expired.
    pub flocks_released: u64,
    /// Hulls destroyed at the end of their lifetime.
    pub hulls_expired: u64,
    /// Trails moved from attached to lingering.
    pub trail_detaches: u64,
    /// Lingering trails that ended.
    pub trails_ended: u64,
    /// Cumulative flock evictions.
    pub flock_evictions: u64,
    /// Cumulative hull evictions.
    pub hull_evictions: u64,
    /// Cumulative poly trail and beam evictions.
    pub trail_evictions: u64,
    /// Cumulative sprite evictions.
    pub sprite_evictions: u64,
    /// Flocks handed to the scene.
    pub submitted_flocks: usize,
    /// Hull meshes handed to the scene.
    pub submitted_hulls: usize,
    /// Poly trails and beams handed to the scene.
    pub submitted_polys: usize,
    /// Sprites handed to the scene.
    pub submitted_sprites: usize,
}

impl FrameMetrics {
    pub(crate) fn record_particles(&mut self, stats: &ParticleFrameStats) {
        self.live_flocks = stats.live_flocks;
        self.live_particles = stats.live_particles;
        self.particles_disposed_by_timeout = stats.disposed_by_timeout;
        self.particles_disposed_by_collision = stats.disposed_by_collision;
        self.flocks_released = stats.flocks_released;
    }

    pub(crate) fn record_hulls(&mut self, stats: &HullFrameStats) {
        self.live_hulls = stats.live_hulls();
        self.hulls_expired = stats.expired;
    }

    pub(crate) fn record_trails(&mut self, stats: &TrailFrameStats) {
        self.attached_trails = stats.attached;
        self.lingering_trails = stats.lingering;
        self.trail_detaches = stats.detached;
        self.trails_ended = stats.ended;
        self.submitted_polys = stats.submitted;
    }

    /// Particles disposed this frame, whatever the cause.
    pub fn particles_disposed(&self) -> u64 {
        self.particles_disposed_by_timeout + self.particles_disposed_by_collision
    }

    /// Evictions over every pool since construction.
    pub fn total_evictions(&self) -> u64 {
        self.flock_evictions + self.hull_evictions + self.trail_evictions + self.sprite_evictions
    }
}
