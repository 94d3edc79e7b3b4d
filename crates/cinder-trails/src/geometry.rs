//! Poly trails and beams: pooled geometry owned by the trail manager.
//!
//! Both live in fixed-capacity pools and are evicted soonest-to-expire
//! first. While attached their expiry is `i64::MAX`, so an attached trail
//! is only evicted once every other one in the pool is attached too.

use cinder_core::color::ALPHA;
use cinder_core::{AppearanceRules, ContentFlags, MaterialId, PolySubmission, Rgba8, SceneSink};
use glam::Vec3;

// ── Parameters ─────────────────────────────────────────────────────

/// How a particle trail drops particles behind a moving entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleTrailParams {
    /// Appearance of the trail's flock.
    pub appearance: AppearanceRules,
    /// Distance travelled per dropped particle.
    pub drop_distance: f32,
    /// Most particles dropped by one touch.
    pub max_particles_per_drop: u32,
    /// Lifetime of every dropped particle, in milliseconds.
    pub particle_lifetime_ms: u32,
    /// Random outward speed of a dropped particle.
    pub speed: f32,
    /// Constant acceleration of dropped particles.
    pub accel: Vec3,
    /// Collision bounces of dropped particles.
    pub bounces: u8,
    /// Contents dropped particles collide with.
    pub collision_mask: ContentFlags,
}

impl Default for ParticleTrailParams {
    fn default() -> Self {
        Self {
            appearance: AppearanceRules::default(),
            drop_distance: 8.0,
            max_particles_per_drop: 8,
            particle_lifetime_ms: 600,
            speed: 10.0,
            accel: Vec3::ZERO,
            bounces: 0,
            collision_mask: ContentFlags::MASK_SOLID,
        }
    }
}

/// How a poly trail records and draws its points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolyTrailParams {
    /// Movement needed before a new point is recorded.
    pub min_point_distance: f32,
    /// Points kept; capped by the pool's point capacity.
    pub max_points: usize,
    /// How long a point stays once the trail lingers, in milliseconds.
    pub point_lifetime_ms: u32,
    /// Strip width.
    pub width: f32,
    /// Texture tile length along the strip.
    pub tile_length: f32,
    /// Strip material.
    pub material: MaterialId,
    /// Strip color at full opacity.
    pub color: Rgba8,
}

impl Default for PolyTrailParams {
    fn default() -> Self {
        Self {
            min_point_distance: 4.0,
            max_points: 32,
            point_lifetime_ms: 300,
            width: 6.0,
            tile_length: 32.0,
            material: MaterialId::default(),
            color: [255, 255, 255, 255],
        }
    }
}

/// How a beam is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamParams {
    /// Beam width.
    pub width: f32,
    /// Texture tile length along the beam.
    pub tile_length: f32,
    /// Beam material.
    pub material: MaterialId,
    /// Beam color at full opacity.
    pub color: Rgba8,
    /// How long the beam fades once it lingers, in milliseconds.
    pub fade_out_ms: u32,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            width: 4.0,
            tile_length: 0.0,
            material: MaterialId::default(),
            color: [255, 255, 255, 255],
            fade_out_ms: 200,
        }
    }
}

fn faded(color: Rgba8, remaining: f32) -> Rgba8 {
    let mut out = color;
    out[ALPHA] = (f32::from(color[ALPHA]) * remaining.clamp(0.0, 1.0)).round() as u8;
    out
}

// ── PolyTrail ──────────────────────────────────────────────────────

/// A polyline recorded from an entity's positions, oldest point first.
#[derive(Debug)]
pub struct PolyTrail {
    points: Vec<Vec3>,
    recorded_at: Vec<i64>,
    capacity: usize,
    params: PolyTrailParams,
    attached: bool,
    expires_at: i64,
}

impl PolyTrail {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            recorded_at: Vec::with_capacity(capacity),
            capacity,
            params: PolyTrailParams::default(),
            attached: false,
            expires_at: 0,
        }
    }

    pub(crate) fn reset(&mut self, params: &PolyTrailParams) {
        self.points.clear();
        self.recorded_at.clear();
        self.params = *params;
        self.attached = true;
        self.expires_at = i64::MAX;
    }

    /// Recorded points, oldest first.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Whether the trail is still fed by its entity.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// When the trail will be gone; `i64::MAX` while attached.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Record `origin` if it is far enough from the newest point.
    pub(crate) fn record(&mut self, origin: Vec3, current_time: i64) {
        if let Some(last) = self.points.last() {
            if last.distance(origin) < self.params.min_point_distance {
                return;
            }
        }
        let max = self.params.max_points.clamp(1, self.capacity.max(1));
        while self.points.len() >= max {
            self.points.remove(0);
            self.recorded_at.remove(0);
        }
        self.points.push(origin);
        self.recorded_at.push(current_time);
    }

    pub(crate) fn detach(&mut self) {
        self.attached = false;
        let lifetime = i64::from(self.params.point_lifetime_ms);
        self.expires_at = self.recorded_at.last().map_or(0, |t| t + lifetime);
    }

    /// Drop points older than their lifetime. Returns whether any remain.
    pub(crate) fn expire_points(&mut self, current_time: i64) -> bool {
        let lifetime = i64::from(self.params.point_lifetime_ms);
        let stale = self
            .recorded_at
            .iter()
            .take_while(|t| **t + lifetime <= current_time)
            .count();
        self.points.drain(..stale);
        self.recorded_at.drain(..stale);
        !self.points.is_empty()
    }

    /// Submit the strip. Attached trails draw at full opacity; lingering
    /// ones fade with the age of their newest point.
    pub(crate) fn submit(&self, scene: &mut dyn SceneSink, current_time: i64) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        let remaining = if self.attached {
            1.0
        } else {
            let lifetime = i64::from(self.params.point_lifetime_ms).max(1);
            (self.expires_at - current_time) as f32 / lifetime as f32
        };
        scene.add_poly(&PolySubmission {
            points: &self.points,
            width: self.params.width,
            tile_length: self.params.tile_length,
            material: self.params.material,
            color: faded(self.params.color, remaining),
        });
        true
    }
}

// ── Beam ───────────────────────────────────────────────────────────

/// A straight two-point beam.
#[derive(Debug)]
pub struct Beam {
    points: [Vec3; 2],
    params: BeamParams,
    fade_started_at: Option<i64>,
    expires_at: i64,
}

impl Beam {
    pub(crate) fn new() -> Self {
        Self {
            points: [Vec3::ZERO; 2],
            params: BeamParams::default(),
            fade_started_at: None,
            expires_at: 0,
        }
    }

    pub(crate) fn reset(&mut self, from: Vec3, to: Vec3, params: &BeamParams) {
        self.points = [from, to];
        self.params = *params;
        self.fade_started_at = None;
        self.expires_at = i64::MAX;
    }

    pub(crate) fn set_endpoints(&mut self, from: Vec3, to: Vec3) {
        self.points = [from, to];
    }

    /// Start and end point.
    pub fn endpoints(&self) -> [Vec3; 2] {
        self.points
    }

    /// Whether the beam is still driven by its entity.
    pub fn is_attached(&self) -> bool {
        self.fade_started_at.is_none()
    }

    /// When the beam will be gone; `i64::MAX` while attached.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub(crate) fn start_fading(&mut self, current_time: i64) {
        self.fade_started_at = Some(current_time);
        self.expires_at = current_time + i64::from(self.params.fade_out_ms);
    }

    pub(crate) fn submit(&self, scene: &mut dyn SceneSink, current_time: i64) -> bool {
        let remaining = match self.fade_started_at {
            None => 1.0,
            Some(start) => {
                let fade = i64::from(self.params.fade_out_ms).max(1);
                1.0 - (current_time - start) as f32 / fade as f32
            }
        };
        if remaining <= 0.0 {
            return false;
        }
        scene.add_poly(&PolySubmission {
            points: &self.points,
            width: self.params.width,
            tile_length: self.params.tile_length,
            material: self.params.material,
            color: faded(self.params.color, remaining),
        });
        true
    }
}
