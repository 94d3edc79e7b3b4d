//! Particle data and per-flock appearance rules.
//!
//! These types are shared by the particle engine (which mutates them), the
//! trail manager (which appends to them), and the scene façade (which
//! receives them by reference at submission time).

use glam::Vec3;

use crate::color::{ColorLifespan, Rgba8};
use crate::id::MaterialId;
use crate::timeline::ColorTimelineNode;

/// A point-like simulated entity owned by exactly one flock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Current position.
    pub origin: Vec3,
    /// Position at the start of the last simulated step.
    pub old_origin: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Constant acceleration (gravity, buoyancy) in units per second².
    pub accel: Vec3,
    /// When the particle was emitted.
    pub spawn_time: i64,
    /// Absolute expiry time.
    pub timeout_at: i64,
    /// Remaining collision bounces before the particle is disposed on impact.
    pub bounces_left: u8,
    /// Index into [`AppearanceRules::colors`].
    pub instance_color_index: u8,
    /// Per-instance radius multiplier.
    pub instance_radius: f32,
    /// Set once the color timeline has dropped or replaced this particle's
    /// color; a lifespan may then only lower its alpha.
    pub timeline_touched: bool,
}

impl Particle {
    /// A resting particle at `origin` that lives from `spawn_time` to `timeout_at`.
    pub fn new(origin: Vec3, spawn_time: i64, timeout_at: i64) -> Self {
        Self {
            origin,
            old_origin: origin,
            velocity: Vec3::ZERO,
            accel: Vec3::ZERO,
            spawn_time,
            timeout_at,
            bounces_left: 0,
            instance_color_index: 0,
            instance_radius: 1.0,
            timeline_touched: false,
        }
    }

    /// Normalised age in `[0, 1]`.
    pub fn lifetime_fraction(&self, current_time: i64) -> f32 {
        let lifetime = (self.timeout_at - self.spawn_time).max(1) as f32;
        ((current_time - self.spawn_time) as f32 / lifetime).clamp(0.0, 1.0)
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0, 0)
    }
}

/// How particles of a flock are drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleKind {
    /// Camera-facing quad.
    Sprite,
    /// Quad stretched along the velocity.
    Spark {
        /// Length of the stretched quad in world units.
        length: f32,
    },
}

/// A light attached to a flock, emitted at the particle centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRules {
    /// Radius at spawn; fades linearly to zero over the flock lifetime.
    pub radius: f32,
    /// Linear RGB color.
    pub color: Vec3,
}

/// Appearance shared by every particle of one flock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppearanceRules {
    /// Material handed to the renderer.
    pub material: MaterialId,
    /// Palette particles pick their base color from.
    pub colors: &'static [Rgba8],
    /// Optional lifetime curve replacing the base color every frame.
    pub color_lifespan: Option<ColorLifespan>,
    /// Optional drop/replace timeline applied on top.
    pub timeline: Option<&'static [ColorTimelineNode]>,
    /// Drawing primitive.
    pub kind: ParticleKind,
    /// Base particle radius.
    pub radius: f32,
    /// Random spread added to the per-instance radius multiplier.
    pub radius_spread: f32,
    /// Optional dynamic light.
    pub light: Option<LightRules>,
}

/// Fallback palette: opaque white.
pub static WHITE_PALETTE: [Rgba8; 1] = [[255, 255, 255, 255]];

impl Default for AppearanceRules {
    fn default() -> Self {
        Self {
            material: MaterialId::default(),
            colors: &WHITE_PALETTE,
            color_lifespan: None,
            timeline: None,
            kind: ParticleKind::Sprite,
            radius: 1.0,
            radius_spread: 0.0,
            light: None,
        }
    }
}

impl AppearanceRules {
    /// Base color of a particle before lifespan/timeline rules.
    pub fn base_color(&self, particle: &Particle) -> Rgba8 {
        if self.colors.is_empty() {
            return WHITE_PALETTE[0];
        }
        self.colors[particle.instance_color_index as usize % self.colors.len()]
    }
}
