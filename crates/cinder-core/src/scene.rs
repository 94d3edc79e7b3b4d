//! Scene submission façade.
//!
//! Submission is one-way and fire-and-forget: engines hand borrowed
//! slices of their own buffers to the [`SceneSink`] at the end of each
//! frame and never read anything back. A sink that needs the data past
//! the call must copy it.

use glam::Vec3;

use crate::color::Rgba8;
use crate::id::MaterialId;
use crate::math::Aabb;
use crate::particle::{AppearanceRules, Particle};

/// Per-frame view information supplied by the renderer for LOD choice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewParams {
    /// Camera position.
    pub origin: Vec3,
    /// Tangent of half the horizontal field of view.
    pub tan_half_fov: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            // 90 degree field of view.
            tan_half_fov: 1.0,
        }
    }
}

/// One live flock's particles for this frame.
#[derive(Clone, Copy, Debug)]
pub struct ParticleSubmission<'a> {
    /// Bounds of all particle origins.
    pub bounds: Aabb,
    /// Shared appearance of the flock.
    pub appearance: &'a AppearanceRules,
    /// Live particles (unordered).
    pub particles: &'a [Particle],
    /// Current color of each particle, parallel to `particles`.
    pub colors: &'a [Rgba8],
}

/// One drawable part of an externally simulated mesh.
#[derive(Clone, Copy, Debug)]
pub struct MeshPart<'a> {
    /// Full-resolution vertex positions.
    pub positions: &'a [Vec3],
    /// Per-vertex colors, parallel to `positions`.
    pub colors: &'a [Rgba8],
    /// Triangle list of the chosen LOD, indexing into `positions`.
    pub indices: &'a [u16],
    /// Material of this part.
    pub material: MaterialId,
}

/// A polyline strip (trails) or a two-point quad (beams).
#[derive(Clone, Copy, Debug)]
pub struct PolySubmission<'a> {
    /// Points along the strip, oldest first.
    pub points: &'a [Vec3],
    /// Strip width in world units.
    pub width: f32,
    /// Length of one texture tile along the strip; `0` stretches once.
    pub tile_length: f32,
    /// Material of the strip.
    pub material: MaterialId,
    /// Color (alpha already faded by the caller).
    pub color: Rgba8,
}

/// A transient sprite entity (explosion flash and similar).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySubmission {
    /// Sprite material.
    pub material: MaterialId,
    /// World position.
    pub origin: Vec3,
    /// Sprite radius.
    pub radius: f32,
    /// Rotation around the view axis, in degrees.
    pub rotation: f32,
    /// Modulation color.
    pub color: Rgba8,
}

/// Receiver of everything the simulation draws.
pub trait SceneSink {
    /// Submit one flock of particles.
    fn add_particles(&mut self, submission: &ParticleSubmission<'_>);

    /// Submit a procedurally simulated mesh made of one or more parts.
    fn add_external_mesh(&mut self, mins: Vec3, maxs: Vec3, parts: &[MeshPart<'_>]);

    /// Submit a poly strip or beam.
    fn add_poly(&mut self, poly: &PolySubmission<'_>);

    /// Submit a dynamic light for this frame.
    fn add_light(&mut self, origin: Vec3, radius: f32, color: Vec3);

    /// Submit a transient entity for this frame.
    fn add_entity(&mut self, entity: &EntitySubmission);
}
