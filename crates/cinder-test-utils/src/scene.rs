//! A scene sink that keeps owned copies of everything submitted.

use cinder_core::{
    Aabb, EntitySubmission, MaterialId, MeshPart, ParticleSubmission, PolySubmission, Rgba8,
    SceneSink,
};
use glam::Vec3;

/// Owned copy of one particle submission.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedParticles {
    /// Bounds the flock reported.
    pub bounds: Aabb,
    /// Material of the flock's appearance.
    pub material: MaterialId,
    /// One origin per particle.
    pub origins: Vec<Vec3>,
    /// One color per particle, parallel to `origins`.
    pub colors: Vec<Rgba8>,
}

/// Owned summary of one mesh part.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedMeshPart {
    /// Vertices in the part.
    pub vertex_count: usize,
    /// Indices in the part.
    pub index_count: usize,
    /// Material the part is drawn with.
    pub material: MaterialId,
    /// Per-vertex colors.
    pub colors: Vec<Rgba8>,
}

/// Owned copy of one mesh submission.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedMesh {
    /// Lower corner of the mesh bounds.
    pub mins: Vec3,
    /// Upper corner of the mesh bounds.
    pub maxs: Vec3,
    /// Parts in submission order.
    pub parts: Vec<RecordedMeshPart>,
}

/// Owned copy of one polyline submission.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedPoly {
    /// Polyline points, oldest first.
    pub points: Vec<Vec3>,
    /// Strip width in world units.
    pub width: f32,
    /// Material the strip is drawn with.
    pub material: MaterialId,
    /// Strip color.
    pub color: Rgba8,
}

/// Records every submission made during a frame.
#[derive(Clone, Debug, Default)]
pub struct RecordingScene {
    /// Particle submissions.
    pub particles: Vec<RecordedParticles>,
    /// Mesh submissions.
    pub meshes: Vec<RecordedMesh>,
    /// Polyline submissions.
    pub polys: Vec<RecordedPoly>,
    /// Lights as `(origin, radius, color)`.
    pub lights: Vec<(Vec3, f32, Vec3)>,
    /// Sprite entity submissions.
    pub entities: Vec<EntitySubmission>,
}

impl RecordingScene {
    /// A scene with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.meshes.clear();
        self.polys.clear();
        self.lights.clear();
        self.entities.clear();
    }

    /// Total particles across all particle submissions.
    pub fn particle_count(&self) -> usize {
        self.particles.iter().map(|p| p.origins.len()).sum()
    }

    /// Whether nothing at all was submitted.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
            && self.meshes.is_empty()
            && self.polys.is_empty()
            && self.lights.is_empty()
            && self.entities.is_empty()
    }
}

impl SceneSink for RecordingScene {
    fn add_particles(&mut self, submission: &ParticleSubmission<'_>) {
        self.particles.push(RecordedParticles {
            bounds: submission.bounds,
            material: submission.appearance.material,
            origins: submission.particles.iter().map(|p| p.origin).collect(),
            colors: submission.colors.to_vec(),
        });
    }

    fn add_external_mesh(&mut self, mins: Vec3, maxs: Vec3, parts: &[MeshPart<'_>]) {
        self.meshes.push(RecordedMesh {
            mins,
            maxs,
            parts: parts
                .iter()
                .map(|p| RecordedMeshPart {
                    vertex_count: p.positions.len(),
                    index_count: p.indices.len(),
                    material: p.material,
                    colors: p.colors.to_vec(),
                })
                .collect(),
        });
    }

    fn add_poly(&mut self, poly: &PolySubmission<'_>) {
        self.polys.push(RecordedPoly {
            points: poly.points.to_vec(),
            width: poly.width,
            material: poly.material,
            color: poly.color,
        });
    }

    fn add_light(&mut self, origin: Vec3, radius: f32, color: Vec3) {
        self.lights.push((origin, radius, color));
    }

    fn add_entity(&mut self, entity: &EntitySubmission) {
        self.entities.push(*entity);
    }
}
