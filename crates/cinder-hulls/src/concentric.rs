//! Concentric hulls: nested layers growing radially (fire, blasts).
//!
//! All layers share the icosphere directions of the pool's level. Each
//! direction gets one obstacle distance, traced once at spawn out to the
//! farthest any layer could reach within the hull's lifetime:
//!
//! ```text
//! origin ──────────────► d[i] · max_radius
//!            ▲ hit
//!       limit[i] = |hit − origin|
//! ```
//!
//! After that no collision query is made. Layer `l` moves vertex `i` to
//! `origin + distance · d[i]`, where `distance` grows by
//! `speed · (1 − 1.5·dt) · dt` per step and is capped at
//! `limit[i] − final_offset(l)`.

use cinder_core::collision::trace_point;
use cinder_core::time::clamped_step_seconds;
use cinder_core::{
    advance_color_timeline, Aabb, ColorChangeState, ColorTimelineNode, CollisionWorld,
    ContentFlags, MaterialId, MeshPart, RandomGenerator, Rgba8,
};
use glam::Vec3;
use smallvec::SmallVec;

use crate::config::MAX_LAYERS;
use crate::topology::IcosphereLevel;

/// Spawn parameters of one layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerParams {
    /// Base outward speed.
    pub speed: f32,
    /// Largest random extra speed per vertex.
    pub max_speed_spike: f32,
    /// Extra speed for directions aligned with the hull's bias direction.
    pub bias_along_dir: f32,
    /// How far short of an obstacle this layer stops.
    pub final_offset: f32,
    /// Color every vertex of the layer starts with.
    pub initial_color: Rgba8,
    /// Color timeline of the layer.
    pub timeline: &'static [ColorTimelineNode],
    /// Material of the layer.
    pub material: MaterialId,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            speed: 100.0,
            max_speed_spike: 0.0,
            bias_along_dir: 0.0,
            final_offset: 0.0,
            initial_color: [255, 255, 255, 255],
            timeline: &[],
            material: MaterialId::default(),
        }
    }
}

/// Spawn parameters of a concentric hull.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConcentricHullParams {
    /// How long the hull lives, in milliseconds.
    pub lifetime_ms: u32,
    /// Direction favoured by `bias_along_dir`; need not be normalised.
    pub bias_direction: Vec3,
    /// Layers from innermost to outermost. Layers beyond the pool's
    /// layer count are ignored.
    pub layers: &'static [LayerParams],
    /// Contents that limit growth.
    pub collision_mask: ContentFlags,
}

impl Default for ConcentricHullParams {
    fn default() -> Self {
        Self {
            lifetime_ms: 1000,
            bias_direction: Vec3::ZERO,
            layers: &[],
            collision_mask: ContentFlags::MASK_SOLID,
        }
    }
}

impl ConcentricHullParams {
    /// Farthest any vertex of any layer can travel.
    pub fn max_radius(&self) -> f32 {
        let fastest = self
            .layers
            .iter()
            .map(|l| l.speed + l.max_speed_spike + l.bias_along_dir)
            .fold(0.0f32, f32::max);
        fastest * self.lifetime_ms as f32 * 0.001
    }
}

/// One concentric hull. Per-layer buffers are laid out layer after layer.
#[derive(Debug)]
pub struct ConcentricHull {
    num_vertices: usize,
    max_layers: usize,
    num_layers: usize,
    subdiv_level: usize,
    limits: Vec<f32>,
    positions: Vec<Vec3>,
    // (speed, distance so far)
    motion: Vec<(f32, f32)>,
    colors: Vec<Rgba8>,
    color_states: Vec<ColorChangeState>,
    params: ConcentricHullParams,
    origin: Vec3,
    spawn_time: i64,
    last_simulated_at: i64,
    bounds: Aabb,
}

impl ConcentricHull {
    pub(crate) fn with_level(level: &IcosphereLevel, subdiv_level: usize, max_layers: usize) -> Self {
        let n = level.num_vertices();
        let max_layers = max_layers.clamp(1, MAX_LAYERS);
        Self {
            num_vertices: n,
            max_layers,
            num_layers: 0,
            subdiv_level,
            limits: vec![0.0; n],
            positions: vec![Vec3::ZERO; n * max_layers],
            motion: vec![(0.0, 0.0); n * max_layers],
            colors: vec![[0; 4]; n * max_layers],
            color_states: vec![ColorChangeState::new(0); max_layers],
            params: ConcentricHullParams::default(),
            origin: Vec3::ZERO,
            spawn_time: 0,
            last_simulated_at: 0,
            bounds: Aabb::empty(),
        }
    }

    pub(crate) fn spawn(
        &mut self,
        world: &dyn CollisionWorld,
        level: &IcosphereLevel,
        origin: Vec3,
        params: &ConcentricHullParams,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) {
        self.params = *params;
        self.origin = origin;
        self.spawn_time = current_time;
        self.last_simulated_at = current_time;
        self.num_layers = params.layers.len().min(self.max_layers);
        self.bounds = Aabb::around(origin, 0.0);

        let n = self.num_vertices;
        let dirs = &level.vertices()[..n];
        let max_radius = params.max_radius();
        for (limit, dir) in self.limits.iter_mut().zip(dirs) {
            let trace = trace_point(world, origin, origin + *dir * max_radius, params.collision_mask);
            *limit = if trace.start_solid {
                0.0
            } else {
                (trace.end_pos - origin).length()
            };
        }

        let bias = params.bias_direction.normalize_or_zero();
        for (l, layer) in params.layers.iter().take(self.num_layers).enumerate() {
            self.color_states[l] = ColorChangeState::new(current_time);
            let span = l * n..(l + 1) * n;
            for ((motion, color), dir) in self.motion[span.clone()]
                .iter_mut()
                .zip(&mut self.colors[span.clone()])
                .zip(dirs)
            {
                let speed = layer.speed
                    + rng.next_float() * layer.max_speed_spike
                    + layer.bias_along_dir * dir.dot(bias).max(0.0);
                *motion = (speed, 0.0);
                *color = layer.initial_color;
            }
            self.positions[span].fill(origin);
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    /// Layers in use.
    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// Vertices per layer.
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Subdivision level the hull was built at.
    pub fn subdiv_level(&self) -> usize {
        self.subdiv_level
    }

    /// Obstacle distance along each direction, traced at spawn.
    pub fn limits(&self) -> &[f32] {
        &self.limits
    }

    /// Vertex positions of `layer`.
    pub fn layer_positions(&self, layer: usize) -> &[Vec3] {
        &self.positions[self.span(layer)]
    }

    /// Vertex colors of `layer`.
    pub fn layer_colors(&self, layer: usize) -> &[Rgba8] {
        &self.colors[self.span(layer)]
    }

    /// Distance travelled by vertex `vertex` of `layer`.
    pub fn distance(&self, layer: usize, vertex: usize) -> f32 {
        self.motion[self.span(layer)][vertex].1
    }

    /// Spawn point.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// When the hull was spawned.
    pub fn spawn_time(&self) -> i64 {
        self.spawn_time
    }

    /// Spawn parameters.
    pub fn params(&self) -> &ConcentricHullParams {
        &self.params
    }

    /// Bounds of all layers.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Whether the hull's lifetime has run out at `current_time`.
    pub fn is_expired(&self, current_time: i64) -> bool {
        self.spawn_time + i64::from(self.params.lifetime_ms) <= current_time
    }

    /// Normalised age.
    pub fn lifetime_fraction(&self, current_time: i64) -> f32 {
        let lifetime = i64::from(self.params.lifetime_ms).max(1) as f32;
        ((current_time - self.spawn_time) as f32 / lifetime).clamp(0.0, 1.0)
    }

    fn span(&self, layer: usize) -> std::ops::Range<usize> {
        let layer = layer.min(self.max_layers - 1);
        layer * self.num_vertices..(layer + 1) * self.num_vertices
    }

    // ── Simulation ─────────────────────────────────────────────

    pub(crate) fn simulate(&mut self, level: &IcosphereLevel, rng: &mut RandomGenerator, current_time: i64) {
        let dt = clamped_step_seconds(self.last_simulated_at, current_time);
        self.last_simulated_at = current_time;
        let decay = (1.0 - 1.5 * dt).max(0.0);
        let fraction = self.lifetime_fraction(current_time);

        let n = self.num_vertices;
        let dirs = &level.vertices()[..n];
        let layers = self.params.layers;
        let mut bounds = Aabb::around(self.origin, 0.0);
        for (l, layer) in layers.iter().take(self.num_layers).enumerate() {
            let span = l * n..(l + 1) * n;
            for (((motion, position), dir), limit) in self.motion[span.clone()]
                .iter_mut()
                .zip(&mut self.positions[span.clone()])
                .zip(dirs)
                .zip(&self.limits)
            {
                let cap = (limit - layer.final_offset).max(0.0);
                motion.1 = (motion.1 + motion.0 * decay * dt).min(cap);
                *position = self.origin + *dir * motion.1;
                bounds.add_point(*position);
            }
            advance_color_timeline(
                layer.timeline,
                &mut self.color_states[l],
                &mut self.colors[span],
                current_time,
                fraction,
                rng,
            );
        }
        self.bounds = bounds;
    }

    /// One mesh part per layer, drawn with `indices`.
    pub(crate) fn mesh_parts<'a>(&'a self, indices: &'a [u16]) -> SmallVec<[MeshPart<'a>; MAX_LAYERS]> {
        self.params
            .layers
            .iter()
            .take(self.num_layers)
            .enumerate()
            .map(|(l, layer)| MeshPart {
                positions: self.layer_positions(l),
                colors: self.layer_colors(l),
                indices,
                material: layer.material,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::IcosphereTopology;
    use cinder_core::SurfaceFlags;
    use cinder_test_utils::MockCollisionWorld;

    static TWO_LAYERS: [LayerParams; 2] = [
        LayerParams {
            speed: 100.0,
            max_speed_spike: 0.0,
            bias_along_dir: 0.0,
            final_offset: 0.0,
            initial_color: [255, 200, 100, 255],
            timeline: &[],
            material: MaterialId(1),
        },
        LayerParams {
            speed: 80.0,
            max_speed_spike: 20.0,
            bias_along_dir: 50.0,
            final_offset: 4.0,
            initial_color: [255, 120, 0, 255],
            timeline: &[],
            material: MaterialId(2),
        },
    ];

    fn params() -> ConcentricHullParams {
        ConcentricHullParams {
            lifetime_ms: 1000,
            bias_direction: Vec3::Z,
            layers: &TWO_LAYERS,
            ..Default::default()
        }
    }

    #[test]
    fn max_radius_uses_fastest_layer() {
        // max(100, 80 + 20 + 50) * 1 s
        assert!((params().max_radius() - 150.0).abs() < 1e-4);
    }

    #[test]
    fn open_space_limits_are_max_radius() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(5);
        let mut hull = ConcentricHull::with_level(topo.level(1), 1, 4);
        hull.spawn(&world, topo.level(1), Vec3::ZERO, &params(), &mut rng, 0);
        assert_eq!(hull.num_layers(), 2);
        assert!(hull.limits().iter().all(|l| (l - 150.0).abs() < 1e-3));
    }

    #[test]
    fn bias_speeds_up_aligned_directions() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(5);
        let level = topo.level(2);
        let mut hull = ConcentricHull::with_level(level, 2, 2);
        hull.spawn(&world, level, Vec3::ZERO, &params(), &mut rng, 0);
        for t in (16..=640).step_by(16) {
            hull.simulate(level, &mut rng, t);
        }
        let up = level.vertices().iter().position(|d| d.z > 0.99).unwrap();
        let down = level.vertices().iter().position(|d| d.z < -0.99).unwrap();
        assert!(hull.distance(1, up) > hull.distance(1, down) + 10.0);
        // The unbiased layer grows evenly.
        assert!((hull.distance(0, up) - hull.distance(0, down)).abs() < 1e-3);
    }

    #[test]
    fn layers_beyond_pool_are_ignored() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(5);
        let mut hull = ConcentricHull::with_level(topo.level(0), 0, 1);
        hull.spawn(&world, topo.level(0), Vec3::ZERO, &params(), &mut rng, 0);
        assert_eq!(hull.num_layers(), 1);
        assert_eq!(hull.mesh_parts(topo.level(0).indices()).len(), 1);
    }

    #[test]
    fn spawning_inside_solid_pins_every_vertex() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::with_floor(10.0);
        let mut rng = RandomGenerator::new(5);
        let level = topo.level(1);
        let mut hull = ConcentricHull::with_level(level, 1, 2);
        hull.spawn(&world, level, Vec3::ZERO, &params(), &mut rng, 0);
        hull.simulate(level, &mut rng, 33);
        assert!(hull.limits().iter().all(|l| *l == 0.0));
        assert!(hull.layer_positions(0).iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn wall_limits_only_facing_directions() {
        let topo = IcosphereTopology::new();
        let mut world = MockCollisionWorld::new();
        // Solid for x > 30.
        world.add_half_space(-Vec3::X, -30.0, ContentFlags::SOLID, SurfaceFlags::empty());
        let mut rng = RandomGenerator::new(5);
        let level = topo.level(2);
        let mut hull = ConcentricHull::with_level(level, 2, 2);
        hull.spawn(&world, level, Vec3::ZERO, &params(), &mut rng, 0);
        let toward = level.vertices().iter().position(|d| d.x > 0.99).unwrap();
        let away = level.vertices().iter().position(|d| d.x < -0.99).unwrap();
        assert!(hull.limits()[toward] < 30.0);
        assert!(hull.limits()[toward] > 29.0);
        assert!((hull.limits()[away] - 150.0).abs() < 1e-3);
    }
}
