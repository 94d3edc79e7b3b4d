//! Regular hulls: one closed, collision-deformed surface (smoke, shockwaves).
//!
//! Every vertex carries two velocities. The burst velocity is the initial
//! outward push and decays by `1 − 1.5·dt` per step. The force velocity
//! accumulates a crude fluid field computed from last frame's shape of the
//! hull: buoyancy interpolated by height inside the hull, and horizontal
//! expansion scaled by the distance from the hull's vertical axis.
//!
//! Positions are double-buffered. Each step reads the old buffer, writes
//! the new one, then clips every vertex's old → new move against one
//! batched shape list:
//!
//! ```text
//! clear                               → commit, fold into field stats
//! blocked, move not along the normal  → try a one-step slide
//! otherwise / slide blocked           → clamp at contact + offset, alpha 0
//! ```
//!
//! When free vertices are a minority, each one keeps only part of its
//! move, more when its neighbours are free too, so that a hull pressed
//! against walls does not grow spikes through the gaps.

use cinder_arena::ScratchLease;
use cinder_core::color::ALPHA;
use cinder_core::time::clamped_step_seconds;
use cinder_core::{
    advance_color_timeline, Aabb, ColorChangeState, ColorTimelineNode, CollisionWorld,
    ContentFlags, MaterialId, RandomGenerator, Rgba8, ShapeList, Trace,
};
use glam::{Vec2, Vec3};

use crate::config::HullTuning;
use crate::topology::{IcosphereLevel, NUM_NEIGHBOURS};

const MIN_MOVE: f32 = 1e-4;

/// Spawn parameters of a regular hull.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegularHullParams {
    /// Initial outward speed of every vertex.
    pub speed: f32,
    /// Chance that a vertex gets an extra random speed spike.
    pub speed_spike_chance: f32,
    /// Largest extra speed of a spiked vertex.
    pub max_speed_spike: f32,
    /// How long the hull lives, in milliseconds.
    pub lifetime_ms: u32,
    /// Color every vertex starts with.
    pub initial_color: Rgba8,
    /// Color timeline driven over the vertex colors.
    pub timeline: &'static [ColorTimelineNode],
    /// Vertical acceleration at the bottom of the hull.
    pub archimedes_bottom_accel: f32,
    /// Vertical acceleration at the top of the hull.
    pub archimedes_top_accel: f32,
    /// Horizontal expansion acceleration at the bottom.
    pub xy_expansion_bottom_accel: f32,
    /// Horizontal expansion acceleration at the top.
    pub xy_expansion_top_accel: f32,
    /// Material handed to the renderer.
    pub material: MaterialId,
    /// Contents the hull is deformed by.
    pub collision_mask: ContentFlags,
}

impl Default for RegularHullParams {
    fn default() -> Self {
        Self {
            speed: 100.0,
            speed_spike_chance: 0.0,
            max_speed_spike: 0.0,
            lifetime_ms: 1000,
            initial_color: [255, 255, 255, 255],
            timeline: &[],
            archimedes_bottom_accel: 0.0,
            archimedes_top_accel: 0.0,
            xy_expansion_bottom_accel: 0.0,
            xy_expansion_top_accel: 0.0,
            material: MaterialId::default(),
            collision_mask: ContentFlags::MASK_SOLID,
        }
    }
}

/// Running shape statistics of the last frame, feeding the force field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldStats {
    /// Lowest free vertex.
    pub min_z_last_frame: f32,
    /// Highest free vertex.
    pub max_z_last_frame: f32,
    /// Mean x of free vertices.
    pub avg_x_last_frame: f32,
    /// Mean y of free vertices.
    pub avg_y_last_frame: f32,
    /// Largest horizontal distance of a free vertex from the mean.
    pub max_xy_dist_last_frame: f32,
}

impl FieldStats {
    fn at(origin: Vec3) -> Self {
        Self {
            min_z_last_frame: origin.z,
            max_z_last_frame: origin.z,
            avg_x_last_frame: origin.x,
            avg_y_last_frame: origin.y,
            max_xy_dist_last_frame: 0.0,
        }
    }

    fn force_at(&self, p: Vec3, params: &RegularHullParams) -> Vec3 {
        let z_span = self.max_z_last_frame - self.min_z_last_frame;
        let z_frac = if z_span > MIN_MOVE {
            ((p.z - self.min_z_last_frame) / z_span).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let buoyancy = lerp(params.archimedes_bottom_accel, params.archimedes_top_accel, z_frac);

        let xy = Vec2::new(p.x - self.avg_x_last_frame, p.y - self.avg_y_last_frame);
        let dist = xy.length();
        let mut force = Vec3::new(0.0, 0.0, buoyancy);
        if dist > MIN_MOVE && self.max_xy_dist_last_frame > MIN_MOVE {
            let dist_frac = (dist / self.max_xy_dist_last_frame).min(1.0);
            let expansion = lerp(params.xy_expansion_bottom_accel, params.xy_expansion_top_accel, z_frac);
            let dir = xy / dist;
            force.x += dir.x * expansion * dist_frac;
            force.y += dir.y * expansion * dist_frac;
        }
        force
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Default)]
struct StatsAccumulator {
    count: usize,
    min_z: f32,
    max_z: f32,
    sum_x: f32,
    sum_y: f32,
}

impl StatsAccumulator {
    fn add(&mut self, p: Vec3) {
        if self.count == 0 {
            self.min_z = p.z;
            self.max_z = p.z;
        } else {
            self.min_z = self.min_z.min(p.z);
            self.max_z = self.max_z.max(p.z);
        }
        self.sum_x += p.x;
        self.sum_y += p.y;
        self.count += 1;
    }
}

/// One regular hull. Buffers are sized once for the pool's level.
#[derive(Debug)]
pub struct RegularHull {
    positions: [Vec<Vec3>; 2],
    current: usize,
    burst_velocity: Vec<Vec3>,
    force_velocity: Vec<Vec3>,
    colors: Vec<Rgba8>,
    contacting: Vec<bool>,
    subdiv_level: usize,
    params: RegularHullParams,
    origin: Vec3,
    spawn_time: i64,
    last_simulated_at: i64,
    color_state: ColorChangeState,
    stats: FieldStats,
    bounds: Aabb,
    shape_list: Option<ScratchLease<ShapeList>>,
}

impl RegularHull {
    pub(crate) fn with_level(level: &IcosphereLevel, subdiv_level: usize) -> Self {
        let n = level.num_vertices();
        Self {
            positions: [vec![Vec3::ZERO; n], vec![Vec3::ZERO; n]],
            current: 0,
            burst_velocity: vec![Vec3::ZERO; n],
            force_velocity: vec![Vec3::ZERO; n],
            colors: vec![[0; 4]; n],
            contacting: vec![false; n],
            subdiv_level,
            params: RegularHullParams::default(),
            origin: Vec3::ZERO,
            spawn_time: 0,
            last_simulated_at: 0,
            color_state: ColorChangeState::new(0),
            stats: FieldStats::at(Vec3::ZERO),
            bounds: Aabb::empty(),
            shape_list: None,
        }
    }

    pub(crate) fn spawn(
        &mut self,
        level: &IcosphereLevel,
        origin: Vec3,
        params: &RegularHullParams,
        rng: &mut RandomGenerator,
        current_time: i64,
        shape_list: Option<ScratchLease<ShapeList>>,
    ) {
        self.params = *params;
        self.origin = origin;
        self.spawn_time = current_time;
        self.last_simulated_at = current_time;
        self.color_state = ColorChangeState::new(current_time);
        self.stats = FieldStats::at(origin);
        self.bounds = Aabb::around(origin, 0.0);
        self.shape_list = shape_list;
        self.current = 0;

        for (i, dir) in level.vertices().iter().enumerate().take(self.colors.len()) {
            let mut speed = params.speed;
            if rng.try_with_chance(params.speed_spike_chance) {
                speed += params.max_speed_spike * rng.next_float();
            }
            self.burst_velocity[i] = *dir * speed;
            self.force_velocity[i] = Vec3::ZERO;
            self.positions[0][i] = origin;
            self.positions[1][i] = origin;
            self.colors[i] = params.initial_color;
            self.contacting[i] = false;
        }
    }

    pub(crate) fn release(&mut self) {
        self.shape_list = None;
    }

    // ── Accessors ──────────────────────────────────────────────

    /// Vertex positions after the last step.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions[self.current]
    }

    /// Vertex colors, parallel to [`positions`](Self::positions).
    pub fn colors(&self) -> &[Rgba8] {
        &self.colors
    }

    /// Burst velocities (testing and debugging aid).
    pub fn burst_velocity(&self) -> &[Vec3] {
        &self.burst_velocity
    }

    /// Subdivision level the hull was built at.
    pub fn subdiv_level(&self) -> usize {
        self.subdiv_level
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
    pub fn params(&self) -> &RegularHullParams {
        &self.params
    }

    /// Shape statistics folded from the last step.
    pub fn field_stats(&self) -> &FieldStats {
        &self.stats
    }

    /// Bounds of the vertex positions.
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

    // ── Simulation ─────────────────────────────────────────────

    pub(crate) fn simulate(
        &mut self,
        world: &dyn CollisionWorld,
        level: &IcosphereLevel,
        tuning: &HullTuning,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) {
        let dt = clamped_step_seconds(self.last_simulated_at, current_time);
        self.last_simulated_at = current_time;

        let [a, b] = &mut self.positions;
        let (old, new) = if self.current == 0 { (&*a, b) } else { (&*b, a) };

        // 1. Integrate.
        let decay = (1.0 - 1.5 * dt).max(0.0);
        let mut bounds = Aabb::empty();
        for i in 0..new.len() {
            self.burst_velocity[i] *= decay;
            self.force_velocity[i] += self.stats.force_at(old[i], &self.params) * dt;
            new[i] = old[i] + (self.burst_velocity[i] + self.force_velocity[i]) * dt;
            bounds.add_point(old[i]);
            bounds.add_point(new[i]);
        }

        // 2-3. Batched broad phase, then per-vertex clipping.
        let mask = self.params.collision_mask;
        match self.shape_list.as_deref_mut() {
            Some(list) if !mask.is_empty() => {
                world.build_and_clip_shape_list(list, &bounds.expanded(1.0), mask);
                let list: &ShapeList = list;
                for i in 0..new.len() {
                    let trace = world.trace_against_shape_list(list, old[i], new[i], mask);
                    if !trace.is_blocked() {
                        self.contacting[i] = false;
                        continue;
                    }
                    self.contacting[i] = true;
                    let slid = slide(world, list, old[i], new[i], &trace, tuning, mask);
                    match slid {
                        Some(p) => {
                            new[i] = p;
                            let n = trace.normal;
                            let burst_velocity = self.burst_velocity[i];
                            self.burst_velocity[i] -= n * burst_velocity.dot(n);
                            let force_velocity = self.force_velocity[i];
                            self.force_velocity[i] -= n * force_velocity.dot(n);
                        }
                        None => {
                            new[i] = if trace.start_solid {
                                old[i]
                            } else {
                                trace.end_pos + trace.normal * tuning.contact_offset
                            };
                            self.colors[i][ALPHA] = 0;
                            self.burst_velocity[i] = Vec3::ZERO;
                            self.force_velocity[i] = Vec3::ZERO;
                        }
                    }
                }
            }
            _ => self.contacting.fill(false),
        }

        // 4. Relax free vertices when they are a minority.
        let n = new.len();
        let free = self.contacting.iter().filter(|c| !**c).count();
        if free > 0 && (free as f32) < tuning.relaxation_minority_fraction * n as f32 {
            let min_factor = tuning.relaxation_min_factor;
            for (i, neighbours) in level.neighbours().iter().enumerate().take(n) {
                if self.contacting[i] {
                    continue;
                }
                let free_neighbours = neighbours
                    .iter()
                    .filter(|&&j| !self.contacting.get(j as usize).copied().unwrap_or(true))
                    .count();
                let factor = min_factor + (1.0 - min_factor) * free_neighbours as f32 / NUM_NEIGHBOURS as f32;
                new[i] = old[i] + (new[i] - old[i]) * factor;
            }
        }

        // Field stats and bounds from the committed positions.
        let mut acc = StatsAccumulator::default();
        let mut bounds = Aabb::empty();
        for (p, contacting) in new.iter().zip(&self.contacting) {
            bounds.add_point(*p);
            if !contacting {
                acc.add(*p);
            }
        }
        self.bounds = bounds;
        if acc.count > 0 {
            let avg = Vec2::new(acc.sum_x, acc.sum_y) / acc.count as f32;
            let max_xy_dist = new
                .iter()
                .zip(&self.contacting)
                .filter(|(_, c)| !**c)
                .map(|(p, _)| Vec2::new(p.x, p.y).distance(avg))
                .fold(0.0f32, f32::max);
            self.stats = FieldStats {
                min_z_last_frame: acc.min_z,
                max_z_last_frame: acc.max_z,
                avg_x_last_frame: avg.x,
                avg_y_last_frame: avg.y,
                max_xy_dist_last_frame: max_xy_dist,
            };
        }
        self.current = 1 - self.current;

        // 5. Colors.
        let fraction = self.lifetime_fraction(current_time);
        advance_color_timeline(
            self.params.timeline,
            &mut self.color_state,
            &mut self.colors,
            current_time,
            fraction,
            rng,
        );
    }
}

/// One-step slide along the blocking surface. `None` if the move is
/// (anti)parallel to the normal or the slide is blocked too.
fn slide(
    world: &dyn CollisionWorld,
    list: &ShapeList,
    old: Vec3,
    new: Vec3,
    trace: &Trace,
    tuning: &HullTuning,
    mask: ContentFlags,
) -> Option<Vec3> {
    if trace.start_solid {
        return None;
    }
    let motion = new - old;
    let len = motion.length();
    let normal = trace.normal;
    if len < MIN_MOVE || normal.length_squared() < 0.5 {
        return None;
    }
    if (motion.dot(normal) / len).abs() >= tuning.slide_min_normal_dot {
        return None;
    }
    let tangential = (motion - normal * motion.dot(normal)) * (1.0 - trace.fraction);
    let end = trace.end_pos + tangential;
    let slide = world.trace_against_shape_list(list, trace.end_pos, end, mask);
    (!slide.is_blocked()).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::IcosphereTopology;
    use cinder_arena::ScratchPool;
    use cinder_core::CoreError;
    use cinder_test_utils::MockCollisionWorld;

    fn lease() -> ScratchLease<ShapeList> {
        ScratchPool::try_new::<CoreError>(1, || ShapeList::try_with_capacity(8))
            .unwrap()
            .acquire()
            .unwrap()
    }

    fn spawned(topo: &IcosphereTopology, level: usize, params: &RegularHullParams) -> RegularHull {
        let mut hull = RegularHull::with_level(topo.level(level), level);
        let mut rng = RandomGenerator::new(3);
        hull.spawn(topo.level(level), Vec3::new(0.0, 0.0, 100.0), params, &mut rng, 0, Some(lease()));
        hull
    }

    #[test]
    fn free_hull_grows_outward() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut hull = spawned(&topo, 2, &RegularHullParams::default());
        let tuning = HullTuning::default();
        for t in (16..=160).step_by(16) {
            hull.simulate(&world, topo.level(2), &tuning, &mut rng, t);
        }
        let origin = hull.origin();
        let dists: Vec<f32> = hull.positions().iter().map(|p| p.distance(origin)).collect();
        assert!(dists.iter().all(|d| *d > 5.0));
        let spread = dists.iter().cloned().fold(f32::MIN, f32::max) - dists.iter().cloned().fold(f32::MAX, f32::min);
        assert!(spread < 1e-2);
        assert!(hull.colors().iter().all(|c| c[ALPHA] == 255));
    }

    #[test]
    fn burst_velocity_decays() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut hull = spawned(&topo, 1, &RegularHullParams::default());
        let before = hull.burst_velocity()[0].length();
        hull.simulate(&world, topo.level(1), &HullTuning::default(), &mut rng, 20);
        let after = hull.burst_velocity()[0].length();
        assert!((after - before * (1.0 - 1.5 * 0.02)).abs() < 1e-3);
    }

    #[test]
    fn buoyancy_lifts_the_hull() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let params = RegularHullParams {
            speed: 50.0,
            archimedes_bottom_accel: 100.0,
            archimedes_top_accel: 300.0,
            ..Default::default()
        };
        let mut hull = spawned(&topo, 2, &params);
        for t in (16..=320).step_by(16) {
            hull.simulate(&world, topo.level(2), &HullTuning::default(), &mut rng, t);
        }
        assert!(hull.bounds().center().z > hull.origin().z + 5.0);
        let stats = hull.field_stats();
        assert!(stats.max_z_last_frame > stats.min_z_last_frame);
    }

    #[test]
    fn floor_contact_flattens_and_hides_vertices() {
        let topo = IcosphereTopology::new();
        // Floor just below the spawn point: every downward vertex hits it head on.
        let world = MockCollisionWorld::with_floor(99.0);
        let mut rng = RandomGenerator::new(1);
        let mut hull = spawned(&topo, 2, &RegularHullParams::default());
        for t in (16..=320).step_by(16) {
            hull.simulate(&world, topo.level(2), &HullTuning::default(), &mut rng, t);
        }
        assert!(hull.positions().iter().all(|p| p.z >= 99.0 - 1e-3));
        let bottom = topo
            .level(2)
            .vertices()
            .iter()
            .position(|d| d.z < -0.99)
            .unwrap();
        assert_eq!(hull.colors()[bottom][ALPHA], 0);
    }

    #[test]
    fn oblique_contact_slides() {
        let topo = IcosphereTopology::new();
        let world = MockCollisionWorld::with_floor(99.0);
        let mut rng = RandomGenerator::new(1);
        let mut hull = spawned(&topo, 2, &RegularHullParams::default());
        for t in (16..=320).step_by(16) {
            hull.simulate(&world, topo.level(2), &HullTuning::default(), &mut rng, t);
        }
        // A vertex heading down at 45 degrees keeps spreading sideways along the floor.
        let (i, dir) = topo
            .level(2)
            .vertices()
            .iter()
            .enumerate()
            .find(|(_, d)| d.z < -0.5 && d.z > -0.9)
            .unwrap();
        let p = hull.positions()[i];
        let horizontal = Vec2::new(p.x, p.y);
        assert!(horizontal.dot(Vec2::new(dir.x, dir.y)) > 1.0);
        assert!(p.z >= 99.0 - 1e-3);
    }

    #[test]
    fn expiry_follows_lifetime() {
        let topo = IcosphereTopology::new();
        let hull = spawned(&topo, 0, &RegularHullParams { lifetime_ms: 500, ..Default::default() });
        assert!(!hull.is_expired(499));
        assert!(hull.is_expired(500));
    }
}
