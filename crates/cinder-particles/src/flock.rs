//! A flock: one fixed-capacity batch of particles and its per-frame step.
//!
//! Particles and their colors are stored in two parallel vectors whose
//! capacity is reserved once, when the owning bin is built. Removal is
//! swap-with-last on both vectors, so particle order inside a flock is
//! meaningless.
//!
//! One simulation step:
//!
//! ```text
//! 1. drop particles whose timeout has passed
//! 2. v += a·dt ; p += v·dt                       (dt clamped to [1, 33] ms)
//! 3. one shape list for the bounds of all new positions
//! 4. per particle, clip old → new against the list:
//!      clear                                   → keep
//!      blocked, bounces left, not liquid, fast → reflect ×0.75, re-trace rest
//!      otherwise                               → swap-remove
//! 5. colors (lifespan, timeline), bounds, flock timeout
//! ```

use std::fmt;

use cinder_arena::{ScratchLease, SlotHandle};
use cinder_core::color::{is_transparent, ALPHA};
use cinder_core::math::reflect;
use cinder_core::time::clamped_step_seconds;
use cinder_core::{
    advance_color_timeline_with, Aabb, AppearanceRules, ColorChangeState, CollisionWorld,
    ContentFlags, Particle, ParticleSubmission, RandomGenerator, Rgba8, SceneSink, ShapeList,
    Trace,
};
use glam::Vec3;

use crate::bin::FlockBin;
use crate::system::ParticleFrameStats;

/// Fraction of speed kept by a bounce.
pub const BOUNCE_RESTITUTION: f32 = 0.75;
/// Particles at or below this squared speed never bounce.
pub const MIN_BOUNCE_SPEED_SQUARED: f32 = 1.0;

/// Stable name of a flock: its bin plus a generation-checked slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlockHandle {
    pub(crate) bin: FlockBin,
    pub(crate) slot: SlotHandle,
}

impl FlockHandle {
    /// Bin the flock was allocated from.
    pub fn bin(&self) -> FlockBin {
        self.bin
    }
}

impl fmt::Display for FlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flock({}, {})", self.bin, self.slot)
    }
}

/// A fixed-capacity batch of particles sharing appearance and expiry.
#[derive(Debug)]
pub struct Flock {
    /// How the particles are drawn.
    pub appearance: AppearanceRules,
    /// Contents the particles collide with; empty disables collision.
    pub collision_mask: ContentFlags,
    particles: Vec<Particle>,
    colors: Vec<Rgba8>,
    max_particles: usize,
    bin: FlockBin,
    spawn_time: i64,
    last_simulated_at: i64,
    timeout_at: i64,
    lifetime_end_at: i64,
    pinned: bool,
    color_state: ColorChangeState,
    bounds: Aabb,
    shape_list: Option<ScratchLease<ShapeList>>,
}

impl Flock {
    pub(crate) fn with_capacity(bin: FlockBin, max_particles: usize) -> Self {
        Self {
            appearance: AppearanceRules::default(),
            collision_mask: ContentFlags::MASK_SOLID,
            particles: Vec::with_capacity(max_particles),
            colors: Vec::with_capacity(max_particles),
            max_particles,
            bin,
            spawn_time: 0,
            last_simulated_at: 0,
            timeout_at: 0,
            lifetime_end_at: 0,
            pinned: false,
            color_state: ColorChangeState::new(0),
            bounds: Aabb::empty(),
            shape_list: None,
        }
    }

    /// Re-initialise a recycled slot in place.
    pub(crate) fn reset(&mut self, current_time: i64, shape_list: Option<ScratchLease<ShapeList>>) {
        self.appearance = AppearanceRules::default();
        self.collision_mask = ContentFlags::MASK_SOLID;
        self.particles.clear();
        self.colors.clear();
        self.spawn_time = current_time;
        self.last_simulated_at = current_time;
        self.timeout_at = current_time;
        self.lifetime_end_at = current_time;
        self.pinned = false;
        self.color_state = ColorChangeState::new(current_time);
        self.bounds = Aabb::empty();
        self.shape_list = shape_list;
    }

    /// Give the shape list back to its pool.
    pub(crate) fn release(&mut self) {
        self.particles.clear();
        self.colors.clear();
        self.shape_list = None;
        self.pinned = false;
    }

    // ── Accessors ──────────────────────────────────────────────

    /// Bin this flock lives in.
    pub fn bin(&self) -> FlockBin {
        self.bin
    }

    /// Live particles, unordered.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the live particles (count is fixed).
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Current particle colors, parallel to [`particles`](Self::particles).
    pub fn colors(&self) -> &[Rgba8] {
        &self.colors
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether no particle is left.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Whether another particle would exceed the bin's per-flock limit.
    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.max_particles
    }

    /// The bin's per-flock particle limit.
    pub fn capacity(&self) -> usize {
        self.max_particles
    }

    /// When the flock was created.
    pub fn spawn_time(&self) -> i64 {
        self.spawn_time
    }

    /// Eviction key: the latest particle timeout, `i64::MAX` while pinned.
    pub fn timeout_at(&self) -> i64 {
        self.timeout_at
    }

    /// Whether the flock is held alive by an attached trail.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Bounds of the particle origins after the last step.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Normalised age of the flock as a whole.
    pub fn lifetime_fraction(&self, current_time: i64) -> f32 {
        let span = (self.lifetime_end_at - self.spawn_time).max(1) as f32;
        ((current_time - self.spawn_time) as f32 / span).clamp(0.0, 1.0)
    }

    // ── Mutation ───────────────────────────────────────────────

    /// Append one particle. Returns `false` if the flock is full.
    pub fn try_add_particle(&mut self, particle: Particle, color: Rgba8) -> bool {
        if self.is_full() {
            return false;
        }
        self.lifetime_end_at = self.lifetime_end_at.max(particle.timeout_at);
        if !self.pinned {
            self.timeout_at = if self.particles.is_empty() {
                particle.timeout_at
            } else {
                self.timeout_at.max(particle.timeout_at)
            };
        }
        self.bounds.add_point(particle.origin);
        self.particles.push(particle);
        self.colors.push(color);
        true
    }

    /// Remove every particle.
    pub fn clear_particles(&mut self) {
        self.particles.clear();
        self.colors.clear();
        self.bounds = Aabb::empty();
    }

    /// Keep the flock alive regardless of its particles.
    pub fn pin(&mut self) {
        self.pinned = true;
        self.timeout_at = i64::MAX;
    }

    /// Let the flock expire with its last particle.
    pub fn unpin(&mut self, current_time: i64) {
        self.pinned = false;
        self.timeout_at = self.max_particle_timeout().unwrap_or(current_time);
    }

    pub(crate) fn finish_fill(&mut self, max_timeout_at: i64) {
        self.lifetime_end_at = self.lifetime_end_at.max(max_timeout_at);
        if !self.pinned {
            self.timeout_at = self.max_particle_timeout().unwrap_or(self.spawn_time);
        }
    }

    fn max_particle_timeout(&self) -> Option<i64> {
        self.particles.iter().map(|p| p.timeout_at).max()
    }

    // ── Simulation ─────────────────────────────────────────────

    pub(crate) fn simulate(
        &mut self,
        world: &dyn CollisionWorld,
        current_time: i64,
        rng: &mut RandomGenerator,
        stats: &mut ParticleFrameStats,
    ) {
        let dt = clamped_step_seconds(self.last_simulated_at, current_time);
        self.last_simulated_at = current_time;

        self.dispose_timed_out(current_time, stats);
        if !self.particles.is_empty() {
            self.integrate(dt);
            self.collide(world, dt, stats);
        }
        self.update_colors(current_time, rng);
        self.refresh(current_time);
    }

    fn dispose_timed_out(&mut self, current_time: i64, stats: &mut ParticleFrameStats) {
        let mut i = 0;
        while i < self.particles.len() {
            if self.particles[i].timeout_at <= current_time {
                self.particles.swap_remove(i);
                self.colors.swap_remove(i);
                stats.disposed_by_timeout += 1;
            } else {
                i += 1;
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        let mut bounds = Aabb::empty();
        for p in &mut self.particles {
            p.old_origin = p.origin;
            p.velocity += p.accel * dt;
            p.origin += p.velocity * dt;
            bounds.add_point(p.origin);
            bounds.add_point(p.old_origin);
        }
        self.bounds = bounds;
    }

    fn collide(&mut self, world: &dyn CollisionWorld, dt: f32, stats: &mut ParticleFrameStats) {
        let mask = self.collision_mask;
        if mask.is_empty() {
            return;
        }
        let Some(list) = self.shape_list.as_deref_mut() else {
            return;
        };
        world.build_and_clip_shape_list(list, &self.bounds.expanded(1.0), mask);
        if list.is_empty() {
            return;
        }
        let list: &ShapeList = list;

        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            let trace = world.trace_against_shape_list(list, p.old_origin, p.origin, mask);
            if !trace.is_blocked() || bounce(world, list, p, &trace, dt, mask) {
                i += 1;
            } else {
                self.particles.swap_remove(i);
                self.colors.swap_remove(i);
                stats.disposed_by_collision += 1;
            }
        }
    }

    fn update_colors(&mut self, current_time: i64, rng: &mut RandomGenerator) {
        if let Some(lifespan) = self.appearance.color_lifespan {
            for (p, color) in self.particles.iter().zip(self.colors.iter_mut()) {
                let next = lifespan.color_at(p.lifetime_fraction(current_time));
                if p.timeline_touched {
                    // Timeline colors keep their rgb; the lifespan may only thin them.
                    color[ALPHA] = color[ALPHA].min(next[ALPHA]);
                } else {
                    *color = next;
                }
            }
        }
        if let Some(timeline) = self.appearance.timeline {
            let fraction = self.lifetime_fraction(current_time);
            let particles = &mut self.particles;
            advance_color_timeline_with(
                timeline,
                &mut self.color_state,
                &mut self.colors,
                current_time,
                fraction,
                rng,
                |i| particles[i].timeline_touched = true,
            );
        }
    }

    fn refresh(&mut self, current_time: i64) {
        let mut bounds = Aabb::empty();
        for p in &self.particles {
            bounds.add_point(p.origin);
        }
        self.bounds = bounds;
        if !self.pinned {
            self.timeout_at = self.max_particle_timeout().unwrap_or(current_time);
        }
    }

    // ── Submission ─────────────────────────────────────────────

    /// Hand the particles (and light, if any) to the scene.
    ///
    /// Returns whether anything visible was submitted.
    pub(crate) fn submit(&self, scene: &mut dyn SceneSink, current_time: i64) -> bool {
        if self.particles.is_empty() || self.colors.iter().all(is_transparent) {
            return false;
        }
        scene.add_particles(&ParticleSubmission {
            bounds: self.bounds,
            appearance: &self.appearance,
            particles: &self.particles,
            colors: &self.colors,
        });
        if let Some(light) = self.appearance.light {
            let radius = light.radius * (1.0 - self.lifetime_fraction(current_time));
            if radius > 0.0 {
                let sum: Vec3 = self.particles.iter().map(|p| p.origin).sum();
                let centroid = sum / self.particles.len() as f32;
                scene.add_light(centroid, radius, light.color);
            }
        }
        true
    }
}

/// Reflect a blocked particle and move it through the rest of the step.
///
/// Returns `false` when the particle must be disposed instead.
fn bounce(
    world: &dyn CollisionWorld,
    list: &ShapeList,
    p: &mut Particle,
    trace: &Trace,
    dt: f32,
    mask: ContentFlags,
) -> bool {
    if p.bounces_left == 0 || trace.start_solid || trace.contents.is_liquid() {
        return false;
    }
    if p.velocity.length_squared() <= MIN_BOUNCE_SPEED_SQUARED {
        return false;
    }
    p.velocity = reflect(p.velocity, trace.normal) * BOUNCE_RESTITUTION;
    p.bounces_left -= 1;

    let impact = trace.end_pos;
    let remaining = (1.0 - trace.fraction).clamp(0.0, 1.0);
    let target = impact + p.velocity * (dt * remaining);
    let rest = world.trace_against_shape_list(list, impact, target, mask);
    p.old_origin = impact;
    p.origin = rest.end_pos;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::{ColorLifespan, ColorTimelineNode, LightRules};
    use cinder_test_utils::{MockCollisionWorld, RecordingScene};
    use proptest::prelude::*;

    fn flock(max: usize) -> Flock {
        let mut f = Flock::with_capacity(FlockBin::Small, max);
        f.reset(0, Some(lease()));
        f
    }

    fn lease() -> ScratchLease<ShapeList> {
        let pool = cinder_arena::ScratchPool::try_new::<cinder_core::CoreError>(1, || {
            ShapeList::try_with_capacity(8)
        })
        .unwrap();
        pool.acquire().unwrap()
    }

    fn moving(origin: Vec3, velocity: Vec3, timeout: i64, bounces: u8) -> Particle {
        let mut p = Particle::new(origin, 0, timeout);
        p.velocity = velocity;
        p.bounces_left = bounces;
        p
    }

    #[test]
    fn add_particle_respects_capacity() {
        let mut f = flock(2);
        assert!(f.try_add_particle(Particle::new(Vec3::ZERO, 0, 10), [255; 4]));
        assert!(f.try_add_particle(Particle::new(Vec3::ZERO, 0, 20), [255; 4]));
        assert!(!f.try_add_particle(Particle::new(Vec3::ZERO, 0, 30), [255; 4]));
        assert_eq!(f.timeout_at(), 20);
    }

    #[test]
    fn pinned_flock_never_expires() {
        let mut f = flock(4);
        f.pin();
        f.try_add_particle(Particle::new(Vec3::ZERO, 0, 10), [255; 4]);
        assert_eq!(f.timeout_at(), i64::MAX);
        f.unpin(5);
        assert_eq!(f.timeout_at(), 10);
        f.clear_particles();
        f.unpin(7);
        assert_eq!(f.timeout_at(), 7);
    }

    #[test]
    fn step_is_clamped() {
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.try_add_particle(moving(Vec3::ZERO, Vec3::new(1000.0, 0.0, 0.0), 100_000, 0), [255; 4]);
        f.simulate(&world, 5_000, &mut rng, &mut stats);
        assert!((f.particles()[0].origin.x - 33.0).abs() < 1e-3);
        f.simulate(&world, 5_000, &mut rng, &mut stats);
        assert!((f.particles()[0].origin.x - 34.0).abs() < 1e-3);
    }

    #[test]
    fn timed_out_particles_are_removed_first() {
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(4);
        for timeout in [10, 50, 20, 60] {
            f.try_add_particle(Particle::new(Vec3::ZERO, 0, timeout), [255; 4]);
        }
        f.simulate(&world, 30, &mut rng, &mut stats);
        assert_eq!(f.len(), 2);
        assert_eq!(stats.disposed_by_timeout, 2);
        assert_eq!(f.timeout_at(), 60);
        f.simulate(&world, 60, &mut rng, &mut stats);
        assert!(f.is_empty());
        assert_eq!(f.timeout_at(), 60);
    }

    #[test]
    fn bounce_reflects_and_damps() {
        let world = MockCollisionWorld::with_floor(0.0);
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.try_add_particle(moving(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -500.0), 10_000, 1), [255; 4]);
        f.simulate(&world, 16, &mut rng, &mut stats);
        let p = f.particles()[0];
        assert_eq!(p.bounces_left, 0);
        assert!((p.velocity.z - 375.0).abs() < 1e-3);
        assert!(p.origin.z > 0.0);
        assert_eq!(world.shape_list_builds(), 1);
    }

    #[test]
    fn no_bounces_left_disposes() {
        let world = MockCollisionWorld::with_floor(0.0);
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(2);
        f.try_add_particle(moving(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -500.0), 10_000, 0), [1; 4]);
        f.try_add_particle(moving(Vec3::new(0.0, 0.0, 50.0), Vec3::ZERO, 10_000, 0), [2; 4]);
        f.simulate(&world, 16, &mut rng, &mut stats);
        assert_eq!(f.len(), 1);
        assert_eq!(f.colors(), &[[2; 4]]);
        assert_eq!(stats.disposed_by_collision, 1);
    }

    #[test]
    fn slow_particle_does_not_bounce() {
        let world = MockCollisionWorld::with_floor(0.0);
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.try_add_particle(moving(Vec3::new(0.0, 0.0, 0.01), Vec3::new(0.0, 0.0, -0.9), 10_000, 3), [255; 4]);
        f.simulate(&world, 33, &mut rng, &mut stats);
        assert!(f.is_empty());
        assert_eq!(stats.disposed_by_collision, 1);
    }

    #[test]
    fn liquid_impact_disposes() {
        let mut world = MockCollisionWorld::new();
        world.add_half_space(Vec3::Z, 0.0, ContentFlags::WATER, Default::default());
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.collision_mask = ContentFlags::MASK_SOLID | ContentFlags::MASK_WATER;
        f.try_add_particle(moving(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -500.0), 10_000, 5), [255; 4]);
        f.simulate(&world, 16, &mut rng, &mut stats);
        assert!(f.is_empty());
    }

    #[test]
    fn empty_mask_skips_collision() {
        let world = MockCollisionWorld::with_floor(0.0);
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.collision_mask = ContentFlags::empty();
        f.try_add_particle(moving(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -500.0), 10_000, 0), [255; 4]);
        f.simulate(&world, 16, &mut rng, &mut stats);
        assert_eq!(f.len(), 1);
        assert_eq!(world.shape_list_builds(), 0);
    }

    #[test]
    fn lifespan_fades_and_light_follows() {
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.appearance.color_lifespan = Some(ColorLifespan::fade_out([255, 255, 255, 255]));
        f.appearance.light = Some(LightRules { radius: 100.0, color: Vec3::ONE });
        f.try_add_particle(Particle::new(Vec3::ONE, 0, 1000), [255; 4]);
        f.finish_fill(1000);
        f.simulate(&world, 750, &mut rng, &mut stats);
        assert!(f.colors()[0][ALPHA] < 255);

        let mut scene = RecordingScene::new();
        assert!(f.submit(&mut scene, 750));
        assert_eq!(scene.particles.len(), 1);
        let (origin, radius, _) = scene.lights[0];
        assert_eq!(origin, Vec3::ONE);
        assert!((radius - 25.0).abs() < 1e-3);
    }

    fn fading_in() -> ColorLifespan {
        ColorLifespan {
            initial: [255, 255, 255, 0],
            faded_in: [255, 255, 255, 255],
            faded_out: [255, 255, 255, 0],
            finish_fading_in_at: 0.5,
            start_fading_out_at: 0.8,
        }
    }

    #[test]
    fn dropped_particle_stays_transparent_during_fade_in() {
        static DROP_ALL: [ColorTimelineNode; 1] = [ColorTimelineNode {
            activate_at_lifetime_fraction: 0.0,
            replacement_palette: &[],
            drop_chance: 1.0,
            replacement_chance: 0.0,
            color_change_interval_ms: 50,
        }];
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.collision_mask = ContentFlags::empty();
        f.appearance.color_lifespan = Some(fading_in());
        f.appearance.timeline = Some(&DROP_ALL);
        f.try_add_particle(Particle::new(Vec3::ONE, 0, 1000), [255, 255, 255, 0]);
        f.finish_fill(1000);

        f.simulate(&world, 100, &mut rng, &mut stats);
        assert_eq!(f.colors()[0][ALPHA], 0);
        assert!(f.particles()[0].timeline_touched);

        for t in [120, 300, 500, 700] {
            f.simulate(&world, t, &mut rng, &mut stats);
            assert_eq!(f.colors()[0][ALPHA], 0, "alpha came back at {t}");
        }
    }

    #[test]
    fn replacement_color_survives_lifespan() {
        static DIM: [Rgba8; 1] = [[10, 20, 30, 40]];
        static REPLACE_ALL: [ColorTimelineNode; 1] = [ColorTimelineNode {
            activate_at_lifetime_fraction: 0.0,
            replacement_palette: &DIM,
            drop_chance: 0.0,
            replacement_chance: 1.0,
            color_change_interval_ms: 50,
        }];
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut stats = ParticleFrameStats::default();
        let mut f = flock(1);
        f.collision_mask = ContentFlags::empty();
        f.appearance.color_lifespan = Some(ColorLifespan::fade_out([255; 4]));
        f.appearance.timeline = Some(&REPLACE_ALL);
        f.try_add_particle(Particle::new(Vec3::ONE, 0, 1000), [255; 4]);
        f.finish_fill(1000);

        f.simulate(&world, 100, &mut rng, &mut stats);
        assert_eq!(f.colors()[0], [10, 20, 30, 40]);
        f.simulate(&world, 120, &mut rng, &mut stats);
        assert_eq!(f.colors()[0], [10, 20, 30, 40]);
        // The lifespan has faded below the replacement by now.
        f.simulate(&world, 950, &mut rng, &mut stats);
        let c = f.colors()[0];
        assert_eq!(&c[..3], &[10, 20, 30]);
        assert!(c[ALPHA] < 40);
    }

    proptest! {
        #[test]
        fn alpha_never_rises_after_timeline_change(
            seed in any::<u64>(),
            initial_alpha in 0u8..128,
            faded_in_alpha in 128u8..=255,
            faded_out_alpha in any::<u8>(),
            finish_fading_in_at in 0.0f32..0.6,
            start_fading_out_at in 0.6f32..1.0,
            drop in 0.0f32..0.4,
            replace in 0.0f32..1.0,
            interval in 0u32..80,
            timeouts in proptest::collection::vec(2_000i64..4_000, 1..8),
        ) {
            static PALETTE: [Rgba8; 4] = [
                [255, 0, 0, 250], [0, 255, 0, 160], [0, 0, 255, 60], [9, 9, 9, 5],
            ];
            let node = |at| ColorTimelineNode {
                activate_at_lifetime_fraction: at,
                replacement_palette: &PALETTE,
                drop_chance: drop,
                replacement_chance: replace,
                color_change_interval_ms: interval,
            };
            let timeline: &'static [ColorTimelineNode] =
                Box::leak(Box::new([node(0.0), node(0.3)]));

            let world = MockCollisionWorld::new();
            let mut rng = RandomGenerator::new(seed);
            let mut stats = ParticleFrameStats::default();
            let mut f = flock(timeouts.len());
            f.collision_mask = ContentFlags::empty();
            f.appearance.color_lifespan = Some(ColorLifespan {
                initial: [255, 255, 255, initial_alpha],
                faded_in: [255, 255, 255, faded_in_alpha],
                faded_out: [255, 255, 255, faded_out_alpha],
                finish_fading_in_at,
                start_fading_out_at,
            });
            f.appearance.timeline = Some(timeline);
            for &timeout in &timeouts {
                let p = Particle::new(Vec3::ZERO, 0, timeout);
                f.try_add_particle(p, [255, 255, 255, initial_alpha]);
            }
            f.finish_fill(0);

            let mut last_alpha: Vec<Option<u8>> = vec![None; timeouts.len()];
            let mut t = 0;
            while t < 2_000 - 16 {
                t += 16;
                f.simulate(&world, t, &mut rng, &mut stats);
                prop_assert_eq!(f.particles().len(), timeouts.len());
                for (i, (p, c)) in f.particles().iter().zip(f.colors()).enumerate() {
                    if !p.timeline_touched {
                        continue;
                    }
                    if let Some(prev) = last_alpha[i] {
                        prop_assert!(
                            c[ALPHA] <= prev,
                            "particle {} rose from {} to {} at {}", i, prev, c[ALPHA], t
                        );
                    }
                    last_alpha[i] = Some(c[ALPHA]);
                }
            }
        }
    }
}
