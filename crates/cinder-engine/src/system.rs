//! The effects façade the game talks to.
//!
//! Gameplay code calls one-shot `spawn_*` methods for discrete events and
//! `touch_*` methods once per frame for everything that follows an entity.
//! Once per rendered frame [`EffectsSystem::simulate_frame_and_submit`]
//! advances every subsystem and hands the results to the scene:
//!
//! ```text
//! simulate_frame_and_submit(t)
//!   1. trails     detach untouched, retire lingering, submit polys/beams
//!   2. particles  small → medium → large → trail, then submit
//!   3. hulls      fire → smoke → wave, then submit with LOD
//!   4. sprites    retire expired, submit the rest
//! ```
//!
//! Trails run first so a trail detached this frame unpins its flock
//! before the particle sweep decides whether that flock is finished.

use cinder_arena::ScratchPool;
use cinder_core::{
    AppearanceRules, CollisionWorld, ContentFlags, CoreError, EntityNumber, RandomGenerator, Rgba8,
    SceneSink, ShapeList, SurfaceFlags, ViewParams,
};
use cinder_hulls::{HullSystem, IcosphereTopology};
use cinder_particles::{
    ConeFlockFiller, FillResult, Flock, FlockFiller, FlockHandle, ParticleSystem, UniformFlockFiller,
};
use cinder_trails::{BeamSlot, ParticleTrailSlot, PolyTrailSlot, TrailManager};
use glam::Vec3;

use crate::config::{ConfigError, EffectsConfig};
use crate::metrics::FrameMetrics;
use crate::presets::{self, ExplosionPreset, ParticleEmitter};
use crate::sprites::SpritePool;

/// Shape slots reserved inline by each scratch shape list.
const SHAPE_LIST_CAPACITY: usize = 16;

/// Owns every effect pool and the random generator that drives them.
pub struct EffectsSystem {
    config: EffectsConfig,
    rng: RandomGenerator,
    particles: ParticleSystem,
    hulls: HullSystem,
    trails: TrailManager,
    sprites: SpritePool,
    trail_evictions: u64,
}

impl EffectsSystem {
    /// Validate `config` and build every pool up front.
    ///
    /// This is the only place the effects core allocates; a failure here
    /// is fatal for the effects subsystem.
    pub fn new(config: EffectsConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let shape_lists = ScratchPool::try_new::<CoreError>(config.total_shape_lists(), || {
            ShapeList::try_with_capacity(SHAPE_LIST_CAPACITY)
        })?;
        let particles = ParticleSystem::new(config.particles, shape_lists.clone())?;
        let hulls = HullSystem::new(&config.hulls, config.lod, IcosphereTopology::shared(), shape_lists)?;
        let trails = TrailManager::new(&config.trails)?;
        let sprites = SpritePool::new(config.max_sprites)?;

        log::info!(
            "effects system ready: {} shape lists, seed {:#x}",
            config.total_shape_lists(),
            config.seed
        );
        Ok(Self {
            rng: RandomGenerator::new(config.seed),
            config,
            particles,
            hulls,
            trails,
            sprites,
            trail_evictions: 0,
        })
    }

    /// The configuration this system was built with.
    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Particle flocks.
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Hull pools.
    pub fn hulls(&self) -> &HullSystem {
        &self.hulls
    }

    /// Attached and lingering trails.
    pub fn trails(&self) -> &TrailManager {
        &self.trails
    }

    // ── One-shot effects ───────────────────────────────────────

    /// Rocket explosion at `origin`; `dir` points away from the surface hit.
    pub fn spawn_rocket_explosion_effect(
        &mut self,
        world: &dyn CollisionWorld,
        origin: Vec3,
        dir: Vec3,
        current_time: i64,
    ) {
        self.spawn_explosion(world, origin, dir, &presets::rocket_explosion(), current_time);
    }

    /// Grenade explosion at `origin`.
    pub fn spawn_grenade_explosion_effect(
        &mut self,
        world: &dyn CollisionWorld,
        origin: Vec3,
        dir: Vec3,
        current_time: i64,
    ) {
        self.spawn_explosion(world, origin, dir, &presets::grenade_explosion(), current_time);
    }

    fn spawn_explosion(
        &mut self,
        world: &dyn CollisionWorld,
        origin: Vec3,
        dir: Vec3,
        preset: &ExplosionPreset,
        current_time: i64,
    ) {
        let dir = dir.try_normalize().unwrap_or(Vec3::Z);
        let lifted = origin + dir * preset.lift;
        // No fireball, flash or sparks under water.
        let underwater = !world.point_contents(origin, ContentFlags::MASK_WATER).is_empty();

        if !underwater {
            let mut fire = preset.fire_hull;
            fire.bias_direction = dir;
            let _ = self.hulls.spawn_fire_hull(world, origin, &fire, &mut self.rng, current_time);
            let rotation = 360.0 * self.rng.next_float();
            self.sprites.spawn(origin, rotation, &preset.flash, current_time);
            self.emit(&preset.sparks, lifted, dir, current_time);
        }
        let _ = self.hulls.spawn_smoke_hull(lifted, &preset.smoke_hull, &mut self.rng, current_time);
        let _ = self.hulls.spawn_wave_hull(origin, &preset.wave_hull, &mut self.rng, current_time);
        self.emit(&preset.debris, lifted, dir, current_time);
    }

    /// Plasma bolt hitting a surface with the given `normal`.
    pub fn spawn_plasma_impact_effect(&mut self, origin: Vec3, normal: Vec3, current_time: i64) {
        let normal = normal.try_normalize().unwrap_or(Vec3::Z);
        self.emit(&presets::plasma_impact(), origin + normal, normal, current_time);
    }

    /// Bullet hitting a surface. Sky surfaces show nothing; dusty ones add
    /// a dust puff to the sparks.
    pub fn spawn_bullet_impact_effect(
        &mut self,
        world: &dyn CollisionWorld,
        origin: Vec3,
        normal: Vec3,
        surface: SurfaceFlags,
        current_time: i64,
    ) {
        if surface.contains(SurfaceFlags::SKY) {
            return;
        }
        let normal = normal.try_normalize().unwrap_or(Vec3::Z);
        let lifted = origin + normal;
        if world.point_contents(lifted, ContentFlags::MASK_WATER).is_empty() {
            self.emit(&presets::bullet_sparks(), lifted, normal, current_time);
        }
        if surface.contains(SurfaceFlags::DUST) {
            self.emit(&presets::bullet_dust(), lifted, normal, current_time);
        }
    }

    /// Dust raised by a player landing at `origin`.
    pub fn spawn_landing_dust_effect(&mut self, origin: Vec3, current_time: i64) {
        self.emit(&presets::landing_dust(), origin, Vec3::Z, current_time);
    }

    /// Railgun shot: a beam that starts fading immediately.
    pub fn spawn_railgun_beam(&mut self, from: Vec3, to: Vec3, color: Rgba8, current_time: i64) {
        self.trails
            .spawn_lingering_beam(from, to, current_time, &presets::railgun_beam(color));
    }

    /// Spawn a flock with a caller-supplied filler and appearance.
    ///
    /// `count` picks the smallest bin holding that many particles. The
    /// filler decides how many are actually written; the stock fillers use
    /// [`FillParams::percentage`] of the bin's capacity.
    ///
    /// [`FillParams::percentage`]: cinder_particles::FillParams::percentage
    pub fn spawn_custom_flock(
        &mut self,
        filler: &dyn FlockFiller,
        count: usize,
        appearance: &AppearanceRules,
        collision_mask: ContentFlags,
        current_time: i64,
    ) -> (FlockHandle, FillResult) {
        let appearance = *appearance;
        self.particles
            .spawn(filler, count, &mut self.rng, current_time, move |flock: &mut Flock| {
                flock.appearance = appearance;
                flock.collision_mask = collision_mask;
            })
    }

    fn emit(&mut self, emitter: &ParticleEmitter, origin: Vec3, axis: Vec3, current_time: i64) -> FlockHandle {
        let config = self.particles.config();
        let capacity = config
            .bin(config.bin_for_particle_count(emitter.count))
            .max_particles_per_flock
            .max(1);
        let mut params = emitter.fill;
        params.origin = origin;
        params.percentage = emitter.count as f32 / capacity as f32;

        let (handle, _) = match emitter.cone_angle_degrees {
            Some(angle_degrees) => {
                let filler = ConeFlockFiller {
                    params,
                    axis,
                    angle_degrees,
                };
                self.spawn_custom_flock(&filler, emitter.count, &emitter.appearance, emitter.collision_mask, current_time)
            }
            None => {
                let filler = UniformFlockFiller { params };
                self.spawn_custom_flock(&filler, emitter.count, &emitter.appearance, emitter.collision_mask, current_time)
            }
        };
        handle
    }

    // ── Continuous effects ─────────────────────────────────────

    /// Smoke and fire behind a flying rocket. Call once per frame.
    pub fn touch_rocket_trail(&mut self, entity: EntityNumber, origin: Vec3, current_time: i64) {
        self.touch_particle_trail(entity, ParticleTrailSlot::Smoke, origin, current_time);
        self.touch_particle_trail(entity, ParticleTrailSlot::Fire, origin, current_time);
    }

    /// Smoke behind a flying grenade. Call once per frame.
    pub fn touch_grenade_trail(&mut self, entity: EntityNumber, origin: Vec3, current_time: i64) {
        self.touch_particle_trail(entity, ParticleTrailSlot::Smoke, origin, current_time);
    }

    /// Glow behind a blaster bolt. Call once per frame.
    pub fn touch_blast_trail(&mut self, entity: EntityNumber, origin: Vec3, current_time: i64) {
        self.touch_particle_trail(entity, ParticleTrailSlot::Fire, origin, current_time);
    }

    /// Ribbon behind an electro bolt. Call once per frame.
    pub fn touch_electro_trail(&mut self, entity: EntityNumber, origin: Vec3, current_time: i64) {
        self.trails.touch_poly_trail(
            entity,
            PolyTrailSlot::Electro,
            origin,
            current_time,
            &presets::electro_trail(),
        );
    }

    /// Dust behind a running player. Only dusty ground keeps the trail
    /// alive; on other surfaces it is left untouched and fades out.
    pub fn touch_player_footsteps(
        &mut self,
        entity: EntityNumber,
        origin: Vec3,
        ground: SurfaceFlags,
        current_time: i64,
    ) {
        if ground.contains(SurfaceFlags::DUST) {
            self.touch_particle_trail(entity, ParticleTrailSlot::Dust, origin, current_time);
        }
    }

    /// Attach or move an entity's laser beam. Call once per frame.
    pub fn update_laser_beam(&mut self, entity: EntityNumber, from: Vec3, to: Vec3, current_time: i64) {
        self.trails
            .update_beam(entity, BeamSlot::Laser, from, to, current_time, &presets::laser_beam());
    }

    /// The entity is gone: let all of its trails linger out.
    pub fn detach_entity_effects(&mut self, entity: EntityNumber, current_time: i64) {
        self.trails.detach_entity(entity, current_time, &mut self.particles);
    }

    fn touch_particle_trail(&mut self, entity: EntityNumber, slot: ParticleTrailSlot, origin: Vec3, current_time: i64) {
        let params = match slot {
            ParticleTrailSlot::Smoke => presets::smoke_trail(),
            ParticleTrailSlot::Fire => presets::fire_trail(),
            ParticleTrailSlot::Dust => presets::footstep_dust(),
        };
        self.trails.touch_particle_trail(
            entity,
            slot,
            origin,
            current_time,
            &params,
            &mut self.particles,
            &mut self.rng,
        );
    }

    // ── Frame ──────────────────────────────────────────────────

    /// Advance every effect to `current_time` and submit it to `scene`.
    pub fn simulate_frame_and_submit(
        &mut self,
        world: &dyn CollisionWorld,
        view: &ViewParams,
        scene: &mut dyn SceneSink,
        current_time: i64,
    ) -> FrameMetrics {
        let mut metrics = FrameMetrics::default();

        let trail_stats = self
            .trails
            .simulate_frame_and_submit(current_time, &mut self.particles, scene);
        self.trail_evictions += trail_stats.evictions;
        metrics.record_trails(&trail_stats);

        let particle_stats = self.particles.simulate(world, &mut self.rng, current_time);
        metrics.record_particles(&particle_stats);
        metrics.submitted_flocks = self.particles.submit(scene, current_time);

        let hull_stats = self.hulls.simulate(world, &mut self.rng, current_time);
        metrics.record_hulls(&hull_stats);
        metrics.submitted_hulls = self.hulls.submit(scene, view);

        let sprite_stats = self.sprites.simulate_and_submit(scene, current_time);
        metrics.live_sprites = sprite_stats.live;
        metrics.submitted_sprites = sprite_stats.submitted;

        metrics.flock_evictions = self.particles.total_evictions();
        metrics.hull_evictions = self.hulls.total_evictions();
        metrics.trail_evictions = self.trail_evictions;
        metrics.sprite_evictions = self.sprites.total_evictions();
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_hulls::{HullKind, HullPoolConfig};
    use cinder_particles::{BinConfig, FlockBin};
    use cinder_test_utils::{MockCollisionWorld, RecordingScene};

    fn small_config() -> EffectsConfig {
        let mut config = EffectsConfig::default();
        config.particles.small = BinConfig::new(32, 8);
        config.particles.medium = BinConfig::new(128, 4);
        config.particles.large = BinConfig::new(256, 2);
        config.particles.trail = BinConfig::new(64, 4);
        config.hulls.fire = HullPoolConfig::new(2, 2, 5);
        config.hulls.smoke = HullPoolConfig::new(2, 1, 1);
        config.hulls.wave = HullPoolConfig::new(2, 1, 1);
        config.max_sprites = 2;
        config
    }

    fn system() -> EffectsSystem {
        EffectsSystem::new(small_config()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = small_config();
        config.max_sprites = 0;
        assert!(matches!(
            EffectsSystem::new(config),
            Err(ConfigError::ZeroCapacity { .. })
        ));
    }

    #[test]
    fn rocket_explosion_spawns_the_whole_family() {
        let world = MockCollisionWorld::with_floor(0.0);
        let mut fx = system();
        fx.spawn_rocket_explosion_effect(&world, Vec3::new(0.0, 0.0, 1.0), Vec3::Z, 1000);

        assert_eq!(fx.hulls().live_hulls(HullKind::Fire), 1);
        assert_eq!(fx.hulls().live_hulls(HullKind::Smoke), 1);
        assert_eq!(fx.hulls().live_hulls(HullKind::Wave), 1);
        // 48 sparks go to the medium bin, 12 debris to the small one.
        assert_eq!(fx.particles().live_flocks(FlockBin::Medium), 1);
        assert_eq!(fx.particles().live_flocks(FlockBin::Small), 1);
        assert_eq!(fx.particles().live_particles(), 60);

        let mut scene = RecordingScene::new();
        let metrics = fx.simulate_frame_and_submit(&world, &ViewParams::default(), &mut scene, 1016);
        assert_eq!(metrics.live_hulls, 3);
        assert_eq!(metrics.live_sprites, 1);
        assert_eq!(metrics.submitted_sprites, 1);
        assert_eq!(scene.entities.len(), 1);
        assert!(!scene.lights.is_empty());
    }

    #[test]
    fn underwater_explosion_has_no_fireball() {
        let mut world = MockCollisionWorld::new();
        world.add_box(
            Vec3::splat(-100.0),
            Vec3::splat(100.0),
            ContentFlags::WATER,
            SurfaceFlags::empty(),
        );
        let mut fx = system();
        fx.spawn_grenade_explosion_effect(&world, Vec3::ZERO, Vec3::Z, 0);
        assert_eq!(fx.hulls().live_hulls(HullKind::Fire), 0);
        assert_eq!(fx.hulls().live_hulls(HullKind::Smoke), 1);
        assert_eq!(fx.particles().live_flocks(FlockBin::Medium), 0);
    }

    #[test]
    fn bullet_impact_depends_on_surface() {
        let world = MockCollisionWorld::new();
        let mut fx = system();
        fx.spawn_bullet_impact_effect(&world, Vec3::ZERO, Vec3::Z, SurfaceFlags::SKY, 0);
        assert_eq!(fx.particles().live_particles(), 0);

        fx.spawn_bullet_impact_effect(&world, Vec3::ZERO, Vec3::Z, SurfaceFlags::METAL, 0);
        assert_eq!(fx.particles().live_particles(), 10);

        fx.spawn_bullet_impact_effect(&world, Vec3::ZERO, Vec3::Z, SurfaceFlags::DUST, 0);
        assert_eq!(fx.particles().live_particles(), 10 + 10 + 8);
    }

    #[test]
    fn footsteps_need_dusty_ground() {
        let mut fx = system();
        let ent = EntityNumber(3);
        fx.touch_player_footsteps(ent, Vec3::ZERO, SurfaceFlags::METAL, 16);
        assert!(!fx.trails().is_attached(ent, ParticleTrailSlot::Dust));
        fx.touch_player_footsteps(ent, Vec3::ZERO, SurfaceFlags::DUST, 32);
        assert!(fx.trails().is_attached(ent, ParticleTrailSlot::Dust));
    }

    #[test]
    fn railgun_beam_lingers_then_ends() {
        let world = MockCollisionWorld::new();
        let mut fx = system();
        fx.spawn_railgun_beam(Vec3::ZERO, Vec3::X * 500.0, [0, 255, 0, 255], 1000);

        let mut scene = RecordingScene::new();
        let view = ViewParams::default();
        let metrics = fx.simulate_frame_and_submit(&world, &view, &mut scene, 1300);
        assert_eq!(metrics.lingering_trails, 1);
        assert_eq!(metrics.submitted_polys, 1);
        assert_eq!(scene.polys[0].color[3], 128);

        let metrics = fx.simulate_frame_and_submit(&world, &view, &mut scene, 1600);
        assert_eq!(metrics.lingering_trails, 0);
        assert_eq!(metrics.trails_ended, 1);
    }

    #[test]
    fn explosions_evict_when_pools_are_full() {
        let world = MockCollisionWorld::new();
        let mut fx = system();
        for i in 0..3 {
            fx.spawn_rocket_explosion_effect(&world, Vec3::ZERO, Vec3::Z, i);
        }
        let mut scene = RecordingScene::new();
        let metrics = fx.simulate_frame_and_submit(&world, &ViewParams::default(), &mut scene, 16);
        // Three of each hull kind into pools of two; one flash too many.
        assert_eq!(metrics.hull_evictions, 3);
        assert_eq!(metrics.sprite_evictions, 1);
        assert_eq!(metrics.live_hulls, 6);
        assert_eq!(fx.particles().total_evictions(), 0);
    }
}
