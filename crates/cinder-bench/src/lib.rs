//! Benchmark profiles and fixtures for the Cinder effects engines.
//!
//! - [`reference_profile`]: default pool capacities
//! - [`stress_profile`]: four times the flocks and hulls
//! - [`arena_world`]: a walled room with a floor and a water pool
//! - [`populate`]: a deterministic mix of explosions and impacts

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cinder_core::{ContentFlags, SurfaceFlags};
use cinder_engine::{EffectsConfig, EffectsSystem};
use cinder_hulls::HullPoolConfig;
use cinder_particles::BinConfig;
use cinder_test_utils::MockCollisionWorld;
use glam::Vec3;

/// Half the width of the room built by [`arena_world`].
pub const ROOM_HALF_EXTENT: f32 = 512.0;

/// Default capacities with a fixed seed.
pub fn reference_profile(seed: u64) -> EffectsConfig {
    EffectsConfig {
        seed,
        ..Default::default()
    }
}

/// Four times the reference flocks and hulls at the same detail levels.
pub fn stress_profile(seed: u64) -> EffectsConfig {
    let mut config = reference_profile(seed);
    let p = &mut config.particles;
    p.small = BinConfig::new(p.small.max_particles_per_flock, p.small.max_flocks * 4);
    p.medium = BinConfig::new(p.medium.max_particles_per_flock, p.medium.max_flocks * 4);
    p.large = BinConfig::new(p.large.max_particles_per_flock, p.large.max_flocks * 4);
    let h = &mut config.hulls;
    h.fire = HullPoolConfig::new(h.fire.capacity * 4, h.fire.subdiv_level, h.fire.num_layers);
    h.smoke = HullPoolConfig::new(h.smoke.capacity * 4, h.smoke.subdiv_level, h.smoke.num_layers);
    h.wave = HullPoolConfig::new(h.wave.capacity * 4, h.wave.subdiv_level, h.wave.num_layers);
    config
}

/// A closed room: floor at z=0, four walls, a ceiling at z=256 and a
/// shallow water pool in one corner.
pub fn arena_world() -> MockCollisionWorld {
    let mut world = MockCollisionWorld::with_floor(0.0);
    let e = ROOM_HALF_EXTENT;
    for normal in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y] {
        world.add_half_space(normal, -e, ContentFlags::SOLID, SurfaceFlags::empty());
    }
    world.add_half_space(Vec3::NEG_Z, -256.0, ContentFlags::SOLID, SurfaceFlags::SKY);
    world.add_box(
        Vec3::new(e - 128.0, e - 128.0, 0.0),
        Vec3::new(e, e, 24.0),
        ContentFlags::WATER,
        SurfaceFlags::empty(),
    );
    world
}

/// Spawn `n` rounds of effects spread over the room at `current_time`.
///
/// Each round is one rocket explosion, one grenade explosion, one bullet
/// impact on dusty ground and one landing puff.
pub fn populate(fx: &mut EffectsSystem, world: &MockCollisionWorld, n: usize, current_time: i64) {
    for i in 0..n {
        let angle = i as f32 * 2.399_963;
        let r = (ROOM_HALF_EXTENT - 64.0) * ((i % 7) as f32 + 1.0) / 8.0;
        let spot = Vec3::new(r * angle.cos(), r * angle.sin(), 0.0);
        fx.spawn_rocket_explosion_effect(world, spot + Vec3::new(0.0, 0.0, 32.0), Vec3::Z, current_time);
        fx.spawn_grenade_explosion_effect(world, spot + Vec3::new(16.0, 0.0, 12.0), Vec3::Z, current_time);
        fx.spawn_bullet_impact_effect(world, spot + Vec3::Z, Vec3::Z, SurfaceFlags::DUST, current_time);
        fx.spawn_landing_dust_effect(spot, current_time);
    }
}
