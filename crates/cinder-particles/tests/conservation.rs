//! Integration test: every spawned particle is disposed exactly once.
//!
//! Flocks are spawned over a floor and stepped with a steady 16 ms frame
//! until everything has expired. The per-frame disposal counters must add
//! up to the number of particles spawned, split by cause as expected.

use cinder_arena::ScratchPool;
use cinder_core::{CoreError, RandomGenerator, ShapeList};
use cinder_particles::{
    ConeFlockFiller, FillParams, FlockBin, ParticleConfig, ParticleFrameStats, ParticleSystem,
    UniformFlockFiller,
};
use cinder_test_utils::{MockCollisionWorld, RecordingScene};
use glam::Vec3;

const FRAME_MS: i64 = 16;

fn particle_system() -> ParticleSystem {
    let config = ParticleConfig::default();
    let lists = ScratchPool::try_new::<CoreError>(config.total_flocks(), || {
        ShapeList::try_with_capacity(16)
    })
    .unwrap();
    ParticleSystem::new(config, lists).unwrap()
}

fn run(
    system: &mut ParticleSystem,
    world: &MockCollisionWorld,
    rng: &mut RandomGenerator,
    from: i64,
    until: i64,
) -> ParticleFrameStats {
    let mut total = ParticleFrameStats::default();
    let mut t = from;
    while t < until {
        t += FRAME_MS;
        let stats = system.simulate(world, rng, t);
        total.disposed_by_timeout += stats.disposed_by_timeout;
        total.disposed_by_collision += stats.disposed_by_collision;
        total.flocks_released += stats.flocks_released;
        total.live_flocks = stats.live_flocks;
        total.live_particles = stats.live_particles;
    }
    total
}

#[test]
fn short_lived_flocks_are_fully_disposed() {
    let world = MockCollisionWorld::with_floor(0.0);
    let mut system = particle_system();
    let mut rng = RandomGenerator::new(11);
    let filler = UniformFlockFiller {
        params: FillParams {
            origin: Vec3::new(0.0, 0.0, 32.0),
            min_timeout_ms: 300,
            max_timeout_ms: 700,
            max_bounces: 2,
            ..Default::default()
        },
    };

    let mut spawned = 0;
    for _ in 0..5 {
        let (_, fill) = system.spawn(&filler, 100, &mut rng, 0, |_| {});
        spawned += fill.count as u64;
    }
    assert!(spawned > 0);

    let total = run(&mut system, &world, &mut rng, 0, 2000);
    assert_eq!(total.disposed_by_timeout + total.disposed_by_collision, spawned);
    assert_eq!(total.flocks_released, 5);
    assert_eq!(total.live_flocks, 0);
    assert_eq!(total.live_particles, 0);
}

#[test]
fn long_lived_bouncers_end_on_the_floor() {
    let world = MockCollisionWorld::with_floor(0.0);
    let mut system = particle_system();
    let mut rng = RandomGenerator::new(5);
    let filler = ConeFlockFiller {
        params: FillParams {
            origin: Vec3::new(0.0, 0.0, 20.0),
            min_timeout_ms: 30_000,
            max_timeout_ms: 30_000,
            min_bounces: 2,
            max_bounces: 2,
            ..Default::default()
        },
        axis: -Vec3::Z,
        angle_degrees: 30.0,
    };
    let (handle, fill) = system.spawn(&filler, 24, &mut rng, 0, |_| {});
    assert_eq!(handle.bin(), FlockBin::Small);

    let total = run(&mut system, &world, &mut rng, 0, 20_000);
    assert_eq!(total.disposed_by_collision, fill.count as u64);
    assert_eq!(total.disposed_by_timeout, 0);
    assert!(system.flock(handle).is_none());
}

#[test]
fn nothing_is_submitted_once_everything_expired() {
    let world = MockCollisionWorld::new();
    let mut system = particle_system();
    let mut rng = RandomGenerator::new(3);
    let filler = UniformFlockFiller::default();
    let (_, fill) = system.spawn(&filler, 20, &mut rng, 0, |_| {});

    let mut scene = RecordingScene::new();
    system.simulate(&world, &mut rng, 16);
    assert_eq!(system.submit(&mut scene, 16), 1);
    assert_eq!(scene.particle_count(), fill.count);

    run(&mut system, &world, &mut rng, 16, 1000);
    scene.clear();
    assert_eq!(system.submit(&mut scene, 1000), 0);
    assert!(scene.is_empty());
}
