//! The flock pool: bins, eviction, and the per-frame sweep.

use cinder_arena::{ArenaError, FreelistAllocator, ScratchPool};
use cinder_core::{CollisionWorld, RandomGenerator, SceneSink, ShapeList};

use crate::bin::{FlockBin, ParticleConfig};
use crate::filler::{FillResult, FlockFiller};
use crate::flock::{Flock, FlockHandle};

/// What one call to [`ParticleSystem::simulate`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParticleFrameStats {
    /// Flocks alive after the sweep.
    pub live_flocks: usize,
    /// Particles alive after the sweep.
    pub live_particles: usize,
    /// Particles removed because their timeout passed.
    pub disposed_by_timeout: u64,
    /// Particles removed on impact.
    pub disposed_by_collision: u64,
    /// Flocks released because they expired.
    pub flocks_released: u64,
    /// Flocks evicted by `create_flock` since the previous sweep.
    pub evictions: u64,
}

/// Owns every flock, grouped into size-classed bins.
pub struct ParticleSystem {
    config: ParticleConfig,
    bins: [FreelistAllocator<Flock>; 4],
    shape_lists: ScratchPool<ShapeList>,
    pending_evictions: u64,
    total_evictions: u64,
}

impl ParticleSystem {
    /// Build all bins up front.
    ///
    /// `shape_lists` is shared with other engines; it must hold at least
    /// one list per flock or some flocks will simulate without collision.
    pub fn new(config: ParticleConfig, shape_lists: ScratchPool<ShapeList>) -> Result<Self, ArenaError> {
        let make = |bin: FlockBin| {
            let c = config.bin(bin);
            FreelistAllocator::try_new(c.max_flocks, || Flock::with_capacity(bin, c.max_particles_per_flock))
        };
        let bins = [
            make(FlockBin::Small)?,
            make(FlockBin::Medium)?,
            make(FlockBin::Large)?,
            make(FlockBin::Trail)?,
        ];
        for bin in FlockBin::ALL {
            let c = config.bin(bin);
            log::info!(
                "particle bin {bin}: {} flocks x {} particles",
                c.max_flocks,
                c.max_particles_per_flock
            );
        }
        Ok(Self {
            config,
            bins,
            shape_lists,
            pending_evictions: 0,
            total_evictions: 0,
        })
    }

    /// The capacities this system was built with.
    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Allocate a flock in `bin`, evicting the soonest-to-expire flock of
    /// that bin if it is full.
    pub fn create_flock(&mut self, bin: FlockBin, current_time: i64) -> FlockHandle {
        let pool = &mut self.bins[bin.index()];
        let (slot, evicted) = pool.alloc_or_evict(|f| f.timeout_at(), Flock::release);
        if evicted {
            self.pending_evictions += 1;
            self.total_evictions += 1;
        }
        let lease = self.shape_lists.acquire();
        if let Some(flock) = pool.get_mut(slot) {
            flock.reset(current_time, lease);
        }
        FlockHandle { bin, slot }
    }

    /// Create a flock in the smallest bin that holds `count` particles and fill it.
    ///
    /// `count` only picks the bin. How many particles are written is up to
    /// `filler`; the stock fillers write [`FillParams::percentage`] of the
    /// bin's capacity.
    ///
    /// [`FillParams::percentage`]: crate::filler::FillParams::percentage
    pub fn spawn(
        &mut self,
        filler: &dyn FlockFiller,
        count: usize,
        rng: &mut RandomGenerator,
        current_time: i64,
        configure: impl FnOnce(&mut Flock),
    ) -> (FlockHandle, FillResult) {
        let bin = self.config.bin_for_particle_count(count);
        let handle = self.create_flock(bin, current_time);
        let result = match self.flock_mut(handle) {
            Some(flock) => {
                configure(flock);
                let result = filler.fill(flock, rng, current_time);
                flock.finish_fill(result.max_timeout_at);
                result
            }
            None => FillResult {
                max_timeout_at: current_time,
                count: 0,
            },
        };
        (handle, result)
    }

    /// Populate an existing flock. `None` for a stale handle.
    pub fn fill_flock(
        &mut self,
        handle: FlockHandle,
        filler: &dyn FlockFiller,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> Option<FillResult> {
        let flock = self.flock_mut(handle)?;
        let result = filler.fill(flock, rng, current_time);
        flock.finish_fill(result.max_timeout_at);
        Some(result)
    }

    /// Return a flock's shape list and free its slot. Stale handles are ignored.
    pub fn release_flock(&mut self, handle: FlockHandle) {
        let pool = &mut self.bins[handle.bin.index()];
        if let Some(flock) = pool.get_mut(handle.slot) {
            flock.release();
            pool.free(handle.slot);
        }
    }

    /// Shared access; `None` once the flock is gone.
    pub fn flock(&self, handle: FlockHandle) -> Option<&Flock> {
        self.bins[handle.bin.index()].get(handle.slot)
    }

    /// Exclusive access; `None` once the flock is gone.
    pub fn flock_mut(&mut self, handle: FlockHandle) -> Option<&mut Flock> {
        self.bins[handle.bin.index()].get_mut(handle.slot)
    }

    /// Live flocks in `bin`.
    pub fn live_flocks(&self, bin: FlockBin) -> usize {
        self.bins[bin.index()].len()
    }

    /// Live particles over all bins.
    pub fn live_particles(&self) -> usize {
        self.bins
            .iter()
            .flat_map(|b| b.iter())
            .map(|(_, f)| f.len())
            .sum()
    }

    /// Evictions since construction.
    pub fn total_evictions(&self) -> u64 {
        self.total_evictions
    }

    /// Advance every flock to `current_time`, bins in declared order.
    pub fn simulate(
        &mut self,
        world: &dyn CollisionWorld,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> ParticleFrameStats {
        let mut stats = ParticleFrameStats {
            evictions: std::mem::take(&mut self.pending_evictions),
            ..Default::default()
        };
        for bin in FlockBin::ALL {
            self.simulate_bin(bin, world, rng, current_time, &mut stats);
        }
        for pool in &self.bins {
            stats.live_flocks += pool.len();
            stats.live_particles += pool.iter().map(|(_, f)| f.len()).sum::<usize>();
        }
        stats
    }

    fn simulate_bin(
        &mut self,
        bin: FlockBin,
        world: &dyn CollisionWorld,
        rng: &mut RandomGenerator,
        current_time: i64,
        stats: &mut ParticleFrameStats,
    ) {
        let pool = &mut self.bins[bin.index()];
        let mut cursor = pool.first_live();
        while let Some(slot) = cursor {
            cursor = pool.next_live(slot);
            let Some(flock) = pool.get_mut(slot) else {
                continue;
            };
            if !flock.is_pinned() && flock.timeout_at() <= current_time {
                stats.disposed_by_timeout += flock.len() as u64;
                flock.release();
                pool.free(slot);
                stats.flocks_released += 1;
                continue;
            }
            flock.simulate(world, current_time, rng, stats);
        }
    }

    /// Submit every visible flock. Returns how many were submitted.
    pub fn submit(&self, scene: &mut dyn SceneSink, current_time: i64) -> usize {
        let mut submitted = 0;
        for bin in FlockBin::ALL {
            for (_, flock) in self.bins[bin.index()].iter() {
                if flock.submit(scene, current_time) {
                    submitted += 1;
                }
            }
        }
        submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::BinConfig;
    use crate::filler::{FillParams, UniformFlockFiller};
    use cinder_core::{CoreError, Particle, Vec3};
    use cinder_test_utils::{MockCollisionWorld, RecordingScene};
    use proptest::prelude::*;

    fn shape_lists(n: usize) -> ScratchPool<ShapeList> {
        ScratchPool::try_new::<CoreError>(n, || ShapeList::try_with_capacity(8)).unwrap()
    }

    fn system(config: ParticleConfig) -> ParticleSystem {
        let lists = shape_lists(config.total_flocks());
        ParticleSystem::new(config, lists).unwrap()
    }

    fn tiny_config(flocks: usize) -> ParticleConfig {
        ParticleConfig {
            small: BinConfig::new(4, flocks),
            medium: BinConfig::new(8, 1),
            large: BinConfig::new(16, 1),
            trail: BinConfig::new(16, 1),
        }
    }

    fn set_timeout(system: &mut ParticleSystem, handle: FlockHandle, timeout_at: i64) {
        let flock = system.flock_mut(handle).unwrap();
        flock.try_add_particle(Particle::new(Vec3::ZERO, 0, timeout_at), [255; 4]);
    }

    #[test]
    fn zero_flocks_is_an_error() {
        let config = tiny_config(0);
        assert!(ParticleSystem::new(config, shape_lists(4)).is_err());
    }

    #[test]
    fn eviction_picks_soonest_to_expire() {
        let mut sys = system(tiny_config(3));
        let a = sys.create_flock(FlockBin::Small, 0);
        let b = sys.create_flock(FlockBin::Small, 0);
        let c = sys.create_flock(FlockBin::Small, 0);
        set_timeout(&mut sys, a, 500);
        set_timeout(&mut sys, b, 200);
        set_timeout(&mut sys, c, 900);
        let d = sys.create_flock(FlockBin::Small, 10);
        assert!(sys.flock(b).is_none());
        assert!(sys.flock(a).is_some() && sys.flock(c).is_some() && sys.flock(d).is_some());
        assert_eq!(sys.total_evictions(), 1);
        assert_eq!(sys.live_flocks(FlockBin::Small), 3);
    }

    #[test]
    fn eviction_stays_within_bin() {
        let mut sys = system(tiny_config(1));
        let medium = sys.create_flock(FlockBin::Medium, 0);
        let small = sys.create_flock(FlockBin::Small, 0);
        set_timeout(&mut sys, small, 10_000);
        sys.create_flock(FlockBin::Small, 0);
        assert!(sys.flock(medium).is_some());
        assert!(sys.flock(small).is_none());
    }

    #[test]
    fn shape_lists_return_on_release() {
        let lists = shape_lists(2);
        let mut sys = ParticleSystem::new(tiny_config(2), lists.clone()).unwrap();
        let a = sys.create_flock(FlockBin::Small, 0);
        sys.create_flock(FlockBin::Small, 0);
        assert_eq!(lists.available(), 0);
        sys.release_flock(a);
        assert_eq!(lists.available(), 1);
        // Eviction releases too.
        sys.create_flock(FlockBin::Small, 0);
        sys.create_flock(FlockBin::Small, 0);
        assert_eq!(lists.available(), 0);
        assert_eq!(sys.total_evictions(), 1);
    }

    #[test]
    fn expired_flock_is_released() {
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut sys = system(tiny_config(2));
        let filler = UniformFlockFiller {
            params: FillParams { min_timeout_ms: 100, max_timeout_ms: 100, ..Default::default() },
        };
        let (handle, result) = sys.spawn(&filler, 4, &mut rng, 0, |_| {});
        assert_eq!(handle.bin(), FlockBin::Small);
        assert_eq!(result.count, 4);
        let stats = sys.simulate(&world, &mut rng, 50);
        assert_eq!(stats.live_particles, 4);
        let stats = sys.simulate(&world, &mut rng, 100);
        assert_eq!(stats.disposed_by_timeout, 4);
        assert_eq!(stats.flocks_released, 1);
        assert!(sys.flock(handle).is_none());
    }

    #[test]
    fn flock_emptied_by_collision_is_released_next_sweep() {
        let world = MockCollisionWorld::with_floor(0.0);
        let mut rng = RandomGenerator::new(1);
        let mut sys = system(tiny_config(2));
        let handle = sys.create_flock(FlockBin::Small, 0);
        let mut p = Particle::new(Vec3::new(0.0, 0.0, 1.0), 0, 10_000);
        p.velocity = Vec3::new(0.0, 0.0, -500.0);
        sys.flock_mut(handle).unwrap().try_add_particle(p, [255; 4]);

        let stats = sys.simulate(&world, &mut rng, 16);
        assert_eq!(stats.disposed_by_collision, 1);
        assert_eq!(stats.live_particles, 0);
        assert!(sys.flock(handle).is_some());
        assert_eq!(sys.flock(handle).unwrap().timeout_at(), 16);

        let stats = sys.simulate(&world, &mut rng, 32);
        assert_eq!(stats.flocks_released, 1);
        assert!(sys.flock(handle).is_none());
    }

    #[test]
    fn pinned_empty_flock_survives() {
        let world = MockCollisionWorld::new();
        let mut rng = RandomGenerator::new(1);
        let mut sys = system(tiny_config(2));
        let handle = sys.create_flock(FlockBin::Trail, 0);
        sys.flock_mut(handle).unwrap().pin();
        for t in (16..500).step_by(16) {
            sys.simulate(&world, &mut rng, t);
        }
        assert!(sys.flock(handle).is_some());
    }

    #[test]
    fn submit_skips_empty_flocks() {
        let mut rng = RandomGenerator::new(1);
        let mut sys = system(tiny_config(2));
        sys.create_flock(FlockBin::Small, 0);
        sys.spawn(&UniformFlockFiller::default(), 4, &mut rng, 0, |_| {});
        let mut scene = RecordingScene::new();
        assert_eq!(sys.submit(&mut scene, 0), 1);
        assert_eq!(scene.particle_count(), 4);
    }

    #[test]
    fn count_picks_bin_and_percentage_sets_fill() {
        let mut rng = RandomGenerator::new(1);
        let mut sys = system(tiny_config(2));
        let filler = UniformFlockFiller {
            params: FillParams {
                percentage: 0.5,
                ..Default::default()
            },
        };
        let (handle, result) = sys.spawn(&filler, 5, &mut rng, 0, |_| {});
        assert_eq!(handle.bin(), FlockBin::Medium);
        assert_eq!(result.count, 4);
        assert_eq!(sys.flock(handle).unwrap().len(), 4);
    }

    proptest! {
        #[test]
        fn capacity_and_eviction_invariants(timeouts in proptest::collection::vec(0i64..10_000, 1..40)) {
            let capacity = 8;
            let mut sys = system(tiny_config(capacity));
            let mut live: Vec<(FlockHandle, i64)> = Vec::new();
            for (i, timeout) in timeouts.into_iter().enumerate() {
                let expected_victim = if live.len() == capacity {
                    live.iter().map(|(_, t)| *t).min()
                } else {
                    None
                };
                let handle = sys.create_flock(FlockBin::Small, i as i64);
                set_timeout(&mut sys, handle, timeout);
                if let Some(min) = expected_victim {
                    let gone: Vec<_> = live.iter().filter(|(h, _)| sys.flock(*h).is_none()).collect();
                    prop_assert_eq!(gone.len(), 1);
                    prop_assert_eq!(gone[0].1, min);
                }
                live.retain(|(h, _)| sys.flock(*h).is_some());
                live.push((handle, timeout));
                prop_assert!(sys.live_flocks(FlockBin::Small) <= capacity);
            }
        }
    }
}
