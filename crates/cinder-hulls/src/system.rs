//! The hull pools: spawn, eviction, per-frame sweep and submission.

use std::fmt;

use cinder_arena::{ArenaError, FreelistAllocator, ScratchPool, SlotHandle};
use cinder_core::color::is_transparent;
use cinder_core::{
    Aabb, CollisionWorld, MeshPart, RandomGenerator, Rgba8, SceneSink, ShapeList, ViewParams,
};
use glam::Vec3;

use crate::concentric::{ConcentricHull, ConcentricHullParams};
use crate::config::{HullConfig, HullKind};
use crate::lod::LodConfig;
use crate::regular::{RegularHull, RegularHullParams};
use crate::topology::SharedTopology;

/// Generation-checked reference to a live hull.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct HullHandle {
    kind: HullKind,
    slot: SlotHandle,
}

impl HullHandle {
    /// Pool the hull lives in.
    pub fn kind(&self) -> HullKind {
        self.kind
    }
}

impl fmt::Display for HullHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HullHandle({}, {})", self.kind, self.slot)
    }
}

/// What one call to [`HullSystem::simulate`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HullFrameStats {
    /// Fire hulls alive after the sweep.
    pub live_fire: usize,
    /// Smoke hulls alive after the sweep.
    pub live_smoke: usize,
    /// Wave hulls alive after the sweep.
    pub live_wave: usize,
    /// Hulls destroyed because their lifetime ran out.
    pub expired: u64,
    /// Hulls evicted by spawns since the previous sweep.
    pub evictions: u64,
}

impl HullFrameStats {
    /// Live hulls over all pools.
    pub fn live_hulls(&self) -> usize {
        self.live_fire + self.live_smoke + self.live_wave
    }
}

/// Owns the fire, smoke and wave pools.
pub struct HullSystem {
    config: HullConfig,
    lod: LodConfig,
    topology: SharedTopology,
    fire: FreelistAllocator<ConcentricHull>,
    smoke: FreelistAllocator<RegularHull>,
    wave: FreelistAllocator<RegularHull>,
    shape_lists: ScratchPool<ShapeList>,
    pending_evictions: u64,
    total_evictions: u64,
}

impl HullSystem {
    /// Build every pool with its vertex buffers sized up front.
    ///
    /// Subdivision levels above the topology's finest level are clamped;
    /// validating them is the caller's job.
    pub fn new(
        config: &HullConfig,
        lod: LodConfig,
        topology: SharedTopology,
        shape_lists: ScratchPool<ShapeList>,
    ) -> Result<Self, ArenaError> {
        let level_of = |kind: HullKind| config.pool(kind).subdiv_level as usize;

        let fire_level = level_of(HullKind::Fire);
        let fire = FreelistAllocator::try_new(config.fire.capacity, || {
            ConcentricHull::with_level(
                topology.level(fire_level),
                fire_level,
                config.fire.num_layers as usize,
            )
        })?;
        let regular = |kind: HullKind| {
            let level = level_of(kind);
            FreelistAllocator::try_new(config.pool(kind).capacity, || {
                RegularHull::with_level(topology.level(level), level)
            })
        };
        let smoke = regular(HullKind::Smoke)?;
        let wave = regular(HullKind::Wave)?;

        for kind in HullKind::ALL {
            let pool = config.pool(kind);
            log::info!(
                "hull pool {kind}: {} hulls at level {} ({} vertices)",
                pool.capacity,
                pool.subdiv_level,
                topology.level(pool.subdiv_level as usize).num_vertices()
            );
        }
        Ok(Self {
            config: *config,
            lod,
            topology,
            fire,
            smoke,
            wave,
            shape_lists,
            pending_evictions: 0,
            total_evictions: 0,
        })
    }

    /// The configuration this system was built with.
    pub fn config(&self) -> &HullConfig {
        &self.config
    }

    // ── Spawning ───────────────────────────────────────────────

    /// Spawn a concentric fire hull, evicting the oldest if the pool is full.
    ///
    /// Obstacle limits are traced here, once per vertex direction.
    pub fn spawn_fire_hull(
        &mut self,
        world: &dyn CollisionWorld,
        origin: Vec3,
        params: &ConcentricHullParams,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> HullHandle {
        let (slot, evicted) = self.fire.alloc_or_evict(|h| h.spawn_time(), |_| {});
        if evicted {
            self.pending_evictions += 1;
            self.total_evictions += 1;
        }
        let level = self.topology.level(self.config.fire.subdiv_level as usize);
        if let Some(hull) = self.fire.get_mut(slot) {
            hull.spawn(world, level, origin, params, rng, current_time);
        }
        HullHandle {
            kind: HullKind::Fire,
            slot,
        }
    }

    /// Spawn a regular smoke hull.
    pub fn spawn_smoke_hull(
        &mut self,
        origin: Vec3,
        params: &RegularHullParams,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> HullHandle {
        self.spawn_regular(HullKind::Smoke, origin, params, rng, current_time)
    }

    /// Spawn a regular shockwave hull.
    pub fn spawn_wave_hull(
        &mut self,
        origin: Vec3,
        params: &RegularHullParams,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> HullHandle {
        self.spawn_regular(HullKind::Wave, origin, params, rng, current_time)
    }

    fn spawn_regular(
        &mut self,
        kind: HullKind,
        origin: Vec3,
        params: &RegularHullParams,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> HullHandle {
        let pool = match kind {
            HullKind::Wave => &mut self.wave,
            _ => &mut self.smoke,
        };
        let (slot, evicted) = pool.alloc_or_evict(|h| h.spawn_time(), RegularHull::release);
        if evicted {
            self.pending_evictions += 1;
            self.total_evictions += 1;
        }
        let level = self.topology.level(self.config.pool(kind).subdiv_level as usize);
        let lease = self.shape_lists.acquire();
        if let Some(hull) = pool.get_mut(slot) {
            hull.spawn(level, origin, params, rng, current_time, lease);
        }
        HullHandle { kind, slot }
    }

    // ── Access ─────────────────────────────────────────────────

    /// A live fire hull; `None` for other kinds or once it is gone.
    pub fn concentric(&self, handle: HullHandle) -> Option<&ConcentricHull> {
        match handle.kind {
            HullKind::Fire => self.fire.get(handle.slot),
            _ => None,
        }
    }

    /// A live smoke or wave hull; `None` for fire or once it is gone.
    pub fn regular(&self, handle: HullHandle) -> Option<&RegularHull> {
        match handle.kind {
            HullKind::Fire => None,
            HullKind::Smoke => self.smoke.get(handle.slot),
            HullKind::Wave => self.wave.get(handle.slot),
        }
    }

    /// Whether `handle` still refers to a live hull.
    pub fn contains(&self, handle: HullHandle) -> bool {
        match handle.kind {
            HullKind::Fire => self.fire.contains(handle.slot),
            HullKind::Smoke => self.smoke.contains(handle.slot),
            HullKind::Wave => self.wave.contains(handle.slot),
        }
    }

    /// Live hulls of one kind.
    pub fn live_hulls(&self, kind: HullKind) -> usize {
        match kind {
            HullKind::Fire => self.fire.len(),
            HullKind::Smoke => self.smoke.len(),
            HullKind::Wave => self.wave.len(),
        }
    }

    /// Evictions since construction.
    pub fn total_evictions(&self) -> u64 {
        self.total_evictions
    }

    // ── Frame ──────────────────────────────────────────────────

    /// Advance every hull to `current_time`, pools in declared order.
    ///
    /// Hulls whose lifetime has run out are destroyed instead.
    pub fn simulate(
        &mut self,
        world: &dyn CollisionWorld,
        rng: &mut RandomGenerator,
        current_time: i64,
    ) -> HullFrameStats {
        let mut stats = HullFrameStats {
            evictions: std::mem::take(&mut self.pending_evictions),
            ..Default::default()
        };

        let level = self.topology.level(self.config.fire.subdiv_level as usize);
        let mut cursor = self.fire.first_live();
        while let Some(slot) = cursor {
            cursor = self.fire.next_live(slot);
            let Some(hull) = self.fire.get_mut(slot) else {
                continue;
            };
            if hull.is_expired(current_time) {
                self.fire.free(slot);
                stats.expired += 1;
                continue;
            }
            hull.simulate(level, rng, current_time);
        }

        for kind in [HullKind::Smoke, HullKind::Wave] {
            let pool = match kind {
                HullKind::Wave => &mut self.wave,
                _ => &mut self.smoke,
            };
            let level = self.topology.level(self.config.pool(kind).subdiv_level as usize);
            let tuning = &self.config.tuning;
            let mut cursor = pool.first_live();
            while let Some(slot) = cursor {
                cursor = pool.next_live(slot);
                let Some(hull) = pool.get_mut(slot) else {
                    continue;
                };
                if hull.is_expired(current_time) {
                    hull.release();
                    pool.free(slot);
                    stats.expired += 1;
                    continue;
                }
                hull.simulate(world, level, tuning, rng, current_time);
            }
        }

        stats.live_fire = self.fire.len();
        stats.live_smoke = self.smoke.len();
        stats.live_wave = self.wave.len();
        stats
    }

    /// Submit every visible hull with the LOD chosen for `view`.
    ///
    /// Returns how many meshes were submitted.
    pub fn submit(&self, scene: &mut dyn SceneSink, view: &ViewParams) -> usize {
        let mut submitted = 0;

        for (_, hull) in self.fire.iter() {
            let bounds = hull.bounds();
            let indices = self.lod_indices(hull.subdiv_level(), &bounds, view);
            let parts = hull.mesh_parts(indices);
            if parts.is_empty() || parts.iter().all(|p| all_transparent(p.colors)) {
                continue;
            }
            scene.add_external_mesh(bounds.mins, bounds.maxs, &parts);
            submitted += 1;
        }

        for pool in [&self.smoke, &self.wave] {
            for (_, hull) in pool.iter() {
                if all_transparent(hull.colors()) {
                    continue;
                }
                let bounds = hull.bounds();
                let indices = self.lod_indices(hull.subdiv_level(), &bounds, view);
                let part = MeshPart {
                    positions: hull.positions(),
                    colors: hull.colors(),
                    indices,
                    material: hull.params().material,
                };
                scene.add_external_mesh(bounds.mins, bounds.maxs, &[part]);
                submitted += 1;
            }
        }
        submitted
    }

    fn lod_indices(&self, level: usize, bounds: &Aabb, view: &ViewParams) -> &[u16] {
        let radius = (bounds.maxs - bounds.mins).length() * 0.5;
        let chosen = self.lod.select_level(level, bounds.center(), radius, view);
        self.topology.level(chosen).indices()
    }
}

fn all_transparent(colors: &[Rgba8]) -> bool {
    colors.iter().all(is_transparent)
}
