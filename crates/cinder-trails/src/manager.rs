//! The trail manager: attached table, lingering list, per-frame sweep.
//!
//! ```text
//!            touch_*() every frame
//!   (none) ───────────────────────► attached ──┐ not touched this frame,
//!                                      ▲       │ or detach_entity()
//!                                      └───────┘
//!                                              ▼
//!                                          lingering ──► gone
//!                        flock expired / points aged out / beam faded
//! ```
//!
//! Attached trails are keyed by `(entity, slot)` in insertion order, so
//! the per-frame sweep is deterministic. A trail leaves the attached
//! table exactly once; after that it is only reachable through the
//! lingering list and is never fed again.

use cinder_arena::{ArenaError, FreelistAllocator, SlotHandle};
use cinder_core::{EntityNumber, Particle, RandomGenerator, SceneSink};
use cinder_particles::{FlockBin, FlockHandle, ParticleSystem};
use glam::Vec3;
use indexmap::IndexMap;

use crate::config::{BeamSlot, ParticleTrailSlot, PolyTrailSlot, TrailConfig, TrailSlot};
use crate::geometry::{Beam, BeamParams, ParticleTrailParams, PolyTrail, PolyTrailParams};

/// What one call to [`TrailManager::simulate_frame_and_submit`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrailFrameStats {
    /// Attached trails after the sweep.
    pub attached: usize,
    /// Lingering trails after the sweep.
    pub lingering: usize,
    /// Trails moved from attached to lingering since the previous sweep.
    pub detached: u64,
    /// Lingering trails that ended.
    pub ended: u64,
    /// Poly trails and beams evicted since the previous sweep.
    pub evictions: u64,
    /// Strips and beams handed to the scene.
    pub submitted: usize,
}

#[derive(Clone, Copy, Debug)]
struct ParticleTrail {
    flock: FlockHandle,
    last_drop_point: Vec3,
}

#[derive(Clone, Copy, Debug)]
enum TrailBody {
    Particle(ParticleTrail),
    Poly(SlotHandle),
    Beam(SlotHandle),
}

#[derive(Clone, Copy, Debug)]
struct AttachedTrail {
    touched_at: i64,
    body: TrailBody,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lingering {
    Particle(FlockHandle),
    Poly(SlotHandle),
    Beam(SlotHandle),
}

/// Owns every trail, attached or lingering.
pub struct TrailManager {
    config: TrailConfig,
    attached: IndexMap<(EntityNumber, TrailSlot), AttachedTrail>,
    lingering: Vec<Lingering>,
    polys: FreelistAllocator<PolyTrail>,
    beams: FreelistAllocator<Beam>,
    pending_detached: u64,
    pending_evictions: u64,
}

impl TrailManager {
    /// Build the poly trail and beam pools.
    pub fn new(config: &TrailConfig) -> Result<Self, ArenaError> {
        let points = config.max_points_per_poly_trail;
        let polys = FreelistAllocator::try_new(config.max_poly_trails, || PolyTrail::with_capacity(points))?;
        let beams = FreelistAllocator::try_new(config.max_beams, Beam::new)?;
        let tracked = config.max_poly_trails + config.max_beams;
        log::info!(
            "trail pools: {} poly trails x {} points, {} beams",
            config.max_poly_trails,
            points,
            config.max_beams
        );
        Ok(Self {
            config: *config,
            attached: IndexMap::with_capacity(tracked),
            lingering: Vec::with_capacity(tracked),
            polys,
            beams,
            pending_detached: 0,
            pending_evictions: 0,
        })
    }

    /// The capacities this manager was built with.
    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    // ── Touch ──────────────────────────────────────────────────

    /// Feed the particle trail `slot` of `entity` from its current origin.
    ///
    /// The first touch creates a pinned flock in the trail bin. Later
    /// touches drop particles evenly along the segment walked since the
    /// last drop. A second touch at the same `current_time` does nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn touch_particle_trail(
        &mut self,
        entity: EntityNumber,
        slot: ParticleTrailSlot,
        origin: Vec3,
        current_time: i64,
        params: &ParticleTrailParams,
        particles: &mut ParticleSystem,
        rng: &mut RandomGenerator,
    ) {
        let key = (entity, TrailSlot::Particle(slot));
        if let Some(trail) = self.attached.get_mut(&key) {
            if trail.touched_at == current_time {
                return;
            }
            trail.touched_at = current_time;
            if let TrailBody::Particle(body) = &mut trail.body {
                if particles.flock(body.flock).is_some() {
                    drop_particles(body, origin, current_time, params, particles, rng);
                    return;
                }
                // The flock was evicted under us; start over.
                body.flock = create_trail_flock(particles, params, current_time);
                body.last_drop_point = origin;
                return;
            }
        }
        let flock = create_trail_flock(particles, params, current_time);
        log::trace!("attached {} trail to {entity}", key.1);
        self.attached.insert(
            key,
            AttachedTrail {
                touched_at: current_time,
                body: TrailBody::Particle(ParticleTrail {
                    flock,
                    last_drop_point: origin,
                }),
            },
        );
    }

    /// Record a point of the poly trail `slot` of `entity`.
    pub fn touch_poly_trail(
        &mut self,
        entity: EntityNumber,
        slot: PolyTrailSlot,
        origin: Vec3,
        current_time: i64,
        params: &PolyTrailParams,
    ) {
        let key = (entity, TrailSlot::Poly(slot));
        if let Some(AttachedTrail {
            touched_at,
            body: TrailBody::Poly(handle),
        }) = self.attached.get_mut(&key)
        {
            *touched_at = current_time;
            if let Some(trail) = self.polys.get_mut(*handle) {
                trail.record(origin, current_time);
                return;
            }
            // Evicted: fall through and allocate a fresh one.
        }
        let (handle, evicted) = self.polys.alloc_or_evict(PolyTrail::expires_at, |_| {});
        if evicted {
            self.pending_evictions += 1;
        }
        if let Some(trail) = self.polys.get_mut(handle) {
            trail.reset(params);
            trail.record(origin, current_time);
        }
        if !self.attached.contains_key(&key) {
            log::trace!("attached {} trail to {entity}", key.1);
        }
        self.attached.insert(
            key,
            AttachedTrail {
                touched_at: current_time,
                body: TrailBody::Poly(handle),
            },
        );
    }

    /// Attach or move the beam `slot` of `entity`.
    pub fn update_beam(
        &mut self,
        entity: EntityNumber,
        slot: BeamSlot,
        from: Vec3,
        to: Vec3,
        current_time: i64,
        params: &BeamParams,
    ) {
        let key = (entity, TrailSlot::Beam(slot));
        if let Some(AttachedTrail {
            touched_at,
            body: TrailBody::Beam(handle),
        }) = self.attached.get_mut(&key)
        {
            *touched_at = current_time;
            if let Some(beam) = self.beams.get_mut(*handle) {
                beam.set_endpoints(from, to);
                return;
            }
        }
        let handle = self.alloc_beam(from, to, params);
        if !self.attached.contains_key(&key) {
            log::trace!("attached {} beam to {entity}", key.1);
        }
        self.attached.insert(
            key,
            AttachedTrail {
                touched_at: current_time,
                body: TrailBody::Beam(handle),
            },
        );
    }

    /// A beam that starts fading immediately and belongs to no entity.
    pub fn spawn_lingering_beam(&mut self, from: Vec3, to: Vec3, current_time: i64, params: &BeamParams) {
        let handle = self.alloc_beam(from, to, params);
        if let Some(beam) = self.beams.get_mut(handle) {
            beam.start_fading(current_time);
        }
        self.lingering.push(Lingering::Beam(handle));
    }

    fn alloc_beam(&mut self, from: Vec3, to: Vec3, params: &BeamParams) -> SlotHandle {
        let (handle, evicted) = self.beams.alloc_or_evict(Beam::expires_at, |_| {});
        if evicted {
            self.pending_evictions += 1;
        }
        if let Some(beam) = self.beams.get_mut(handle) {
            beam.reset(from, to, params);
        }
        handle
    }

    /// Move every trail of `entity` to the lingering list.
    pub fn detach_entity(&mut self, entity: EntityNumber, current_time: i64, particles: &mut ParticleSystem) {
        let Self {
            attached,
            lingering,
            polys,
            beams,
            pending_detached,
            ..
        } = self;
        attached.retain(|(owner, slot), trail| {
            if *owner != entity {
                return true;
            }
            log::trace!("detached {slot} trail from {owner}");
            lingering.push(detach(trail.body, current_time, particles, polys, beams));
            *pending_detached += 1;
            false
        });
    }

    // ── Frame ──────────────────────────────────────────────────

    /// Detach every trail not touched at `current_time`, retire finished
    /// lingering trails, and submit poly trails and beams.
    pub fn simulate_frame_and_submit(
        &mut self,
        current_time: i64,
        particles: &mut ParticleSystem,
        scene: &mut dyn SceneSink,
    ) -> TrailFrameStats {
        let mut stats = TrailFrameStats {
            detached: std::mem::take(&mut self.pending_detached),
            evictions: std::mem::take(&mut self.pending_evictions),
            ..Default::default()
        };

        let Self {
            attached,
            lingering,
            polys,
            beams,
            ..
        } = self;

        attached.retain(|(owner, slot), trail| {
            if trail.touched_at >= current_time {
                return true;
            }
            log::trace!("detached {slot} trail from {owner}");
            lingering.push(detach(trail.body, current_time, particles, polys, beams));
            stats.detached += 1;
            false
        });

        lingering.retain(|trail| {
            let alive = match *trail {
                Lingering::Particle(flock) => particles.flock(flock).is_some(),
                Lingering::Poly(handle) => {
                    match polys.get_mut(handle).map(|poly| poly.expire_points(current_time)) {
                        Some(true) => true,
                        Some(false) => {
                            polys.free(handle);
                            false
                        }
                        None => false,
                    }
                }
                Lingering::Beam(handle) => {
                    match beams.get(handle).map(|beam| beam.expires_at() > current_time) {
                        Some(true) => true,
                        Some(false) => {
                            beams.free(handle);
                            false
                        }
                        None => false,
                    }
                }
            };
            if !alive {
                stats.ended += 1;
            }
            alive
        });

        for (_, poly) in polys.iter() {
            if poly.submit(scene, current_time) {
                stats.submitted += 1;
            }
        }
        for (_, beam) in beams.iter() {
            if beam.submit(scene, current_time) {
                stats.submitted += 1;
            }
        }

        stats.attached = attached.len();
        stats.lingering = lingering.len();
        stats
    }

    // ── Queries ────────────────────────────────────────────────

    /// Whether `(entity, slot)` has an attached trail.
    pub fn is_attached(&self, entity: EntityNumber, slot: impl Into<TrailSlot>) -> bool {
        self.attached.contains_key(&(entity, slot.into()))
    }

    /// Flock of an attached particle trail.
    pub fn particle_trail_flock(&self, entity: EntityNumber, slot: ParticleTrailSlot) -> Option<FlockHandle> {
        match self.attached.get(&(entity, TrailSlot::Particle(slot)))?.body {
            TrailBody::Particle(body) => Some(body.flock),
            _ => None,
        }
    }

    /// Attached poly trail of an entity.
    pub fn poly_trail(&self, entity: EntityNumber, slot: PolyTrailSlot) -> Option<&PolyTrail> {
        match self.attached.get(&(entity, TrailSlot::Poly(slot)))?.body {
            TrailBody::Poly(handle) => self.polys.get(handle),
            _ => None,
        }
    }

    /// Attached beam of an entity.
    pub fn beam(&self, entity: EntityNumber, slot: BeamSlot) -> Option<&Beam> {
        match self.attached.get(&(entity, TrailSlot::Beam(slot)))?.body {
            TrailBody::Beam(handle) => self.beams.get(handle),
            _ => None,
        }
    }

    /// Attached trails.
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Lingering trails.
    pub fn lingering_count(&self) -> usize {
        self.lingering.len()
    }
}

fn create_trail_flock(particles: &mut ParticleSystem, params: &ParticleTrailParams, current_time: i64) -> FlockHandle {
    let handle = particles.create_flock(FlockBin::Trail, current_time);
    if let Some(flock) = particles.flock_mut(handle) {
        flock.appearance = params.appearance;
        flock.collision_mask = params.collision_mask;
        flock.pin();
    }
    handle
}

fn drop_particles(
    trail: &mut ParticleTrail,
    origin: Vec3,
    current_time: i64,
    params: &ParticleTrailParams,
    particles: &mut ParticleSystem,
    rng: &mut RandomGenerator,
) {
    let segment = origin - trail.last_drop_point;
    let distance = segment.length();
    if params.drop_distance <= 0.0 {
        return;
    }
    let count = ((distance / params.drop_distance).floor() as u32).min(params.max_particles_per_drop);
    if count == 0 {
        return;
    }
    let Some(flock) = particles.flock_mut(trail.flock) else {
        return;
    };
    let appearance = flock.appearance;
    let timeout_at = current_time + i64::from(params.particle_lifetime_ms);
    let palette_len = appearance.colors.len().clamp(1, usize::from(u8::MAX) + 1) as u32;
    for k in 1..=count {
        let point = trail.last_drop_point + segment * (k as f32 / count as f32);
        let mut p = Particle::new(point, current_time, timeout_at);
        p.velocity = rng.next_unit_vector() * params.speed;
        p.accel = params.accel;
        p.bounces_left = params.bounces;
        p.instance_color_index = rng.next_bounded(palette_len) as u8;
        p.instance_radius = 1.0 + appearance.radius_spread * rng.next_float();
        let color = match appearance.color_lifespan {
            Some(lifespan) => lifespan.color_at(0.0),
            None => appearance.base_color(&p),
        };
        if !flock.try_add_particle(p, color) {
            break;
        }
    }
    trail.last_drop_point = origin;
}

fn detach(
    body: TrailBody,
    current_time: i64,
    particles: &mut ParticleSystem,
    polys: &mut FreelistAllocator<PolyTrail>,
    beams: &mut FreelistAllocator<Beam>,
) -> Lingering {
    match body {
        TrailBody::Particle(trail) => {
            if let Some(flock) = particles.flock_mut(trail.flock) {
                flock.unpin(current_time);
            }
            Lingering::Particle(trail.flock)
        }
        TrailBody::Poly(handle) => {
            if let Some(poly) = polys.get_mut(handle) {
                poly.detach();
            }
            Lingering::Poly(handle)
        }
        TrailBody::Beam(handle) => {
            if let Some(beam) = beams.get_mut(handle) {
                beam.start_fading(current_time);
            }
            Lingering::Beam(handle)
        }
    }
}
