//! A small analytic collision world.

use std::cell::Cell;

use cinder_core::{
    Aabb, CollisionWorld, ContentFlags, EntityNumber, ShapeId, ShapeList, SurfaceFlags, Trace,
};
use glam::Vec3;

/// Distance traces stop short of a surface, so that a follow-up trace
/// starting at the impact point does not begin inside the solid.
pub const DIST_EPSILON: f32 = 0.031_25;

/// One solid in the mock world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MockShape {
    /// Everything with `normal · p < dist` is inside.
    HalfSpace {
        /// Unit normal pointing out of the solid.
        normal: Vec3,
        /// Plane offset along `normal`.
        dist: f32,
    },
    /// An axis-aligned box.
    Box(Aabb),
}

#[derive(Clone, Debug)]
struct Entry {
    shape: MockShape,
    contents: ContentFlags,
    surface: SurfaceFlags,
    entity: Option<EntityNumber>,
}

/// Collision world made of half-spaces and boxes.
///
/// Query counters let tests check that the engines batch their
/// broad-phase work.
#[derive(Debug, Default)]
pub struct MockCollisionWorld {
    entries: Vec<Entry>,
    shape_list_builds: Cell<usize>,
    traces: Cell<usize>,
}

impl MockCollisionWorld {
    /// An empty world; every trace runs clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// A solid floor: everything below `z` is solid.
    pub fn with_floor(z: f32) -> Self {
        let mut world = Self::new();
        world.add_half_space(Vec3::Z, z, ContentFlags::SOLID, SurfaceFlags::empty());
        world
    }

    /// Add a half-space solid below the plane `normal · p = dist`.
    ///
    /// `normal` is normalised before use.
    pub fn add_half_space(
        &mut self,
        normal: Vec3,
        dist: f32,
        contents: ContentFlags,
        surface: SurfaceFlags,
    ) -> ShapeId {
        self.push(MockShape::HalfSpace { normal: normal.normalize(), dist }, contents, surface)
    }

    /// Add an axis-aligned box spanning `mins..maxs`.
    pub fn add_box(
        &mut self,
        mins: Vec3,
        maxs: Vec3,
        contents: ContentFlags,
        surface: SurfaceFlags,
    ) -> ShapeId {
        self.push(MockShape::Box(Aabb::new(mins, maxs)), contents, surface)
    }

    /// Tag the last added shape as belonging to an entity.
    pub fn owned_by(&mut self, entity: EntityNumber) -> &mut Self {
        if let Some(last) = self.entries.last_mut() {
            last.entity = Some(entity);
        }
        self
    }

    /// Number of `build_and_clip_shape_list` calls since the last reset.
    pub fn shape_list_builds(&self) -> usize {
        self.shape_list_builds.get()
    }

    /// Number of traces run since the last reset, shape-list traces included.
    pub fn trace_count(&self) -> usize {
        self.traces.get()
    }

    /// Zero both query counters.
    pub fn reset_counters(&self) {
        self.shape_list_builds.set(0);
        self.traces.set(0);
    }

    fn push(&mut self, shape: MockShape, contents: ContentFlags, surface: SurfaceFlags) -> ShapeId {
        let id = ShapeId(self.entries.len() as u32);
        self.entries.push(Entry {
            shape,
            contents,
            surface,
            entity: None,
        });
        id
    }

    fn trace_entries<'a>(
        &self,
        entries: impl Iterator<Item = &'a Entry>,
        start: Vec3,
        end: Vec3,
        mins: Vec3,
        maxs: Vec3,
    ) -> Trace {
        self.traces.set(self.traces.get() + 1);
        let mut best = Trace::clear(end);
        for entry in entries {
            let Some(hit) = clip(&entry.shape, start, end, mins, maxs) else {
                continue;
            };
            if hit.fraction < best.fraction || (hit.start_solid && !best.start_solid) {
                best = Trace {
                    fraction: hit.fraction,
                    end_pos: start + (end - start) * hit.fraction,
                    normal: hit.normal,
                    contents: entry.contents,
                    surface: entry.surface,
                    start_solid: hit.start_solid,
                    all_solid: hit.all_solid,
                    entity: entry.entity,
                };
            }
        }
        best
    }
}

struct Hit {
    fraction: f32,
    normal: Vec3,
    start_solid: bool,
    all_solid: bool,
}

fn clip(shape: &MockShape, start: Vec3, end: Vec3, mins: Vec3, maxs: Vec3) -> Option<Hit> {
    match *shape {
        MockShape::HalfSpace { normal, dist } => {
            // Minkowski sum: move the plane out by the box's support along -normal.
            let support = normal.x * if normal.x > 0.0 { mins.x } else { maxs.x }
                + normal.y * if normal.y > 0.0 { mins.y } else { maxs.y }
                + normal.z * if normal.z > 0.0 { mins.z } else { maxs.z };
            let d1 = normal.dot(start) + support - dist;
            let d2 = normal.dot(end) + support - dist;
            if d1 < 0.0 {
                return Some(Hit {
                    fraction: 0.0,
                    normal,
                    start_solid: true,
                    all_solid: d2 < 0.0,
                });
            }
            if d2 >= 0.0 {
                return None;
            }
            let fraction = ((d1 - DIST_EPSILON) / (d1 - d2)).clamp(0.0, 1.0);
            Some(Hit {
                fraction,
                normal,
                start_solid: false,
                all_solid: false,
            })
        }
        MockShape::Box(aabb) => {
            let grown = Aabb::new(aabb.mins - maxs, aabb.maxs - mins);
            clip_box(&grown, start, end)
        }
    }
}

fn clip_box(aabb: &Aabb, start: Vec3, end: Vec3) -> Option<Hit> {
    let inside_start = strictly_inside(aabb, start);
    if inside_start {
        return Some(Hit {
            fraction: 0.0,
            normal: Vec3::ZERO,
            start_solid: true,
            all_solid: strictly_inside(aabb, end),
        });
    }
    let delta = end - start;
    let length = delta.length();
    let mut enter = f32::NEG_INFINITY;
    let mut leave = f32::INFINITY;
    let mut normal = Vec3::ZERO;
    for axis in 0..3 {
        let (s, d, lo, hi) = (start[axis], delta[axis], aabb.mins[axis], aabb.maxs[axis]);
        if d.abs() < f32::EPSILON {
            if s <= lo || s >= hi {
                return None;
            }
            continue;
        }
        let (t0, t1, n) = if d > 0.0 {
            ((lo - s) / d, (hi - s) / d, -1.0)
        } else {
            ((hi - s) / d, (lo - s) / d, 1.0)
        };
        if t0 > enter {
            enter = t0;
            normal = Vec3::ZERO;
            normal[axis] = n;
        }
        leave = leave.min(t1);
    }
    if enter > leave || !(0.0..1.0).contains(&enter) {
        return None;
    }
    let back_off = if length > 0.0 { DIST_EPSILON / length } else { 0.0 };
    Some(Hit {
        fraction: (enter - back_off).max(0.0),
        normal,
        start_solid: false,
        all_solid: false,
    })
}

fn strictly_inside(aabb: &Aabb, p: Vec3) -> bool {
    p.x > aabb.mins.x
        && p.x < aabb.maxs.x
        && p.y > aabb.mins.y
        && p.y < aabb.maxs.y
        && p.z > aabb.mins.z
        && p.z < aabb.maxs.z
}

fn touches(shape: &MockShape, bounds: &Aabb) -> bool {
    match shape {
        MockShape::HalfSpace { normal, dist } => {
            let nearest = Vec3::new(
                if normal.x > 0.0 { bounds.mins.x } else { bounds.maxs.x },
                if normal.y > 0.0 { bounds.mins.y } else { bounds.maxs.y },
                if normal.z > 0.0 { bounds.mins.z } else { bounds.maxs.z },
            );
            normal.dot(nearest) <= *dist + DIST_EPSILON
        }
        MockShape::Box(aabb) => aabb.intersects(bounds),
    }
}

fn inside(shape: &MockShape, p: Vec3) -> bool {
    match shape {
        MockShape::HalfSpace { normal, dist } => normal.dot(p) < *dist,
        MockShape::Box(aabb) => strictly_inside(aabb, p),
    }
}

impl CollisionWorld for MockCollisionWorld {
    fn trace(
        &self,
        start: Vec3,
        end: Vec3,
        mins: Vec3,
        maxs: Vec3,
        ignore: Option<EntityNumber>,
        mask: ContentFlags,
    ) -> Trace {
        let entries = self
            .entries
            .iter()
            .filter(|e| e.contents.intersects(mask))
            .filter(|e| ignore.is_none() || e.entity != ignore);
        self.trace_entries(entries, start, end, mins, maxs)
    }

    fn build_and_clip_shape_list(&self, list: &mut ShapeList, bounds: &Aabb, mask: ContentFlags) {
        self.shape_list_builds.set(self.shape_list_builds.get() + 1);
        list.clear();
        list.set_bounds(*bounds);
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.contents.intersects(mask) && touches(&entry.shape, bounds) {
                list.push(ShapeId(i as u32));
            }
        }
    }

    fn trace_against_shape_list(
        &self,
        list: &ShapeList,
        start: Vec3,
        end: Vec3,
        mask: ContentFlags,
    ) -> Trace {
        let entries = list
            .shapes()
            .iter()
            .filter_map(|id| self.entries.get(id.0 as usize))
            .filter(|e| e.contents.intersects(mask));
        self.trace_entries(entries, start, end, Vec3::ZERO, Vec3::ZERO)
    }

    fn point_contents(&self, point: Vec3, mask: ContentFlags) -> ContentFlags {
        self.entries
            .iter()
            .filter(|e| e.contents.intersects(mask) && inside(&e.shape, point))
            .fold(ContentFlags::empty(), |acc, e| acc | e.contents)
    }
}
