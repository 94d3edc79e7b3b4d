//! Collision query façade consumed by the simulation engines.
//!
//! The host game owns the world geometry. Simulation code only ever sees
//! it through [`CollisionWorld`]: single traces for spawn-time raycasts,
//! and a two-phase batched query for the per-frame hot path:
//!
//! ```text
//! build_and_clip_shape_list(list, bounds_of_all_new_positions)   // once per flock/hull
//! for each particle/vertex:
//!     trace_against_shape_list(list, old, new)                   // narrow phase
//! ```

use glam::Vec3;
use smallvec::SmallVec;

use crate::contents::{ContentFlags, SurfaceFlags};
use crate::error::CoreError;
use crate::id::{EntityNumber, ShapeId};
use crate::math::Aabb;

/// Result of clipping a segment (or swept box) against world geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trace {
    /// Fraction of the segment travelled before impact; `1.0` means clear.
    pub fraction: f32,
    /// Where the trace stopped.
    pub end_pos: Vec3,
    /// Normal of the impacted plane (zero when clear).
    pub normal: Vec3,
    /// Contents of the impacted volume.
    pub contents: ContentFlags,
    /// Surface attributes of the impacted plane.
    pub surface: SurfaceFlags,
    /// The start point was inside a solid.
    pub start_solid: bool,
    /// The whole segment was inside a solid.
    pub all_solid: bool,
    /// Entity that was hit, if any.
    pub entity: Option<EntityNumber>,
}

impl Trace {
    /// An unobstructed trace ending at `end`.
    pub fn clear(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_pos: end,
            normal: Vec3::ZERO,
            contents: ContentFlags::empty(),
            surface: SurfaceFlags::empty(),
            start_solid: false,
            all_solid: false,
            entity: None,
        }
    }

    /// Whether anything was hit along the way.
    pub fn is_blocked(&self) -> bool {
        self.fraction < 1.0 || self.start_solid
    }
}

/// Reusable broad-phase cache of the shapes near some bounds.
///
/// A shape list is scratch storage: it is rebuilt every frame by
/// [`CollisionWorld::build_and_clip_shape_list`] and then consulted for
/// every particle or vertex of one owner. Lists are pooled (see
/// `cinder-arena`) and never shared between two live owners.
#[derive(Clone, Debug, Default)]
pub struct ShapeList {
    shapes: SmallVec<[ShapeId; 16]>,
    bounds: Option<Aabb>,
}

impl ShapeList {
    /// Create an empty list with room for `capacity` shapes.
    ///
    /// Fails only if the backing storage cannot be reserved.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, CoreError> {
        let mut shapes = SmallVec::new();
        shapes
            .try_reserve_exact(capacity)
            .map_err(|_| CoreError::ShapeListAllocation { capacity })?;
        Ok(Self {
            shapes,
            bounds: None,
        })
    }

    /// Forget all shapes; keeps the storage.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.bounds = None;
    }

    /// Record the bounds this list is being built for.
    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = Some(bounds);
    }

    /// The bounds of the last build, if any.
    pub fn bounds(&self) -> Option<&Aabb> {
        self.bounds.as_ref()
    }

    /// Append a shape.
    pub fn push(&mut self, shape: ShapeId) {
        self.shapes.push(shape);
    }

    /// Shapes in build order.
    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    /// Number of cached shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether nothing is nearby.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// World geometry queries provided by the host.
///
/// Implementations must be deterministic for a fixed world; the engines
/// make no assumption about how shapes are stored.
pub trait CollisionWorld {
    /// Sweep a box (`mins`/`maxs` relative to the moving point) from
    /// `start` to `end`. Zero extents give a point trace.
    fn trace(
        &self,
        start: Vec3,
        end: Vec3,
        mins: Vec3,
        maxs: Vec3,
        ignore: Option<EntityNumber>,
        mask: ContentFlags,
    ) -> Trace;

    /// Fill `list` with every shape matching `mask` that touches `bounds`.
    ///
    /// The list is cleared first.
    fn build_and_clip_shape_list(&self, list: &mut ShapeList, bounds: &Aabb, mask: ContentFlags);

    /// Clip the segment `start → end` against the shapes cached in `list` only.
    fn trace_against_shape_list(
        &self,
        list: &ShapeList,
        start: Vec3,
        end: Vec3,
        mask: ContentFlags,
    ) -> Trace;

    /// Contents of the world at a point.
    fn point_contents(&self, point: Vec3, mask: ContentFlags) -> ContentFlags;
}

/// Convenience: a point trace with no ignored entity.
pub fn trace_point(
    world: &dyn CollisionWorld,
    start: Vec3,
    end: Vec3,
    mask: ContentFlags,
) -> Trace {
    world.trace(start, end, Vec3::ZERO, Vec3::ZERO, None, mask)
}
