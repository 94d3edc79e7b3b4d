//! Strongly-typed identifiers shared across the façades.

use std::fmt;

/// Number of a game entity as known to the host (projectile, player, ...).
///
/// Trails are keyed by `(EntityNumber, slot)`; collision traces may be
/// asked to ignore one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityNumber(pub u32);

impl fmt::Display for EntityNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityNumber {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Opaque material handle resolved by the renderer.
///
/// Asset loading is outside the simulation; effects only carry the handle
/// through to the scene submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material:{}", self.0)
    }
}

/// Opaque id of a collision shape, meaningful only to the
/// [`CollisionWorld`](crate::CollisionWorld) that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape:{}", self.0)
    }
}
