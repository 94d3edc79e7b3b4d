//! Core types and façades for the Cinder effects simulation.
//!
//! Apart from wrapping `cinder-arena` errors, nothing here depends on
//! other workspace crates. It defines the vocabulary shared by every
//! simulation engine in the workspace: bounds and colors, particle data,
//! content flags, the collision and scene façades consumed from the host
//! game, the local random generator, and the color/opacity timeline
//! state machine.
//!
//! # Time
//!
//! Every API takes an absolute, monotonic millisecond timestamp as `i64`.
//! Nothing in the workspace reads the wall clock.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collision;
pub mod color;
pub mod contents;
pub mod error;
pub mod id;
pub mod math;
pub mod particle;
pub mod rng;
pub mod scene;
pub mod time;
pub mod timeline;

pub use collision::{CollisionWorld, ShapeList, Trace};
pub use color::{ColorLifespan, Rgba8};
pub use contents::{ContentFlags, SurfaceFlags};
pub use error::CoreError;
pub use id::{EntityNumber, MaterialId, ShapeId};
pub use math::Aabb;
pub use particle::{AppearanceRules, LightRules, Particle, ParticleKind};
pub use rng::RandomGenerator;
pub use scene::{
    EntitySubmission, MeshPart, ParticleSubmission, PolySubmission, SceneSink, ViewParams,
};
pub use timeline::{
    advance_color_timeline, advance_color_timeline_with, ColorChangeState, ColorTimelineNode,
};

/// Re-exported so downstream crates agree on a single vector type.
pub use glam::Vec3;
