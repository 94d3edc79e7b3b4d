//! Cinder: pooled visual effects for real-time shooters.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Cinder sub-crates. For most users, adding `cinder` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cinder::prelude::*;
//! use cinder_test_utils::{MockCollisionWorld, RecordingScene};
//!
//! let world = MockCollisionWorld::with_floor(0.0);
//! let mut scene = RecordingScene::new();
//! let mut fx = EffectsSystem::new(EffectsConfig::default()).unwrap();
//!
//! fx.spawn_rocket_explosion_effect(&world, Vec3::new(0.0, 0.0, 16.0), Vec3::Z, 1000);
//! fx.touch_grenade_trail(EntityNumber(7), Vec3::new(64.0, 0.0, 32.0), 1016);
//!
//! let metrics = fx.simulate_frame_and_submit(&world, &ViewParams::default(), &mut scene, 1016);
//! assert!(metrics.live_flocks > 0);
//! assert_eq!(metrics.attached_trails, 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `cinder-arena` | Freelist allocator, slot handles, scratch pool |
//! | [`types`] | `cinder-core` | IDs, flags, particles, color timeline, façade traits |
//! | [`particles`] | `cinder-particles` | Flock bins, fillers, particle simulation |
//! | [`hulls`] | `cinder-hulls` | Icosphere topology, regular and concentric hulls |
//! | [`trails`] | `cinder-trails` | Entity-attached particle trails, poly trails, beams |
//! | [`engine`] | `cinder-engine` | `EffectsSystem`, configuration, presets, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Fixed-capacity storage (`cinder-arena`).
///
/// [`arena::FreelistAllocator`] backs every effect pool.
pub use cinder_arena as arena;

/// Core types and façade traits (`cinder-core`).
///
/// The host engine implements [`types::CollisionWorld`] and
/// [`types::SceneSink`].
pub use cinder_core as types;

/// Particle flocks (`cinder-particles`).
pub use cinder_particles as particles;

/// Deforming icosphere hulls (`cinder-hulls`).
///
/// [`hulls::RegularHull`] for smoke puffs, [`hulls::ConcentricHull`] for
/// layered fireballs.
pub use cinder_hulls as hulls;

/// Entity-attached trails and beams (`cinder-trails`).
pub use cinder_trails as trails;

/// The effects façade (`cinder-engine`).
pub use cinder_engine as engine;

/// Common imports for typical Cinder usage.
///
/// ```rust
/// use cinder::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use cinder_core::{
        AppearanceRules, CollisionWorld, ContentFlags, EntityNumber, MaterialId, Particle,
        RandomGenerator, Rgba8, SceneSink, SurfaceFlags, Trace, Vec3, ViewParams,
    };

    // Particles
    pub use cinder_particles::{FillParams, FillResult, Flock, FlockFiller, FlockHandle};

    // Trails
    pub use cinder_trails::{BeamSlot, ParticleTrailSlot, PolyTrailSlot};

    // Engine
    pub use cinder_engine::{ConfigError, EffectsConfig, EffectsSystem, FrameMetrics};
}
