//! Procedural icosphere hulls for the Cinder effects engine.
//!
//! A hull is a closed mesh grown from a point. Its topology comes from a
//! shared [`IcosphereTopology`] and never changes after spawn; only
//! positions and colors move.
//!
//! ```text
//! HullSystem
//! ├── Fire   FreelistAllocator<ConcentricHull>   layered, limits traced once
//! ├── Smoke  FreelistAllocator<RegularHull>      deformed by contact every frame
//! └── Wave   FreelistAllocator<RegularHull>
//! ```
//!
//! Pools are fixed-size; a spawn into a full pool evicts the oldest hull
//! of that pool. Every frame [`HullSystem::simulate`] steps the pools in
//! the order above and destroys hulls whose lifetime has run out, then
//! [`HullSystem::submit`] hands each hull's full vertex buffer to the
//! scene together with the index buffer [`LodConfig`] picks for the view.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod concentric;
pub mod config;
pub mod lod;
pub mod regular;
pub mod system;
pub mod topology;

pub use concentric::{ConcentricHull, ConcentricHullParams, LayerParams};
pub use config::{HullConfig, HullKind, HullPoolConfig, HullTuning, MAX_LAYERS};
pub use lod::LodConfig;
pub use regular::{FieldStats, RegularHull, RegularHullParams};
pub use system::{HullFrameStats, HullHandle, HullSystem};
pub use topology::{IcosphereLevel, IcosphereTopology, SharedTopology, MAX_SUBDIV_LEVEL, NUM_NEIGHBOURS};
