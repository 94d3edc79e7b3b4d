//! Particle flock pool for the Cinder effects engine.
//!
//! Particles never exist on their own: they are spawned in batches called
//! flocks, and flocks live in one of four size-classed bins:
//!
//! ```text
//! ParticleSystem
//! ├── Small   FreelistAllocator<Flock>   few particles, many flocks
//! ├── Medium  FreelistAllocator<Flock>
//! ├── Large   FreelistAllocator<Flock>   many particles, few flocks
//! └── Trail   FreelistAllocator<Flock>   fed continuously by trails
//! ```
//!
//! When a bin is full, [`ParticleSystem::create_flock`] evicts the flock
//! of that bin that would have expired soonest. Fillers
//! ([`UniformFlockFiller`], [`ConeFlockFiller`]) populate fresh flocks, and
//! [`ParticleSystem::simulate`] integrates motion, resolves collisions
//! against one batched shape list per flock, and retires expired flocks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bin;
pub mod filler;
pub mod flock;
pub mod system;

pub use bin::{BinConfig, FlockBin, ParticleConfig};
pub use filler::{
    unit_sphere_samples, ConeFlockFiller, FillParams, FillResult, FlockFiller, UniformFlockFiller,
};
pub use flock::{Flock, FlockHandle};
pub use system::{ParticleFrameStats, ParticleSystem};
