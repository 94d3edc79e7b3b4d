//! Entity-attached trails for the Cinder effects engine.
//!
//! Three kinds of trail follow a moving entity:
//!
//! - particle trails drop particles into a pinned flock of the particle
//!   system's trail bin,
//! - poly trails record a polyline of recent positions,
//! - beams are a straight segment between two moving endpoints.
//!
//! The game touches every trail it wants kept alive once per frame.
//! [`TrailManager::simulate_frame_and_submit`] moves anything left
//! untouched to the lingering list, where it fades out on its own and is
//! never fed again.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod geometry;
pub mod manager;

pub use config::{BeamSlot, ParticleTrailSlot, PolyTrailSlot, TrailConfig, TrailSlot};
pub use geometry::{Beam, BeamParams, ParticleTrailParams, PolyTrail, PolyTrailParams};
pub use manager::{TrailFrameStats, TrailManager};
