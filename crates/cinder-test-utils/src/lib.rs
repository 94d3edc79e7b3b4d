//! Test utilities and mock types for Cinder development.
//!
//! Provides a [`MockCollisionWorld`] built from half-spaces and boxes, and
//! a [`RecordingScene`] that copies every submission for later assertions.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod scene;
mod world;

pub use scene::{RecordedMesh, RecordedMeshPart, RecordedParticles, RecordedPoly, RecordingScene};
pub use world::{MockCollisionWorld, MockShape, DIST_EPSILON};
