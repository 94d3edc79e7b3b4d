//! Core error types.

use cinder_arena::ArenaError;
use thiserror::Error;

/// Errors raised while setting up core scratch resources.
///
/// These only occur at construction time; the per-frame simulation never
/// produces errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A collision shape list could not reserve its backing storage.
    #[error("failed to allocate a shape list with capacity {capacity}")]
    ShapeListAllocation {
        /// Number of shape slots that were requested.
        capacity: usize,
    },

    /// A pool backing the scratch resources could not be built.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}
