//! Arena-specific error types.

use thiserror::Error;

/// Errors that can occur while constructing arena storage.
///
/// Both variants are construction-time failures; a running simulation
/// never allocates and therefore never sees them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A pool was configured with no slots at all.
    #[error("arena capacity must be at least 1")]
    ZeroCapacity,
    /// The backing storage could not be reserved.
    #[error("arena allocation failed: requested {requested} slots")]
    AllocationFailed {
        /// Number of slots that were requested.
        requested: usize,
    },
}
