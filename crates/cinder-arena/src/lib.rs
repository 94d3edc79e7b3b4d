//! Fixed-capacity storage for the Cinder simulation engines.
//!
//! Every effect engine is built on two primitives from this crate:
//!
//! ```text
//! FreelistAllocator<T>   fixed slab of pre-constructed T, O(1) alloc/free,
//! │                      doubly-linked free list (LIFO reuse) and live list,
//! │                      generation-checked SlotHandles
//! └── ScratchPool<S>     small set of reusable scratch objects lent out
//!                        through RAII ScratchLease guards
//! ```
//!
//! Slots are constructed once at startup and recycled in place, so the
//! steady state performs no heap allocation. Running out of slots is not
//! an error: [`FreelistAllocator::alloc`] returns `None` and the caller
//! evicts an existing element before retrying.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod freelist;
pub mod handle;
pub mod scratch;

pub use error::ArenaError;
pub use freelist::FreelistAllocator;
pub use handle::SlotHandle;
pub use scratch::{ScratchLease, ScratchPool};
