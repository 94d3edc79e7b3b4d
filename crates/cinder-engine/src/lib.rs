//! Effects façade orchestrating the Cinder simulation engines.
//!
//! Provides [`EffectsSystem`], which owns the particle flocks, hull pools,
//! trail manager and transient sprites of one client, turns gameplay
//! events into effects through the built-in [`presets`], and advances and
//! submits everything once per frame.
//!
//! Construction is the only fallible step: [`EffectsConfig`] is validated
//! and every pool is allocated up front. From then on nothing allocates
//! and nothing returns an error; full pools evict instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod presets;
pub mod sprites;
pub mod system;

pub use config::{ConfigError, EffectsConfig};
pub use metrics::FrameMetrics;
pub use presets::{ExplosionPreset, ParticleEmitter};
pub use sprites::SpriteParams;
pub use system::EffectsSystem;
