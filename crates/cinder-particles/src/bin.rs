//! Size classes ("bins") of the flock pool and their configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── FlockBin ───────────────────────────────────────────────────────

/// A size-classed sub-pool of flocks.
///
/// Bins are simulated and submitted in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlockBin {
    /// Small one-shot effects (impacts, puffs).
    Small,
    /// Medium one-shot effects (explosion sparks).
    Medium,
    /// Large one-shot effects (debris showers).
    Large,
    /// Flocks continuously fed by trails.
    Trail,
}

impl FlockBin {
    /// Every bin in simulation order.
    pub const ALL: [FlockBin; 4] = [
        FlockBin::Small,
        FlockBin::Medium,
        FlockBin::Large,
        FlockBin::Trail,
    ];

    /// Bins a one-shot effect may be placed in, smallest first.
    pub const REGULAR: [FlockBin; 3] = [FlockBin::Small, FlockBin::Medium, FlockBin::Large];

    /// Position of this bin in [`ALL`](Self::ALL).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FlockBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlockBin::Small => "small",
            FlockBin::Medium => "medium",
            FlockBin::Large => "large",
            FlockBin::Trail => "trail",
        };
        f.write_str(name)
    }
}

// ── BinConfig ──────────────────────────────────────────────────────

/// Capacity of one bin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinConfig {
    /// Particle capacity of every flock in the bin.
    pub max_particles_per_flock: usize,
    /// Number of flocks the bin holds before it starts evicting.
    pub max_flocks: usize,
}

impl BinConfig {
    /// A bin of `max_flocks` flocks with `max_particles_per_flock` particles each.
    pub const fn new(max_particles_per_flock: usize, max_flocks: usize) -> Self {
        Self {
            max_particles_per_flock,
            max_flocks,
        }
    }
}

// ── ParticleConfig ─────────────────────────────────────────────────

/// Capacities of all bins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Small bin. Default: 32 particles × 128 flocks.
    pub small: BinConfig,
    /// Medium bin. Default: 128 particles × 64 flocks.
    pub medium: BinConfig,
    /// Large bin. Default: 512 particles × 16 flocks.
    pub large: BinConfig,
    /// Trail bin. Default: 256 particles × 64 flocks.
    pub trail: BinConfig,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            small: BinConfig::new(32, 128),
            medium: BinConfig::new(128, 64),
            large: BinConfig::new(512, 16),
            trail: BinConfig::new(256, 64),
        }
    }
}

impl ParticleConfig {
    /// Capacity of `bin`.
    pub fn bin(&self, bin: FlockBin) -> BinConfig {
        match bin {
            FlockBin::Small => self.small,
            FlockBin::Medium => self.medium,
            FlockBin::Large => self.large,
            FlockBin::Trail => self.trail,
        }
    }

    /// Total number of flocks over all bins.
    pub fn total_flocks(&self) -> usize {
        FlockBin::ALL.iter().map(|b| self.bin(*b).max_flocks).sum()
    }

    /// The smallest regular bin whose flocks hold `count` particles,
    /// or the large bin if none does.
    pub fn bin_for_particle_count(&self, count: usize) -> FlockBin {
        FlockBin::REGULAR
            .into_iter()
            .find(|b| self.bin(*b).max_particles_per_flock >= count)
            .unwrap_or(FlockBin::Large)
    }
}
