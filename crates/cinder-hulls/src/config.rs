//! Hull pool configuration and tuning constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::topology::MAX_SUBDIV_LEVEL;

/// Most layers a concentric hull may have.
pub const MAX_LAYERS: usize = 8;

// ── HullKind ───────────────────────────────────────────────────────

/// Which pool a hull lives in. Pools are simulated in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HullKind {
    /// Concentric multi-layer fireballs.
    Fire,
    /// Regular smoke blobs.
    Smoke,
    /// Regular shockwave blobs.
    Wave,
}

impl HullKind {
    /// Every pool in simulation order.
    pub const ALL: [HullKind; 3] = [HullKind::Fire, HullKind::Smoke, HullKind::Wave];

    /// Whether hulls of this kind are concentric.
    pub fn is_concentric(self) -> bool {
        matches!(self, HullKind::Fire)
    }
}

impl fmt::Display for HullKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HullKind::Fire => "fire",
            HullKind::Smoke => "smoke",
            HullKind::Wave => "wave",
        })
    }
}

// ── HullPoolConfig ─────────────────────────────────────────────────

/// Capacity and shape of one hull pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HullPoolConfig {
    /// Hulls alive at once before the oldest is evicted.
    pub capacity: usize,
    /// Icosphere level every hull of the pool is built at.
    pub subdiv_level: u8,
    /// Layers per hull; ignored for regular pools.
    pub num_layers: u8,
}

impl HullPoolConfig {
    /// A pool of `capacity` hulls at `subdiv_level` with `num_layers` layers.
    pub const fn new(capacity: usize, subdiv_level: u8, num_layers: u8) -> Self {
        Self {
            capacity,
            subdiv_level,
            num_layers,
        }
    }
}

// ── HullTuning ─────────────────────────────────────────────────────

/// Empirical visual constants of the regular hull step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullTuning {
    /// Smallest share of its move a relaxed vertex keeps. Default: 1/3.
    pub relaxation_min_factor: f32,
    /// Relaxation runs only while free vertices are under this share of
    /// the mesh. Default: 0.5.
    pub relaxation_minority_fraction: f32,
    /// Distance a clamped vertex is pushed off the surface. Default: 1.0.
    pub contact_offset: f32,
    /// Moves at least this aligned with the contact normal are clamped
    /// instead of slid. Default: 0.999.
    pub slide_min_normal_dot: f32,
}

impl Default for HullTuning {
    fn default() -> Self {
        Self {
            relaxation_min_factor: 1.0 / 3.0,
            relaxation_minority_fraction: 0.5,
            contact_offset: 1.0,
            slide_min_normal_dot: 0.999,
        }
    }
}

// ── HullConfig ─────────────────────────────────────────────────────

/// All hull pools plus tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullConfig {
    /// Fire pool (concentric). Default: 16 hulls, level 4, 5 layers.
    pub fire: HullPoolConfig,
    /// Smoke pool (regular). Default: 16 hulls, level 3.
    pub smoke: HullPoolConfig,
    /// Wave pool (regular). Default: 8 hulls, level 4.
    pub wave: HullPoolConfig,
    /// Regular hull tuning.
    pub tuning: HullTuning,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            fire: HullPoolConfig::new(16, 4, 5),
            smoke: HullPoolConfig::new(16, 3, 1),
            wave: HullPoolConfig::new(8, 4, 1),
            tuning: HullTuning::default(),
        }
    }
}

impl HullConfig {
    /// Configuration of one pool.
    pub fn pool(&self, kind: HullKind) -> HullPoolConfig {
        match kind {
            HullKind::Fire => self.fire,
            HullKind::Smoke => self.smoke,
            HullKind::Wave => self.wave,
        }
    }

    /// Total hulls over all pools.
    pub fn total_hulls(&self) -> usize {
        HullKind::ALL.iter().map(|k| self.pool(*k).capacity).sum()
    }

    /// The first pool whose level is out of range, if any.
    pub fn invalid_level(&self) -> Option<(HullKind, u8)> {
        HullKind::ALL
            .into_iter()
            .map(|k| (k, self.pool(k).subdiv_level))
            .find(|(_, level)| *level as usize > MAX_SUBDIV_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let c = HullConfig::default();
        assert_eq!(c.fire, HullPoolConfig::new(16, 4, 5));
        assert_eq!(c.smoke.subdiv_level, 3);
        assert_eq!(c.wave.capacity, 8);
        assert_eq!(c.total_hulls(), 40);
        assert!(c.invalid_level().is_none());
    }

    #[test]
    fn level_out_of_range_is_reported() {
        let mut c = HullConfig::default();
        c.wave.subdiv_level = 5;
        assert_eq!(c.invalid_level(), Some((HullKind::Wave, 5)));
    }

    #[test]
    fn only_fire_is_concentric() {
        assert!(HullKind::Fire.is_concentric());
        assert!(!HullKind::Smoke.is_concentric());
        assert!(!HullKind::Wave.is_concentric());
    }
}
