//! Trail slots and pool capacities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Particle trail kinds an entity may carry at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleTrailSlot {
    /// Rocket and grenade smoke.
    Smoke,
    /// Rocket and blaster fire.
    Fire,
    /// Footstep dust.
    Dust,
}

/// Curved polyline trail kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolyTrailSlot {
    /// Electro bolt ribbon.
    Electro,
}

/// Straight beam kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BeamSlot {
    /// Continuous laser.
    Laser,
}

/// Any slot; together with an entity number it names one attached trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrailSlot {
    /// A particle trail.
    Particle(ParticleTrailSlot),
    /// A poly trail.
    Poly(PolyTrailSlot),
    /// A beam.
    Beam(BeamSlot),
}

impl From<ParticleTrailSlot> for TrailSlot {
    fn from(slot: ParticleTrailSlot) -> Self {
        TrailSlot::Particle(slot)
    }
}

impl From<PolyTrailSlot> for TrailSlot {
    fn from(slot: PolyTrailSlot) -> Self {
        TrailSlot::Poly(slot)
    }
}

impl From<BeamSlot> for TrailSlot {
    fn from(slot: BeamSlot) -> Self {
        TrailSlot::Beam(slot)
    }
}

impl fmt::Display for TrailSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrailSlot::Particle(ParticleTrailSlot::Smoke) => "smoke",
            TrailSlot::Particle(ParticleTrailSlot::Fire) => "fire",
            TrailSlot::Particle(ParticleTrailSlot::Dust) => "dust",
            TrailSlot::Poly(PolyTrailSlot::Electro) => "electro",
            TrailSlot::Beam(BeamSlot::Laser) => "laser",
        };
        f.write_str(name)
    }
}

/// Capacities of the poly trail and beam pools.
///
/// Particle trails draw their flocks from the particle system's trail
/// bin and have no pool of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Poly trails alive at once. Default: 48.
    pub max_poly_trails: usize,
    /// Beams alive at once. Default: 48.
    pub max_beams: usize,
    /// Points a poly trail keeps. Default: 32.
    pub max_points_per_poly_trail: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_poly_trails: 48,
            max_beams: 48,
            max_points_per_poly_trail: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_convert_and_display() {
        let slot: TrailSlot = ParticleTrailSlot::Dust.into();
        assert_eq!(slot.to_string(), "dust");
        assert_eq!(TrailSlot::from(BeamSlot::Laser).to_string(), "laser");
        assert_ne!(TrailSlot::from(PolyTrailSlot::Electro), slot);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: TrailConfig = toml::from_str("max_beams = 4").unwrap();
        assert_eq!(config.max_beams, 4);
        assert_eq!(config.max_poly_trails, 48);
    }
}
