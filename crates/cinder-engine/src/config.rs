//! Effects configuration, validation, and error types.
//!
//! [`EffectsConfig`] gathers the capacities of every pool in the
//! workspace. [`validate()`](EffectsConfig::validate) checks them once at
//! startup; [`EffectsSystem::new`](crate::EffectsSystem::new) refuses to
//! build anything from a config that fails it.

use cinder_arena::ArenaError;
use cinder_core::CoreError;
use cinder_hulls::{HullConfig, HullKind, LodConfig, MAX_LAYERS, MAX_SUBDIV_LEVEL};
use cinder_particles::{FlockBin, ParticleConfig};
use cinder_trails::TrailConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while loading or validating an [`EffectsConfig`], or
/// while building the pools it describes.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A pool was configured with no room at all.
    #[error("{what} must be at least 1")]
    ZeroCapacity {
        /// Which capacity was zero.
        what: String,
    },
    /// A hull pool asks for a finer icosphere than is built.
    #[error("subdivision level {level} exceeds maximum of {max}")]
    SubdivisionLevelOutOfRange {
        /// The configured level.
        level: u8,
        /// The finest level available.
        max: u8,
    },
    /// The fire pool's layer count is zero or above [`MAX_LAYERS`].
    #[error("fire hulls need between 1 and {max} layers, got {configured}", max = MAX_LAYERS)]
    TooManyLayers {
        /// The configured layer count.
        configured: u8,
    },
    /// A tuning factor is outside its range.
    #[error("invalid tuning: {reason}")]
    InvalidTuning {
        /// Which invariant was violated.
        reason: String,
    },
    /// The TOML text could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A pool could not reserve its storage.
    #[error("arena: {0}")]
    Arena(#[from] ArenaError),
    /// A scratch object could not be built.
    #[error("core: {0}")]
    Core(#[from] CoreError),
}

// ── EffectsConfig ──────────────────────────────────────────────────

/// Complete configuration of an [`EffectsSystem`](crate::EffectsSystem).
///
/// Every section has documented defaults, so a TOML file only needs the
/// keys it changes:
///
/// ```toml
/// seed = 7
///
/// [particles.small]
/// max_particles_per_flock = 32
/// max_flocks = 256
///
/// [hulls.fire]
/// capacity = 8
/// subdiv_level = 3
/// num_layers = 5
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Seed of the effects random generator. Default: `0x5eed`.
    pub seed: u64,
    /// Particle flock bins.
    pub particles: ParticleConfig,
    /// Hull pools and tuning.
    pub hulls: HullConfig,
    /// Poly trail and beam pools.
    pub trails: TrailConfig,
    /// View-dependent hull detail.
    pub lod: LodConfig,
    /// Transient sprites (explosion flashes) alive at once. Default: 32.
    pub max_sprites: usize,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            particles: ParticleConfig::default(),
            hulls: HullConfig::default(),
            trails: TrailConfig::default(),
            lod: LodConfig::default(),
            max_sprites: 32,
        }
    }
}

impl EffectsConfig {
    /// Parse a config from TOML; missing keys keep their defaults.
    ///
    /// The result is not validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        log::debug!(
            "loaded effects config: {} flocks, {} hulls, seed {:#x}",
            config.particles.total_flocks(),
            config.hulls.total_hulls(),
            config.seed
        );
        Ok(config)
    }

    /// Flock slots plus hull slots: the number of collision shape lists
    /// that can be lent out at once.
    pub fn total_shape_lists(&self) -> usize {
        self.particles.total_flocks() + self.hulls.total_hulls()
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Particle bins.
        for bin in FlockBin::ALL {
            let b = self.particles.bin(bin);
            if b.max_flocks == 0 {
                return Err(zero(format!("particles.{bin}.max_flocks")));
            }
            if b.max_particles_per_flock == 0 {
                return Err(zero(format!("particles.{bin}.max_particles_per_flock")));
            }
        }
        // 2. Hull pools.
        for kind in HullKind::ALL {
            if self.hulls.pool(kind).capacity == 0 {
                return Err(zero(format!("hulls.{kind}.capacity")));
            }
        }
        if let Some((_, level)) = self.hulls.invalid_level() {
            return Err(ConfigError::SubdivisionLevelOutOfRange {
                level,
                max: MAX_SUBDIV_LEVEL as u8,
            });
        }
        let layers = self.hulls.fire.num_layers;
        if layers == 0 || layers as usize > MAX_LAYERS {
            return Err(ConfigError::TooManyLayers { configured: layers });
        }
        // 3. Tuning and LOD factors.
        let tuning = &self.hulls.tuning;
        unit_interval("relaxation_min_factor", tuning.relaxation_min_factor)?;
        unit_interval("relaxation_minority_fraction", tuning.relaxation_minority_fraction)?;
        unit_interval("slide_min_normal_dot", tuning.slide_min_normal_dot)?;
        if !tuning.contact_offset.is_finite() || tuning.contact_offset < 0.0 {
            return Err(ConfigError::InvalidTuning {
                reason: format!(
                    "contact_offset must be finite and >= 0, got {}",
                    tuning.contact_offset
                ),
            });
        }
        let threshold = self.lod.tangent_ratio_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidTuning {
                reason: format!("tangent_ratio_threshold must be finite and >= 0, got {threshold}"),
            });
        }
        // 4. Trails and sprites.
        if self.trails.max_poly_trails == 0 {
            return Err(zero("trails.max_poly_trails".to_string()));
        }
        if self.trails.max_beams == 0 {
            return Err(zero("trails.max_beams".to_string()));
        }
        if self.trails.max_points_per_poly_trail < 2 {
            return Err(ConfigError::InvalidTuning {
                reason: format!(
                    "max_points_per_poly_trail must be at least 2, got {}",
                    self.trails.max_points_per_poly_trail
                ),
            });
        }
        if self.max_sprites == 0 {
            return Err(zero("max_sprites".to_string()));
        }
        Ok(())
    }
}

fn zero(what: String) -> ConfigError {
    ConfigError::ZeroCapacity { what }
}

fn unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTuning {
            reason: format!("{name} must be in [0, 1], got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_hulls::HullPoolConfig;
    use cinder_particles::BinConfig;

    #[test]
    fn default_config_is_valid() {
        let config = EffectsConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.total_shape_lists(), 272 + 40);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EffectsConfig::from_toml_str(
            r#"
            seed = 7

            [particles.small]
            max_particles_per_flock = 16
            max_flocks = 8

            [hulls.tuning]
            contact_offset = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.particles.small, BinConfig::new(16, 8));
        assert_eq!(config.particles.large, ParticleConfig::default().large);
        assert_eq!(config.hulls.tuning.contact_offset, 2.0);
        assert_eq!(config.hulls.tuning.slide_min_normal_dot, 0.999);
        assert_eq!(config.max_sprites, 32);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EffectsConfig::from_toml_str("seed = \"seven\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_capacities_are_named() {
        let mut config = EffectsConfig::default();
        config.particles.medium.max_flocks = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCapacity {
                what: "particles.medium.max_flocks".to_string()
            })
        );

        let mut config = EffectsConfig::default();
        config.hulls.wave.capacity = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "hulls.wave.capacity must be at least 1");
    }

    #[test]
    fn subdivision_level_is_bounded() {
        let mut config = EffectsConfig::default();
        config.hulls.smoke = HullPoolConfig::new(4, MAX_SUBDIV_LEVEL as u8 + 1, 1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::SubdivisionLevelOutOfRange {
                level: MAX_SUBDIV_LEVEL as u8 + 1,
                max: MAX_SUBDIV_LEVEL as u8,
            })
        );
    }

    #[test]
    fn layer_count_is_bounded() {
        let mut config = EffectsConfig::default();
        config.hulls.fire.num_layers = 0;
        assert_eq!(config.validate(), Err(ConfigError::TooManyLayers { configured: 0 }));
        config.hulls.fire.num_layers = MAX_LAYERS as u8 + 1;
        assert!(matches!(config.validate(), Err(ConfigError::TooManyLayers { .. })));
    }

    #[test]
    fn tuning_factors_must_be_fractions() {
        let mut config = EffectsConfig::default();
        config.hulls.tuning.relaxation_min_factor = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTuning { .. })));

        let mut config = EffectsConfig::default();
        config.hulls.tuning.slide_min_normal_dot = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTuning { .. })));
    }

    #[test]
    fn arena_errors_convert() {
        let err: ConfigError = ArenaError::ZeroCapacity.into();
        assert_eq!(err, ConfigError::Arena(ArenaError::ZeroCapacity));
    }
}
