//! View-dependent choice of the index buffer to submit.

use cinder_core::ViewParams;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// LOD tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Projected size below which one subdivision level is dropped.
    /// Default: 0.05.
    pub tangent_ratio_threshold: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            tangent_ratio_threshold: 0.05,
        }
    }
}

impl LodConfig {
    /// Subdivision level to draw a hull of `radius` at `center` with.
    ///
    /// Starting from `level`, one level is dropped while the projected
    /// size ratio stays under the threshold; each drop halves the vertex
    /// spacing budget, so the ratio doubles.
    pub fn select_level(&self, level: usize, center: Vec3, radius: f32, view: &ViewParams) -> usize {
        let distance = center.distance(view.origin);
        let denom = distance * view.tan_half_fov;
        if denom <= f32::EPSILON {
            return level;
        }
        let mut ratio = radius / denom;
        let mut chosen = level;
        while chosen > 0 && ratio < self.tangent_ratio_threshold {
            chosen -= 1;
            ratio *= 2.0;
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(origin: Vec3) -> ViewParams {
        ViewParams {
            origin,
            tan_half_fov: 1.0,
        }
    }

    #[test]
    fn close_hull_keeps_level() {
        let lod = LodConfig::default();
        let level = lod.select_level(4, Vec3::ZERO, 50.0, &view_at(Vec3::new(100.0, 0.0, 0.0)));
        assert_eq!(level, 4);
    }

    #[test]
    fn far_hull_drops_levels() {
        let lod = LodConfig::default();
        // ratio = 10 / 1000 = 0.01: 0.01 → 0.02 → 0.04 → 0.08 (three drops)
        let level = lod.select_level(4, Vec3::ZERO, 10.0, &view_at(Vec3::new(1000.0, 0.0, 0.0)));
        assert_eq!(level, 1);
    }

    #[test]
    fn never_below_zero() {
        let lod = LodConfig::default();
        let level = lod.select_level(2, Vec3::ZERO, 0.001, &view_at(Vec3::new(1e6, 0.0, 0.0)));
        assert_eq!(level, 0);
    }

    #[test]
    fn camera_inside_hull_keeps_level() {
        let lod = LodConfig::default();
        assert_eq!(lod.select_level(3, Vec3::ZERO, 1.0, &view_at(Vec3::ZERO)), 3);
    }
}
