//! Small geometric helpers on top of `glam`.

use glam::Vec3;

/// Axis-aligned bounding box.
///
/// An "empty" box has `mins > maxs` on every axis so that the first
/// [`add_point`](Aabb::add_point) snaps it to that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub mins: Vec3,
    /// Maximum corner.
    pub maxs: Vec3,
}

impl Aabb {
    /// Build a box from its two corners.
    pub fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self { mins, maxs }
    }

    /// The inverted box that contains nothing.
    pub fn empty() -> Self {
        Self {
            mins: Vec3::splat(f32::INFINITY),
            maxs: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// A box of half-extent `radius` around `center`.
    pub fn around(center: Vec3, radius: f32) -> Self {
        Self {
            mins: center - Vec3::splat(radius),
            maxs: center + Vec3::splat(radius),
        }
    }

    /// Whether no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    /// Grow the box to contain `p`.
    pub fn add_point(&mut self, p: Vec3) {
        self.mins = self.mins.min(p);
        self.maxs = self.maxs.max(p);
    }

    /// A copy grown by `by` on every side.
    pub fn expanded(&self, by: f32) -> Self {
        Self {
            mins: self.mins - Vec3::splat(by),
            maxs: self.maxs + Vec3::splat(by),
        }
    }

    /// Whether the two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.mins.x <= other.maxs.x
            && self.maxs.x >= other.mins.x
            && self.mins.y <= other.maxs.y
            && self.maxs.y >= other.mins.y
            && self.mins.z <= other.maxs.z
            && self.maxs.z >= other.mins.z
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.mins.x
            && p.x <= self.maxs.x
            && p.y >= self.mins.y
            && p.y <= self.maxs.y
            && p.z >= self.mins.z
            && p.z <= self.maxs.z
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        0.5 * (self.mins + self.maxs)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mirror `v` about the plane with unit normal `n`.
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Two unit vectors orthogonal to the unit vector `dir` and to each other.
pub fn orthonormal_basis(dir: Vec3) -> (Vec3, Vec3) {
    let helper = if dir.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
    let right = helper.cross(dir).normalize_or_zero();
    let up = dir.cross(right);
    (right, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_snaps_to_first_point() {
        let mut b = Aabb::empty();
        assert!(b.is_empty());
        b.add_point(Vec3::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert_eq!(b.mins, b.maxs);
    }

    #[test]
    fn intersection_is_symmetric() {
        let a = Aabb::around(Vec3::ZERO, 1.0);
        let b = Aabb::around(Vec3::new(1.5, 0.0, 0.0), 1.0);
        let c = Aabb::around(Vec3::new(5.0, 0.0, 0.0), 1.0);
        assert!(a.intersects(&b) && b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn reflect_flips_normal_component() {
        let v = reflect(Vec3::new(3.0, 0.0, -4.0), Vec3::Z);
        assert_eq!(v, Vec3::new(3.0, 0.0, 4.0));
    }

    #[test]
    fn basis_is_orthonormal() {
        for dir in [Vec3::Z, -Vec3::Z, Vec3::X, Vec3::new(1.0, 1.0, 1.0).normalize()] {
            let (r, u) = orthonormal_basis(dir);
            assert!(r.dot(dir).abs() < 1e-5);
            assert!(u.dot(dir).abs() < 1e-5);
            assert!(r.dot(u).abs() < 1e-5);
            assert!((r.length() - 1.0).abs() < 1e-5);
            assert!((u.length() - 1.0).abs() < 1e-5);
        }
    }
}
