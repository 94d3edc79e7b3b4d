//! Shared icosphere topology.
//!
//! [`IcosphereTopology`] holds every subdivision level of one unit
//! icosphere. It is built once at startup and shared read-only between
//! all hull pools through [`SharedTopology`].
//!
//! Each level stores:
//!
//! - unit vertex directions,
//! - a triangle list as `u16` indices,
//! - the first [`NUM_NEIGHBOURS`] topological neighbours of each vertex.
//!
//! Subdivision appends edge midpoints after the existing vertices, so the
//! vertices of level `l` are a prefix of those of level `l + 1`. A hull
//! simulated at level `l` can therefore be drawn with the index buffer of
//! any lower level.
//!
//! Vertices of a subdivided icosahedron have 5 or 6 neighbours. Only the
//! first 5 are kept; the sixth neighbour of the hexagonal vertices is
//! ignored by the relaxation step.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

/// Highest subdivision level built (2562 vertices).
pub const MAX_SUBDIV_LEVEL: usize = 4;

/// Neighbours kept per vertex.
pub const NUM_NEIGHBOURS: usize = 5;

/// Shared, immutable topology handle.
pub type SharedTopology = Arc<IcosphereTopology>;

/// One subdivision level.
#[derive(Debug)]
pub struct IcosphereLevel {
    vertices: Vec<Vec3>,
    indices: Vec<u16>,
    neighbours: Vec<[u16; NUM_NEIGHBOURS]>,
}

impl IcosphereLevel {
    /// Unit directions of the vertices.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle list.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// First five neighbours of every vertex.
    pub fn neighbours(&self) -> &[[u16; NUM_NEIGHBOURS]] {
        &self.neighbours
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }
}

/// All icosphere levels from 0 to [`MAX_SUBDIV_LEVEL`].
#[derive(Debug)]
pub struct IcosphereTopology {
    levels: Vec<IcosphereLevel>,
}

impl IcosphereTopology {
    /// Build every level.
    pub fn new() -> Self {
        let (mut vertices, mut triangles) = icosahedron();
        let mut levels = Vec::with_capacity(MAX_SUBDIV_LEVEL + 1);
        levels.push(make_level(&vertices, &triangles));
        for _ in 0..MAX_SUBDIV_LEVEL {
            triangles = subdivide(&mut vertices, &triangles);
            levels.push(make_level(&vertices, &triangles));
        }
        log::info!(
            "icosphere topology built: {} levels, {} vertices at the finest",
            levels.len(),
            vertices.len()
        );
        Self { levels }
    }

    /// Build and wrap for sharing.
    pub fn shared() -> SharedTopology {
        Arc::new(Self::new())
    }

    /// Level `level`, clamped to [`MAX_SUBDIV_LEVEL`].
    pub fn level(&self, level: usize) -> &IcosphereLevel {
        &self.levels[level.min(MAX_SUBDIV_LEVEL)]
    }
}

impl Default for IcosphereTopology {
    fn default() -> Self {
        Self::new()
    }
}

fn icosahedron() -> (Vec<Vec3>, Vec<[u16; 3]>) {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let vertices = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();
    let triangles = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (vertices, triangles)
}

/// Split every triangle in four, appending midpoints to `vertices`.
fn subdivide(vertices: &mut Vec<Vec3>, triangles: &[[u16; 3]]) -> Vec<[u16; 3]> {
    let mut midpoints: HashMap<(u16, u16), u16> = HashMap::new();
    let mut midpoint = |a: u16, b: u16, vertices: &mut Vec<Vec3>| -> u16 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            let v = (vertices[a as usize] + vertices[b as usize]).normalize();
            vertices.push(v);
            (vertices.len() - 1) as u16
        })
    };
    let mut out = Vec::with_capacity(triangles.len() * 4);
    for &[a, b, c] in triangles {
        let ab = midpoint(a, b, vertices);
        let bc = midpoint(b, c, vertices);
        let ca = midpoint(c, a, vertices);
        out.push([a, ab, ca]);
        out.push([b, bc, ab]);
        out.push([c, ca, bc]);
        out.push([ab, bc, ca]);
    }
    out
}

fn make_level(vertices: &[Vec3], triangles: &[[u16; 3]]) -> IcosphereLevel {
    let mut adjacency: Vec<Vec<u16>> = vec![Vec::new(); vertices.len()];
    for tri in triangles {
        for k in 0..3 {
            let (v, w) = (tri[k], tri[(k + 1) % 3]);
            if !adjacency[v as usize].contains(&w) {
                adjacency[v as usize].push(w);
            }
            if !adjacency[w as usize].contains(&v) {
                adjacency[w as usize].push(v);
            }
        }
    }
    let neighbours = adjacency
        .iter()
        .map(|adj| {
            let mut fixed = [0u16; NUM_NEIGHBOURS];
            for (slot, &n) in fixed.iter_mut().zip(adj.iter()) {
                *slot = n;
            }
            fixed
        })
        .collect();
    IcosphereLevel {
        vertices: vertices.to_vec(),
        indices: triangles.iter().flatten().copied().collect(),
        neighbours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_counts_per_level() {
        let topo = IcosphereTopology::new();
        let counts: Vec<usize> = (0..=MAX_SUBDIV_LEVEL).map(|l| topo.level(l).num_vertices()).collect();
        assert_eq!(counts, vec![12, 42, 162, 642, 2562]);
        for l in 0..=MAX_SUBDIV_LEVEL {
            assert_eq!(topo.level(l).indices().len(), 20 * 4usize.pow(l as u32) * 3);
        }
    }

    #[test]
    fn lower_levels_are_prefixes() {
        let topo = IcosphereTopology::new();
        for l in 0..MAX_SUBDIV_LEVEL {
            let lo = topo.level(l).vertices();
            let hi = topo.level(l + 1).vertices();
            assert_eq!(lo, &hi[..lo.len()]);
        }
    }

    #[test]
    fn vertices_are_unit() {
        let topo = IcosphereTopology::new();
        let level = topo.level(MAX_SUBDIV_LEVEL);
        assert!(level.vertices().iter().all(|v| (v.length() - 1.0).abs() < 1e-5));
        assert!(level.indices().iter().all(|&i| (i as usize) < level.num_vertices()));
    }

    #[test]
    fn neighbours_are_adjacent_and_distinct() {
        let topo = IcosphereTopology::new();
        for l in 0..=MAX_SUBDIV_LEVEL {
            let level = topo.level(l);
            let vertices = level.vertices();
            // Edge length of the level bounds neighbour distance.
            let max_edge = (vertices[level.indices()[0] as usize] - vertices[level.indices()[1] as usize])
                .length()
                * 1.5;
            for (i, ns) in level.neighbours().iter().enumerate() {
                let mut sorted = ns.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                assert_eq!(sorted.len(), NUM_NEIGHBOURS);
                for &n in ns {
                    assert_ne!(n as usize, i);
                    assert!((vertices[i] - vertices[n as usize]).length() <= max_edge);
                }
            }
        }
    }

    #[test]
    fn level_is_clamped() {
        let topo = IcosphereTopology::new();
        assert_eq!(topo.level(99).num_vertices(), 2562);
    }
}
