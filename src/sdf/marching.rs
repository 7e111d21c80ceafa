//! Marching tetrahedra over a structured grid.
//!
//! Every grid cell is split into six tetrahedra around its main diagonal
//! (the Kuhn subdivision, conforming between neighbouring cells). Surface
//! vertices lie on grid edges and are shared through an edge-keyed map, so
//! the output is watertight inside the grid and open exactly where the level
//! set meets the box faces.

use crate::float_types::Real;
use crate::mesh::{SimplexMesh, Triangle};
use crate::sdf::grid::ScalarGrid;
use crate::sdf::traits::IsoSurfacer;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Cell corner offsets indexed by bit pattern `x | y << 1 | z << 2`.
const CORNERS: [[u32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Six tetrahedra, one per axis ordering, each walking from corner 0 to 7.
const CELL_TETS: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

/// Marching tetrahedra iso-surfacer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarchingTetrahedra;

impl MarchingTetrahedra {
    pub const fn new() -> Self {
        Self
    }
}

struct Builder<'g> {
    grid: &'g ScalarGrid,
    iso_value: Real,
    edge_vertex: HashMap<(u32, u32), usize>,
    mesh: SimplexMesh<Triangle>,
}

impl Builder<'_> {
    /// Index of the surface vertex on the grid edge between two samples.
    fn edge_vertex(&mut self, a: (u32, [u32; 3]), b: (u32, [u32; 3])) -> usize {
        let key = if a.0 < b.0 { (a.0, b.0) } else { (b.0, a.0) };
        if let Some(&idx) = self.edge_vertex.get(&key) {
            return idx;
        }
        let (ia, ib) = if a.0 < b.0 { (a.1, b.1) } else { (b.1, a.1) };
        let sa = self.grid.values[key.0 as usize];
        let sb = self.grid.values[key.1 as usize];
        let t = ((self.iso_value - sa) / (sb - sa)).clamp(0.0, 1.0);
        let pa = self.grid.point(ia[0], ia[1], ia[2]);
        let pb = self.grid.point(ib[0], ib[1], ib[2]);

        let idx = self.mesh.vertices.len();
        self.mesh.vertices.push(pa + (pb - pa) * t);
        self.edge_vertex.insert(key, idx);
        idx
    }

    /// Emit `tri`, flipped if needed so its normal points from the inside
    /// corners towards the outside corners.
    fn push_oriented(&mut self, tri: Triangle, inside: &[Point3<Real>], outside: &[Point3<Real>]) {
        let v = &self.mesh.vertices;
        let normal = (v[tri[1]] - v[tri[0]]).cross(&(v[tri[2]] - v[tri[0]]));
        let centroid = |pts: &[Point3<Real>]| {
            pts.iter().fold(Point3::origin(), |acc, p| acc + p.coords) / pts.len() as Real
        };
        let direction = centroid(outside) - centroid(inside);
        if normal.dot(&direction) < 0.0 {
            self.mesh.elements.push([tri[0], tri[2], tri[1]]);
        } else {
            self.mesh.elements.push(tri);
        }
    }

    fn march_tet(&mut self, corners: [(u32, [u32; 3]); 4]) {
        let mut inside = Vec::with_capacity(4);
        let mut outside = Vec::with_capacity(4);
        for &corner in &corners {
            if self.grid.values[corner.0 as usize] < self.iso_value {
                inside.push(corner);
            } else {
                outside.push(corner);
            }
        }

        let position = |c: &(u32, [u32; 3])| self.grid.point(c.1[0], c.1[1], c.1[2]);
        let inside_pts: Vec<Point3<Real>> = inside.iter().map(position).collect();
        let outside_pts: Vec<Point3<Real>> = outside.iter().map(position).collect();

        match (inside.len(), outside.len()) {
            (1, 3) => {
                let a = self.edge_vertex(inside[0], outside[0]);
                let b = self.edge_vertex(inside[0], outside[1]);
                let c = self.edge_vertex(inside[0], outside[2]);
                self.push_oriented([a, b, c], &inside_pts, &outside_pts);
            },
            (3, 1) => {
                let a = self.edge_vertex(inside[0], outside[0]);
                let b = self.edge_vertex(inside[1], outside[0]);
                let c = self.edge_vertex(inside[2], outside[0]);
                self.push_oriented([a, b, c], &inside_pts, &outside_pts);
            },
            (2, 2) => {
                // Quad i0o0 - i0o1 - i1o1 - i1o0
                let q0 = self.edge_vertex(inside[0], outside[0]);
                let q1 = self.edge_vertex(inside[0], outside[1]);
                let q2 = self.edge_vertex(inside[1], outside[1]);
                let q3 = self.edge_vertex(inside[1], outside[0]);
                self.push_oriented([q0, q1, q2], &inside_pts, &outside_pts);
                self.push_oriented([q0, q2, q3], &inside_pts, &outside_pts);
            },
            _ => {},
        }
    }
}

impl IsoSurfacer for MarchingTetrahedra {
    fn extract(&self, grid: &ScalarGrid, iso_value: Real) -> SimplexMesh<Triangle> {
        let mut builder = Builder {
            grid,
            iso_value,
            edge_vertex: HashMap::new(),
            mesh: SimplexMesh::new(),
        };
        let shape = grid.shape;

        for z in 0..shape.nz - 1 {
            for y in 0..shape.ny - 1 {
                for x in 0..shape.nx - 1 {
                    let corner = |k: usize| {
                        let [dx, dy, dz] = CORNERS[k];
                        let c = [x + dx, y + dy, z + dz];
                        (shape.index(c[0], c[1], c[2]), c)
                    };
                    for tet in CELL_TETS {
                        builder.march_tet(tet.map(corner));
                    }
                }
            }
        }

        builder.mesh
    }
}
