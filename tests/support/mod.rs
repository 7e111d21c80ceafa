//! Test support library
//! Provides a structured grid "mesher" and a few fields so the pipeline can
//! run without an external Delaunay refinement engine.
#![allow(dead_code)]

use std::cell::RefCell;
use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};
use tpmesh::{
    MeshingError, Result,
    domain::MeshDomain,
    float_types::{Real, parry3d::bounding_volume::Aabb},
    geometry::tet_volume,
    implicit::{Implicit, ImplicitField},
    mesh::{Element, SimplexMesh, Tetrahedron, Triangle},
    mesher::{
        PeriodicMesher, PeriodicRefinementParams, RawMesh, RefinementParams, SurfaceMesher, SurfaceRefinementParams,
        VolumeMesher,
    },
    sdf::{IsoSurfacer, MarchingTetrahedra, ScalarGrid},
};

/// Kuhn subdivision of a cell into six tetrahedra, corners indexed by
/// `x | y << 1 | z << 2`.
const CELL_TETS: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

/// Structured tetrahedral grid over `bbox` with cells no larger than `h`.
/// Tetrahedra are positively oriented.
pub fn grid_tetrahedra(bbox: &Aabb, h: Real) -> SimplexMesh<Tetrahedron> {
    let extents = bbox.extents();
    let n = extents.map(|e| ((e / h).ceil() as usize).max(1));
    let idx = |x: usize, y: usize, z: usize| (z * (n.y + 1) + y) * (n.x + 1) + x;

    let mut mesh = SimplexMesh::new();
    for z in 0..=n.z {
        for y in 0..=n.y {
            for x in 0..=n.x {
                let t = Vector3::new(
                    x as Real / n.x as Real,
                    y as Real / n.y as Real,
                    z as Real / n.z as Real,
                );
                mesh.vertices.push(bbox.mins + t.component_mul(&extents));
            }
        }
    }
    for z in 0..n.z {
        for y in 0..n.y {
            for x in 0..n.x {
                let corner = |k: usize| idx(x + (k & 1), y + ((k >> 1) & 1), z + ((k >> 2) & 1));
                for tet in CELL_TETS {
                    let mut tet = tet.map(corner);
                    let v = &mesh.vertices;
                    if tet_volume(&v[tet[0]], &v[tet[1]], &v[tet[2]], &v[tet[3]]) < 0.0 {
                        tet.swap(2, 3);
                    }
                    mesh.elements.push(tet);
                }
            }
        }
    }
    mesh
}

/// Tetrahedra of the grid whose centroid lies inside `domain`. All grid
/// points are returned, referenced or not, as a real mesher would leave
/// far-field points behind.
fn carve(domain: &dyn MeshDomain, bbox: &Aabb, h: Real) -> RawMesh {
    let grid = grid_tetrahedra(bbox, h);
    let tetra = grid
        .elements
        .iter()
        .copied()
        .filter(|tet| {
            let centroid = tet.iter().fold(Point3::origin(), |acc, &i| acc + grid.vertices[i].coords) / 4.0;
            domain.eval(&centroid) < 0.0
        })
        .collect();
    RawMesh::new(grid.vertices, tetra, Vec::new())
}

/// A domain viewed as a field over a box, for iso-surfacing.
struct DomainField<'a> {
    domain: &'a dyn MeshDomain,
    extents: Vector3<Real>,
}

impl ImplicitField for DomainField<'_> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        self.domain.eval(p)
    }

    fn domain(&self) -> Vector3<Real> {
        self.extents
    }
}

/// Stand-in for a Delaunay refinement engine: carves a structured grid.
#[derive(Debug, Default)]
pub struct GridMesher {
    pub volume_params: RefCell<Option<RefinementParams>>,
    pub surface_params: RefCell<Option<SurfaceRefinementParams>>,
    pub periodic_params: RefCell<Option<PeriodicRefinementParams>>,
}

impl GridMesher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VolumeMesher for GridMesher {
    fn generate_mesh(&self, domain: &dyn MeshDomain, bbox: &Aabb, params: &RefinementParams) -> Result<RawMesh> {
        *self.volume_params.borrow_mut() = Some(*params);
        Ok(carve(domain, bbox, params.max_cell_circumradius))
    }
}

impl SurfaceMesher for GridMesher {
    fn generate_surface_mesh(
        &self,
        domain: &dyn MeshDomain,
        bbox: &Aabb,
        params: &SurfaceRefinementParams,
    ) -> Result<RawMesh> {
        *self.surface_params.borrow_mut() = Some(*params);
        let h = params.max_radius_surface_delaunay_ball;
        let padded = Aabb::new(bbox.mins - Vector3::repeat(h), bbox.maxs + Vector3::repeat(h));
        let extents = padded.extents();
        let cells = extents.map(|e| ((e / h).ceil() as usize).max(1));

        let field = DomainField { domain, extents };
        let grid = ScalarGrid::sample(&field, &padded, [cells.x, cells.y, cells.z])?;
        let surface = MarchingTetrahedra::new().extract(&grid, 0.0);
        Ok(RawMesh::new(surface.vertices, Vec::new(), surface.elements))
    }
}

impl PeriodicMesher for GridMesher {
    /// Carves the unit cube and reports the carved boundary away from the
    /// cube faces, plus a stray point with a face across the seam.
    fn generate_periodic_mesh(&self, domain: &dyn MeshDomain, params: &PeriodicRefinementParams) -> Result<RawMesh> {
        *self.periodic_params.borrow_mut() = Some(*params);
        let unit = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let mut raw = carve(domain, &unit, params.max_cell_circumradius);

        let carved = SimplexMesh { vertices: raw.points.clone(), elements: raw.tetra.clone() };
        let on_cube_face = |p: &Point3<Real>| p.coords.iter().any(|&c| c == 0.0 || c == 1.0);
        raw.triangle = carved
            .boundary_facets()
            .into_iter()
            .filter(|face| !face.iter().all(|&i| on_cube_face(&carved.vertices[i])))
            .map(|[a, b, c]| [a, c, b])
            .collect();

        let stray = raw.points.len();
        raw.points.push(Point3::new(0.5, 0.5, 1.0 + params.max_cell_circumradius));
        if let Some(&[a, b, _]) = raw.triangle.first() {
            raw.triangle.push([a, b, stray]);
        }
        Ok(raw)
    }
}

/// A mesher that always fails.
#[derive(Debug, Default)]
pub struct FailingMesher;

impl VolumeMesher for FailingMesher {
    fn generate_mesh(&self, _: &dyn MeshDomain, _: &Aabb, _: &RefinementParams) -> Result<RawMesh> {
        Err(MeshingError::Mesher("refinement did not converge".into()))
    }
}

impl PeriodicMesher for FailingMesher {
    fn generate_periodic_mesh(&self, _: &dyn MeshDomain, _: &PeriodicRefinementParams) -> Result<RawMesh> {
        Err(MeshingError::Mesher("periodic triangulation failed".into()))
    }
}

/// A mesher that returns no elements.
#[derive(Debug, Default)]
pub struct EmptyMesher;

impl VolumeMesher for EmptyMesher {
    fn generate_mesh(&self, _: &dyn MeshDomain, _: &Aabb, _: &RefinementParams) -> Result<RawMesh> {
        Ok(RawMesh::new(vec![Point3::origin()], Vec::new(), Vec::new()))
    }
}

/// Schwarz P surface with period `l` along every axis, with its gradient.
pub fn schwarz_p(l: Real) -> Implicit {
    let k = 2.0 * PI / l;
    Implicit::new(
        move |p: &Point3<Real>| (k * p.x).cos() + (k * p.y).cos() + (k * p.z).cos(),
        Vector3::repeat(l),
    )
    .with_gradient(move |p: &Point3<Real>| -k * Vector3::new((k * p.x).sin(), (k * p.y).sin(), (k * p.z).sin()))
}

/// Ball of radius `r` centred in a cube of side `l`.
pub fn ball(l: Real, r: Real) -> Implicit {
    let c = Point3::new(l / 2.0, l / 2.0, l / 2.0);
    Implicit::new(move |p: &Point3<Real>| (p - c).norm() - r, Vector3::repeat(l))
}

/// True if `p` lies within `eps` of the box `[0, extents]`.
pub fn inside_box(p: &Point3<Real>, extents: &Vector3<Real>, eps: Real) -> bool {
    (0..3).all(|i| p[i] >= -eps && p[i] <= extents[i] + eps)
}

/// True if `p` lies on at least two faces of `[0, extents]`, i.e. on an edge.
pub fn on_box_edge(p: &Point3<Real>, extents: &Vector3<Real>, eps: Real) -> bool {
    (0..3)
        .filter(|&i| p[i].abs() < eps || (p[i] - extents[i]).abs() < eps)
        .count()
        >= 2
}

/// Smallest element measure of a mesh.
pub fn min_measure<E: Element>(mesh: &SimplexMesh<E>) -> Real {
    mesh.measures().into_iter().fold(Real::INFINITY, Real::min)
}

/// Sorted copy of a face, for orientation independent comparison.
pub fn sorted_face(face: &Triangle) -> Triangle {
    let mut f = *face;
    f.sort_unstable();
    f
}
