//! Interface to external Delaunay refinement meshers.
//!
//! The crate does no Delaunay refinement itself. A mesher receives a
//! [`MeshDomain`] and refinement parameters and returns a [`RawMesh`]: points
//! plus element blocks with no cleanliness guarantees.

use crate::domain::MeshDomain;
use crate::errors::{MeshingError, Result};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::mesh::{Element, SimplexMesh, Tetrahedron, Triangle};
use nalgebra::Point3;

/// Element block type of a [`RawMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Tetra,
    Triangle,
}

/// Mesher output: points and per-type connectivity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub points: Vec<Point3<Real>>,
    pub tetra: Vec<Tetrahedron>,
    pub triangle: Vec<Triangle>,
}

impl RawMesh {
    pub const fn new(points: Vec<Point3<Real>>, tetra: Vec<Tetrahedron>, triangle: Vec<Triangle>) -> Self {
        Self { points, tetra, triangle }
    }

    /// Number of cells in the block of type `cell`.
    pub fn cell_count(&self, cell: CellType) -> usize {
        match cell {
            CellType::Tetra => self.tetra.len(),
            CellType::Triangle => self.triangle.len(),
        }
    }

    /// Tetrahedra with all points, indices checked.
    pub fn tetrahedra(&self) -> Result<SimplexMesh<Tetrahedron>> {
        SimplexMesh::from_parts(self.points.clone(), self.tetra.clone())
    }

    /// Triangles with all points, indices checked.
    pub fn triangles(&self) -> Result<SimplexMesh<Triangle>> {
        SimplexMesh::from_parts(self.points.clone(), self.triangle.clone())
    }

    /// Fails unless the block of type `cell` has at least one element.
    pub fn require(&self, cell: CellType) -> Result<()> {
        if self.cell_count(cell) == 0 {
            let name = match cell {
                CellType::Tetra => Tetrahedron::NAME,
                CellType::Triangle => Triangle::NAME,
            };
            return Err(MeshingError::EmptyMesh(name));
        }
        Ok(())
    }
}

/// Volume refinement criteria, lengths in the mesher frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementParams {
    pub max_cell_circumradius: Real,
    pub max_radius_surface_delaunay_ball: Real,
    pub max_facet_distance: Real,
    pub min_edge_size_at_feature_edges: Real,
    pub perturb: bool,
    pub exude: bool,
    pub odt: bool,
    pub lloyd: bool,
    pub verbose: bool,
}

impl RefinementParams {
    /// Criteria derived from a single target resolution.
    pub const fn from_resolution(res: Real) -> Self {
        Self {
            max_cell_circumradius: res,
            max_radius_surface_delaunay_ball: res,
            max_facet_distance: 0.1 * res,
            min_edge_size_at_feature_edges: res,
            perturb: true,
            exude: false,
            odt: false,
            lloyd: false,
            verbose: false,
        }
    }
}

/// Surface refinement criteria.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRefinementParams {
    pub bounding_sphere_radius: Real,
    pub max_radius_surface_delaunay_ball: Real,
    pub max_facet_distance: Real,
    pub verbose: bool,
}

/// Periodic refinement criteria on the unit cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicRefinementParams {
    pub max_cell_circumradius: Real,
    pub max_radius_surface_delaunay_ball: Real,
    pub max_facet_distance: Real,
    pub manifold: bool,
    /// Number of periodic copies written by the mesher.
    pub copies: usize,
    pub perturb: bool,
    pub exude: bool,
    pub odt: bool,
    pub lloyd: bool,
    pub verbose: bool,
}

/// 3D Delaunay refinement over a bounded domain.
pub trait VolumeMesher {
    fn generate_mesh(&self, domain: &dyn MeshDomain, bbox: &Aabb, params: &RefinementParams) -> Result<RawMesh>;
}

/// Surface meshing of a domain enclosed in a sphere centred at the origin.
pub trait SurfaceMesher {
    fn generate_surface_mesh(
        &self,
        domain: &dyn MeshDomain,
        bbox: &Aabb,
        params: &SurfaceRefinementParams,
    ) -> Result<RawMesh>;
}

/// Periodic meshing on the unit cube.
pub trait PeriodicMesher {
    fn generate_periodic_mesh(&self, domain: &dyn MeshDomain, params: &PeriodicRefinementParams) -> Result<RawMesh>;
}
