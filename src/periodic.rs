//! Periodic unit cells: seam cleanup, tiling and periodic connectivity.
//!
//! A periodic mesher works on the unit cube and reports the boundary
//! triangles of the whole periodic triangulation, including faces that
//! belong to copies across the seam. [`reconcile_periodic_boundary`] keeps
//! only the faces of the returned cell and scales it to the physical domain.

use crate::errors::{MeshingError, Result};
use crate::float_types::{PERIODIC_MATCH_TOLERANCE, Real, TILING_MERGE_TOLERANCE, parry3d::bounding_volume::Aabb};
use crate::mesh::spatial::SpatialHash;
use crate::mesh::{Element, SimplexMesh, Tetrahedron, Triangle};
use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

/// A periodic cell and its outward surface triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicMesh {
    pub mesh: SimplexMesh<Tetrahedron>,
    /// Triangles of the solid's surface, indices into `mesh.vertices`.
    /// Faces on the periodic seam are not included.
    pub boundary_faces: Vec<Triangle>,
}

impl PeriodicMesh {
    /// The boundary faces as a standalone triangle mesh.
    pub fn boundary_surface(&self) -> SimplexMesh<Triangle> {
        let mut surface = SimplexMesh { vertices: self.mesh.vertices.clone(), elements: self.boundary_faces.clone() };
        surface.remove_unreferenced();
        surface
    }
}

/// Turn raw periodic mesher output on the unit cube into a clean cell.
///
/// Vertices no tetrahedron uses are dropped, raw triangles touching them go
/// with them, and the surviving boundary is re-derived from the tetrahedra so
/// it is consistently oriented outward. Vertices are finally scaled
/// componentwise by `domain`.
pub fn reconcile_periodic_boundary(
    vertices: Vec<Point3<Real>>,
    tetrahedra: Vec<Tetrahedron>,
    triangles: &[Triangle],
    domain: &Vector3<Real>,
) -> Result<PeriodicMesh> {
    if vertices.is_empty() {
        return Err(MeshingError::EmptyMesh("periodic mesh vertices"));
    }
    if tetrahedra.is_empty() {
        return Err(MeshingError::EmptyMesh(Tetrahedron::NAME));
    }
    let vertex_count = vertices.len();
    if let Some(&index) = triangles.iter().flatten().find(|&&i| i >= vertex_count) {
        return Err(MeshingError::InvalidIndex { index, vertex_count });
    }

    let mut mesh = SimplexMesh::from_parts(vertices, tetrahedra)?;
    let remap = mesh.remove_unreferenced();

    let remapped: Vec<Triangle> = triangles
        .iter()
        .filter_map(|tri| {
            let [a, b, c] = tri.map(|i| remap[i]);
            Some([a?, b?, c?])
        })
        .collect();
    debug!(
        "Periodic boundary: {} of {} raw triangles survive vertex compaction",
        remapped.len(),
        triangles.len()
    );

    let surface_vertices: HashSet<usize> = remapped.iter().flatten().copied().collect();
    let boundary_faces: Vec<Triangle> = mesh
        .boundary_facets()
        .into_iter()
        .filter(|face| face.iter().all(|i| surface_vertices.contains(i)))
        .collect();
    info!("Periodic cell: {} tetrahedra, {} boundary faces", mesh.elements.len(), boundary_faces.len());

    mesh.map_vertices(|p| Point3::from(p.coords.component_mul(domain)));
    Ok(PeriodicMesh { mesh, boundary_faces })
}

/// Repeat a periodic cell `repeats` times along each axis.
///
/// Copies are laid out with x varying fastest; copy `(i, j, k)` is translated
/// by `(i, j, k) ⊙ period`. Coincident vertices on shared faces are welded
/// at a coarse tolerance, elements are never dropped.
pub fn tile_mesh(
    mesh: &SimplexMesh<Tetrahedron>,
    period: &Vector3<Real>,
    repeats: &Vector3<usize>,
) -> Result<SimplexMesh<Tetrahedron>> {
    if repeats.iter().any(|&r| r == 0) {
        return Err(MeshingError::InvalidInput(format!(
            "repeat counts must be at least one, got {repeats:?}"
        )));
    }
    mesh.check_indices()?;

    let mut tiled = SimplexMesh::new();
    for k in 0..repeats.z {
        for j in 0..repeats.y {
            for i in 0..repeats.x {
                let offset = Vector3::new(i as Real, j as Real, k as Real).component_mul(period);
                let mut copy = mesh.clone();
                copy.translate(&offset);
                tiled.append(&copy);
            }
        }
    }

    let merged = tiled.merge_vertices(TILING_MERGE_TOLERANCE);
    debug!("Tiling welded {} vertices", merged);
    Ok(tiled)
}

/// Vertex component labels where vertices matching across opposite faces
/// of `bounds` count as connected.
///
/// `bounds` defaults to the bounding box of the vertices. For each axis every
/// vertex is translated by the box span and joined to the nearest vertex
/// when that one is within a tight tolerance.
pub fn periodic_components<E: Element>(mesh: &SimplexMesh<E>, bounds: Option<&Aabb>) -> Result<Vec<usize>> {
    mesh.check_indices()?;
    let mut uf = mesh.vertex_union_find();
    let Some(bounds) = bounds.copied().or_else(|| mesh.bounding_box()) else {
        return Ok(uf.labels());
    };

    let span = bounds.maxs - bounds.mins;
    let index = SpatialHash::new(&mesh.vertices, PERIODIC_MATCH_TOLERANCE);
    for axis in 0..3 {
        let mut shift = Vector3::zeros();
        shift[axis] = span[axis];
        for (vi, v) in mesh.vertices.iter().enumerate() {
            if let Some(vj) = index.nearest_within(&mesh.vertices, &(v + shift), PERIODIC_MATCH_TOLERANCE) {
                uf.union(vi, vj);
            }
        }
    }
    Ok(uf.labels())
}

/// Number of distinct labels in [`periodic_components`].
pub fn periodic_component_count<E: Element>(mesh: &SimplexMesh<E>, bounds: Option<&Aabb>) -> Result<usize> {
    Ok(periodic_components(mesh, bounds)?.into_iter().max().map_or(0, |m| m + 1))
}
