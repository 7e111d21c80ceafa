//! Cleanup of raw mesher output.
//!
//! Delaunay refinement occasionally leaves slivers whose vertices coincide
//! up to rounding, unreferenced points and small disconnected pieces.
//! [`clean_mesh`] removes all of these and checks that what remains is
//! positively oriented.

use crate::errors::{MeshingError, Result};
use crate::float_types::{DUPLICATE_VERTEX_TOLERANCE, Real, VOLUME_TOLERANCE};
use crate::mesh::{Element, SimplexMesh, Tetrahedron, Triangle};
use tracing::{debug, info, warn};

/// Parameters for [`clean_mesh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanupParams {
    /// Elements with a measure (signed volume or area) at or below this are
    /// discarded.
    ///
    /// Default: `1e-12`
    pub volume_tolerance: Real,

    /// Weld distance applied when degenerate elements are found.
    ///
    /// Default: `1e-12`
    pub merge_tolerance: Real,

    /// Keep only the component with the most elements.
    ///
    /// Default: `true`
    pub keep_largest_component: bool,
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            volume_tolerance: VOLUME_TOLERANCE,
            merge_tolerance: DUPLICATE_VERTEX_TOLERANCE,
            keep_largest_component: true,
        }
    }
}

impl CleanupParams {
    #[must_use]
    pub fn with_volume_tolerance(mut self, tolerance: Real) -> Self {
        self.volume_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_merge_tolerance(mut self, tolerance: Real) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Set whether disconnected pieces are dropped.
    #[must_use]
    pub fn with_keep_largest_component(mut self, keep: bool) -> Self {
        self.keep_largest_component = keep;
        self
    }
}

/// What [`clean_mesh`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Vertices merged into a closer-than-tolerance neighbour.
    pub merged_vertices: usize,
    /// Elements discarded for a measure at or below the tolerance.
    pub degenerate_elements: usize,
    /// Vertices dropped because no element referenced them.
    pub unreferenced_vertices: usize,
    /// Connected components before filtering.
    pub components: usize,
    /// Elements dropped together with the smaller components.
    pub removed_component_elements: usize,
}

impl CleanupReport {
    /// Check if cleanup changed anything.
    #[must_use]
    pub fn had_changes(&self) -> bool {
        self.merged_vertices > 0
            || self.degenerate_elements > 0
            || self.unreferenced_vertices > 0
            || self.removed_component_elements > 0
    }
}

impl std::fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cleanup: {} merged, {} degenerate, {} unreferenced, {} components ({} elements removed)",
            self.merged_vertices,
            self.degenerate_elements,
            self.unreferenced_vertices,
            self.components,
            self.removed_component_elements
        )
    }
}

/// Remove degenerate elements, unreferenced vertices and (optionally) all but
/// the largest component.
///
/// Degenerate elements first trigger a weld at `merge_tolerance`, since most
/// of them come from duplicated points; whatever is still at or below
/// `volume_tolerance` afterwards is discarded.
pub fn clean_mesh<E: Element>(
    mut mesh: SimplexMesh<E>,
    params: &CleanupParams,
) -> Result<(SimplexMesh<E>, CleanupReport)> {
    if mesh.vertices.is_empty() {
        return Err(MeshingError::EmptyMesh("mesh vertices"));
    }
    if mesh.elements.is_empty() {
        return Err(MeshingError::EmptyMesh(E::NAME));
    }
    mesh.check_indices()?;

    let mut report = CleanupReport::default();
    let tolerance = params.volume_tolerance;

    let mut measures = mesh.measures();
    if measures.iter().any(|&m| m < tolerance) {
        report.merged_vertices = mesh.merge_vertices(params.merge_tolerance);
        if report.merged_vertices > 0 {
            info!("Merged {} duplicate vertices", report.merged_vertices);
        }
        measures = mesh.measures();
    }

    let before = mesh.elements.len();
    mesh.retain_elements(|i, _| !(measures[i] <= tolerance));
    report.degenerate_elements = before - mesh.elements.len();
    if report.degenerate_elements > 0 {
        info!("Removed {} degenerate {} elements", report.degenerate_elements, E::NAME);
    }
    if mesh.elements.is_empty() {
        return Err(MeshingError::EmptyMesh(E::NAME));
    }

    let vertex_count = mesh.vertices.len();
    mesh.remove_unreferenced();
    report.unreferenced_vertices = vertex_count - mesh.vertices.len();
    debug!("Removed {} unreferenced vertices", report.unreferenced_vertices);

    if let Some((element, measure)) = mesh
        .measures()
        .into_iter()
        .enumerate()
        .find(|&(_, m)| !(m > 0.0))
    {
        return Err(MeshingError::NonPositiveElement { element, measure });
    }

    report.components = mesh.component_count();
    if report.components > 1 && params.keep_largest_component {
        report.removed_component_elements = remove_small_components(&mut mesh)?;
    }

    debug!("{}", report);
    Ok((mesh, report))
}

/// Component label per vertex; elements sharing a vertex are connected.
pub fn connected_components<E: Element>(mesh: &SimplexMesh<E>) -> Result<Vec<usize>> {
    mesh.check_indices()?;
    Ok(mesh.vertex_components())
}

/// Keep only the component with the most elements (the first one on ties)
/// and compact the mesh. Returns the number of elements removed.
pub fn remove_small_components<E: Element>(mesh: &mut SimplexMesh<E>) -> Result<usize> {
    mesh.check_indices()?;
    let labels = mesh.element_components();
    let Some(&max_label) = labels.iter().max() else {
        return Ok(0);
    };

    let mut sizes = vec![0usize; max_label + 1];
    for &label in &labels {
        sizes[label] += 1;
    }
    let components = sizes.iter().filter(|&&s| s > 0).count();
    if components < 2 {
        return Ok(0);
    }
    // First maximum wins
    let largest = sizes
        .iter()
        .enumerate()
        .fold(0, |best, (label, &size)| if size > sizes[best] { label } else { best });

    warn!(
        "Multiple components detected ({}), keeping only the largest with {} elements",
        components, sizes[largest]
    );

    let before = mesh.elements.len();
    mesh.retain_elements(|i, _| labels[i] == largest);
    mesh.remove_unreferenced();
    Ok(before - mesh.elements.len())
}

/// True if the triangles form exactly one vertex-connected piece. Meshes
/// with out-of-range indices are not a surface.
pub fn is_single_surface(mesh: &SimplexMesh<Triangle>) -> bool {
    !mesh.is_empty() && mesh.check_indices().is_ok() && mesh.component_count() == 1
}

/// Outward boundary triangles of a tetrahedral mesh, compacted.
///
/// Fails with [`MeshingError::Cavities`] unless the boundary is a single
/// connected surface.
pub fn extract_boundary_surface(volume: &SimplexMesh<Tetrahedron>) -> Result<SimplexMesh<Triangle>> {
    if volume.is_empty() {
        return Err(MeshingError::EmptyMesh(Tetrahedron::NAME));
    }
    volume.check_indices()?;

    let mut surface = SimplexMesh { vertices: volume.vertices.clone(), elements: volume.boundary_facets() };
    surface.remove_unreferenced();
    debug!(
        "Boundary surface: {} vertices, {} triangles",
        surface.vertices.len(),
        surface.elements.len()
    );

    if !is_single_surface(&surface) {
        return Err(MeshingError::Cavities { components: surface.component_count() });
    }
    Ok(surface)
}
