//! End-to-end meshing of implicit fields.
//!
//! Each entry point sizes the refinement from the field's shell thickness,
//! builds the meshing domain, runs the supplied mesher and cleans up its
//! output. Meshes are returned in physical units with their minimum corner
//! at the origin.

use crate::domain::{Cuboid, ImplicitDomain, Intersection, MeshDomain, PeriodicImplicitDomain};
use crate::errors::{MeshingError, Result};
use crate::feature_edges::{FeatureEdges, Segment};
use crate::float_types::{DEFAULT_PERIODIC_RESOLUTION, MAX_PERIODIC_FACET_DISTANCE, Real, parry3d::bounding_volume::Aabb};
use crate::geometry::DomainScale;
use crate::implicit::ImplicitField;
use crate::mesh::{Element, SimplexMesh, Tetrahedron, Triangle};
use crate::mesher::{
    CellType, PeriodicMesher, PeriodicRefinementParams, RefinementParams, SurfaceMesher, SurfaceRefinementParams,
    VolumeMesher,
};
use crate::periodic::{PeriodicMesh, reconcile_periodic_boundary};
use crate::postprocess::{CleanupParams, CleanupReport, clean_mesh, extract_boundary_surface};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

/// Options for [`mesh_implicit`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeshingOptions {
    /// Target number of elements across the shell thickness.
    ///
    /// Default: `2`
    pub elements_in_thickness: usize,

    /// Cells along y of the coarse feature edge scan.
    ///
    /// Default: `100`
    pub feature_edge_resolution: usize,

    /// Periods of the field along each axis.
    ///
    /// Default: `[1, 1, 1]`
    pub repeats: Vector3<usize>,

    /// Return the feature edges alongside the mesh.
    ///
    /// Default: `false`
    pub return_feature_edges: bool,

    pub perturb: bool,

    /// Sliver exudation; `None` enables it when `elements_in_thickness > 1`.
    pub exude: Option<bool>,

    pub odt: bool,
    pub lloyd: bool,

    /// Forwarded to the mesher.
    pub verbose: bool,

    pub cleanup: CleanupParams,
}

impl Default for MeshingOptions {
    fn default() -> Self {
        Self {
            elements_in_thickness: 2,
            feature_edge_resolution: 100,
            repeats: Vector3::new(1, 1, 1),
            return_feature_edges: false,
            perturb: true,
            exude: None,
            odt: false,
            lloyd: false,
            verbose: false,
            cleanup: CleanupParams::default(),
        }
    }
}

impl MeshingOptions {
    #[must_use]
    pub fn with_elements_in_thickness(mut self, n: usize) -> Self {
        self.elements_in_thickness = n;
        self
    }

    #[must_use]
    pub fn with_feature_edge_resolution(mut self, resolution: usize) -> Self {
        self.feature_edge_resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_repeats(mut self, repeats: Vector3<usize>) -> Self {
        self.repeats = repeats;
        self
    }

    #[must_use]
    pub fn with_feature_edges(mut self, return_feature_edges: bool) -> Self {
        self.return_feature_edges = return_feature_edges;
        self
    }

    #[must_use]
    pub fn with_perturb(mut self, perturb: bool) -> Self {
        self.perturb = perturb;
        self
    }

    #[must_use]
    pub fn with_exude(mut self, exude: bool) -> Self {
        self.exude = Some(exude);
        self
    }

    #[must_use]
    pub fn with_odt(mut self, odt: bool) -> Self {
        self.odt = odt;
        self
    }

    #[must_use]
    pub fn with_lloyd(mut self, lloyd: bool) -> Self {
        self.lloyd = lloyd;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_cleanup(mut self, cleanup: CleanupParams) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Options for [`mesh_implicit_surface`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMeshingOptions {
    pub elements_in_thickness: usize,
    pub feature_edge_resolution: usize,
    pub repeats: Vector3<usize>,
    pub return_feature_edges: bool,
    pub verbose: bool,
    /// Degenerate triangle cleanup. Components are kept by default.
    pub cleanup: CleanupParams,
}

impl Default for SurfaceMeshingOptions {
    fn default() -> Self {
        Self {
            elements_in_thickness: 2,
            feature_edge_resolution: 100,
            repeats: Vector3::new(1, 1, 1),
            return_feature_edges: false,
            verbose: false,
            cleanup: CleanupParams::default().with_keep_largest_component(false),
        }
    }
}

impl SurfaceMeshingOptions {
    #[must_use]
    pub fn with_elements_in_thickness(mut self, n: usize) -> Self {
        self.elements_in_thickness = n;
        self
    }

    #[must_use]
    pub fn with_feature_edge_resolution(mut self, resolution: usize) -> Self {
        self.feature_edge_resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_repeats(mut self, repeats: Vector3<usize>) -> Self {
        self.repeats = repeats;
        self
    }

    #[must_use]
    pub fn with_feature_edges(mut self, return_feature_edges: bool) -> Self {
        self.return_feature_edges = return_feature_edges;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_cleanup(mut self, cleanup: CleanupParams) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Options for [`mesh_implicit_periodic`].
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicMeshingOptions {
    /// Default: `2`
    pub elements_in_thickness: usize,
    pub perturb: bool,
    /// Default: `true`
    pub exude: bool,
    pub odt: bool,
    pub lloyd: bool,
    pub verbose: bool,
}

impl Default for PeriodicMeshingOptions {
    fn default() -> Self {
        Self { elements_in_thickness: 2, perturb: true, exude: true, odt: false, lloyd: false, verbose: false }
    }
}

impl PeriodicMeshingOptions {
    #[must_use]
    pub fn with_elements_in_thickness(mut self, n: usize) -> Self {
        self.elements_in_thickness = n;
        self
    }

    #[must_use]
    pub fn with_perturb(mut self, perturb: bool) -> Self {
        self.perturb = perturb;
        self
    }

    #[must_use]
    pub fn with_exude(mut self, exude: bool) -> Self {
        self.exude = exude;
        self
    }

    #[must_use]
    pub fn with_odt(mut self, odt: bool) -> Self {
        self.odt = odt;
        self
    }

    #[must_use]
    pub fn with_lloyd(mut self, lloyd: bool) -> Self {
        self.lloyd = lloyd;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Result of [`mesh_implicit`].
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMesh {
    pub mesh: SimplexMesh<Tetrahedron>,
    /// Feature edges in the frame of `mesh`, when requested and non-empty.
    pub feature_edges: Option<FeatureEdges>,
    pub report: CleanupReport,
}

/// Result of [`mesh_implicit_surface`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub mesh: SimplexMesh<Triangle>,
    pub feature_edges: Option<FeatureEdges>,
    pub report: CleanupReport,
}

/// Physical length that `elements_in_thickness` elements should span.
fn element_size<F: ImplicitField + ?Sized>(field: &F, elements_in_thickness: usize) -> Result<Real> {
    if elements_in_thickness == 0 {
        return Err(MeshingError::InvalidInput("elements_in_thickness must be positive".into()));
    }
    let thickness = field.thickness().unwrap_or_else(|| field.domain().max());
    if !(thickness.is_finite() && thickness > 0.0) {
        return Err(MeshingError::InvalidInput(format!("shell thickness must be positive, got {thickness}")));
    }
    Ok(thickness / elements_in_thickness as Real)
}

/// Move the mesh minimum to the origin and convert to physical units,
/// applying the same map to the feature edges.
fn to_physical<E: Element>(
    mesh: &mut SimplexMesh<E>,
    edges: Option<&FeatureEdges>,
    scale: &DomainScale,
) -> Option<FeatureEdges> {
    let offset = mesh.bounding_box().map_or_else(Vector3::zeros, |b| b.mins.coords);
    let map = |p: &Point3<Real>| scale.to_domain(&(p - offset));
    mesh.map_vertices(map);
    if let Some(bbox) = mesh.bounding_box() {
        debug!("Mesh bbox: {:?} {:?}", bbox.mins, bbox.maxs);
    }
    edges.filter(|e| !e.is_empty()).map(|e| e.mapped(map))
}

/// Volume mesh of `options.repeats` periods of `field`.
pub fn mesh_implicit<F, M>(field: &F, options: &MeshingOptions, mesher: &M) -> Result<VolumeMesh>
where
    F: ImplicitField,
    M: VolumeMesher + ?Sized,
{
    let scale = DomainScale::repeated(&field.domain(), &options.repeats)?;
    let res = scale.length_to_unit(element_size(field, options.elements_in_thickness)?);
    info!("Mesh resolution: {}", res);

    let implicit = ImplicitDomain::new(field, options.repeats, options.feature_edge_resolution)?;
    let bbox = scale.unit_box();
    debug!("Mesher bounding box: {:?} {:?}", bbox.mins, bbox.maxs);

    let children: Vec<Box<dyn MeshDomain + '_>> = vec![Box::new(&implicit), Box::new(Cuboid::new(bbox))];
    let domain = Intersection::new(children)?;

    let params = RefinementParams {
        perturb: options.perturb,
        exude: options.exude.unwrap_or(options.elements_in_thickness > 1),
        odt: options.odt,
        lloyd: options.lloyd,
        verbose: options.verbose,
        ..RefinementParams::from_resolution(res)
    };
    let raw = mesher.generate_mesh(&domain, &bbox, &params)?;
    info!("Meshing done: {} points, {} tetrahedra", raw.points.len(), raw.tetra.len());
    raw.require(CellType::Tetra)?;

    let (mut mesh, report) = clean_mesh(raw.tetrahedra()?, &options.cleanup)?;
    let edges = options.return_feature_edges.then(|| implicit.edges());
    let feature_edges = to_physical(&mut mesh, edges, &scale);

    info!("Volume mesh: {} vertices, {} tetrahedra", mesh.vertices.len(), mesh.elements.len());
    Ok(VolumeMesh { mesh, feature_edges, report })
}

/// Translates a domain so that its physical box is centred on the origin.
struct Centered<D> {
    inner: D,
    half: Vector3<Real>,
    edges: Vec<Segment>,
}

impl<D: MeshDomain> Centered<D> {
    fn new(inner: D, half: Vector3<Real>) -> Self {
        let edges = inner.feature_edges().iter().map(|[a, b]| [a - half, b - half]).collect();
        Self { inner, half, edges }
    }
}

impl<D: MeshDomain> MeshDomain for Centered<D> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        self.inner.eval(&(p + self.half))
    }

    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        self.inner.bounding_sphere_squared_radius()
    }

    fn feature_edges(&self) -> &[Segment] {
        &self.edges
    }
}

/// Surface mesh of `options.repeats` periods of `field`.
///
/// The mesher sees the region centred on the origin and bounded by a sphere
/// slightly larger than its half diagonal. Disconnected pieces are kept.
pub fn mesh_implicit_surface<F, M>(field: &F, options: &SurfaceMeshingOptions, mesher: &M) -> Result<SurfaceMesh>
where
    F: ImplicitField,
    M: SurfaceMesher + ?Sized,
{
    let scale = DomainScale::repeated(&field.domain(), &options.repeats)?;
    let res = scale.length_to_unit(element_size(field, options.elements_in_thickness)?);
    info!("Mesh resolution: {}", res);

    let implicit = ImplicitDomain::new(field, options.repeats, options.feature_edge_resolution)?;
    let half = scale.unit_extents() / 2.0;
    let bbox = Aabb::new(Point3::from(-half), Point3::from(half));

    let centered = Centered::new(&implicit, half);
    let children: Vec<Box<dyn MeshDomain + '_>> = vec![Box::new(&centered), Box::new(Cuboid::new(bbox))];
    let domain = Intersection::new(children)?;

    let params = SurfaceRefinementParams {
        bounding_sphere_radius: 1.01 * half.norm(),
        max_radius_surface_delaunay_ball: res,
        max_facet_distance: 0.1 * res,
        verbose: options.verbose,
    };
    let raw = mesher.generate_surface_mesh(&domain, &bbox, &params)?;
    info!("Meshing done: {} points, {} triangles", raw.points.len(), raw.triangle.len());
    raw.require(CellType::Triangle)?;

    let (mut mesh, report) = clean_mesh(raw.triangles()?, &options.cleanup)?;
    let edges = options.return_feature_edges.then(|| implicit.edges());
    let feature_edges = to_physical(&mut mesh, edges, &scale);

    info!("Surface mesh: {} vertices, {} triangles", mesh.vertices.len(), mesh.elements.len());
    Ok(SurfaceMesh { mesh, feature_edges, report })
}

/// Periodic volume mesh of one period of `field`.
///
/// The cell is meshed on the unit cube and scaled componentwise to the field
/// domain; the returned boundary faces exclude the periodic seam.
pub fn mesh_implicit_periodic<F, M>(field: &F, options: &PeriodicMeshingOptions, mesher: &M) -> Result<PeriodicMesh>
where
    F: ImplicitField,
    M: PeriodicMesher + ?Sized,
{
    let domain_extents = field.domain();
    let res = match field.thickness() {
        Some(_) => element_size(field, options.elements_in_thickness)? / domain_extents.max(),
        None => DEFAULT_PERIODIC_RESOLUTION,
    };
    info!("Periodic mesh resolution: {}", res);

    let domain = PeriodicImplicitDomain::new(field)?;
    let params = PeriodicRefinementParams {
        max_cell_circumradius: res,
        max_radius_surface_delaunay_ball: res,
        max_facet_distance: (0.1 * res).min(MAX_PERIODIC_FACET_DISTANCE),
        manifold: true,
        copies: 1,
        perturb: options.perturb,
        exude: options.exude,
        odt: options.odt,
        lloyd: options.lloyd,
        verbose: options.verbose,
    };
    let raw = mesher.generate_periodic_mesh(&domain, &params)?;
    info!("Meshing done: {} points, {} tetrahedra", raw.points.len(), raw.tetra.len());
    raw.require(CellType::Tetra)?;

    reconcile_periodic_boundary(raw.points, raw.tetra, &raw.triangle, &domain_extents)
}

/// Outward boundary surface of a volume mesh.
///
/// Fails with [`MeshingError::Cavities`] when the boundary is not one
/// connected surface.
pub fn mesh_surface_from_volume(volume: &SimplexMesh<Tetrahedron>) -> Result<SimplexMesh<Triangle>> {
    info!("Extracting surface mesh from {} tetrahedra", volume.elements.len());
    extract_boundary_surface(volume)
}
