//! Meshing domains handed to the external mesher.
//!
//! A [`MeshDomain`] answers three questions: is a point inside (negative
//! value), how large is a sphere enclosing the domain, and which feature
//! curves must be preserved. All domains here work in the normalized mesher
//! frame.

use crate::errors::{MeshingError, Result};
use crate::feature_edges::{FeatureEdgeExtractor, FeatureEdges, Segment};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::geometry::DomainScale;
use crate::implicit::ImplicitField;
use crate::sdf::IsoSurfacer;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Inside/outside predicate with feature curves.
pub trait MeshDomain {
    /// Signed value at `p`, negative inside.
    fn eval(&self, p: &Point3<Real>) -> Real;

    /// Squared radius of a sphere enclosing the domain.
    fn bounding_sphere_squared_radius(&self) -> Result<Real>;

    /// Feature segments to preserve, in the mesher frame.
    fn feature_edges(&self) -> &[Segment];
}

impl<T: MeshDomain + ?Sized> MeshDomain for &T {
    fn eval(&self, p: &Point3<Real>) -> Real {
        (**self).eval(p)
    }

    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        (**self).bounding_sphere_squared_radius()
    }

    fn feature_edges(&self) -> &[Segment] {
        (**self).feature_edges()
    }
}

impl<T: MeshDomain + ?Sized> MeshDomain for Box<T> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        (**self).eval(p)
    }

    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        (**self).bounding_sphere_squared_radius()
    }

    fn feature_edges(&self) -> &[Segment] {
        (**self).feature_edges()
    }
}

/// An implicit field, possibly repeated, viewed in the mesher frame.
///
/// The feature edges are computed once on construction by scanning the
/// repeated physical region.
#[derive(Debug)]
pub struct ImplicitDomain<F> {
    field: F,
    scale: DomainScale,
    edges: FeatureEdges,
}

impl<F: ImplicitField> ImplicitDomain<F> {
    /// Domain covering `repeats` periods of `field`, with feature edges from a
    /// marching tetrahedra scan at `feature_edge_resolution` cells along y.
    pub fn new(field: F, repeats: Vector3<usize>, feature_edge_resolution: usize) -> Result<Self> {
        Self::with_extractor(field, repeats, &FeatureEdgeExtractor::new(feature_edge_resolution))
    }

    /// As [`ImplicitDomain::new`] with a configured extractor.
    pub fn with_extractor<I: IsoSurfacer>(
        field: F,
        repeats: Vector3<usize>,
        extractor: &FeatureEdgeExtractor<I>,
    ) -> Result<Self> {
        let scale = DomainScale::repeated(&field.domain(), &repeats)?;
        let edges = extractor.extract(&field, &scale)?;
        debug!(
            "Implicit domain: {} feature edges, segment length in [{}, {}]",
            edges.len(),
            edges.min_segment_length(),
            edges.max_segment_length()
        );
        Ok(Self { field, scale, edges })
    }

    pub const fn scale(&self) -> &DomainScale {
        &self.scale
    }

    pub const fn field(&self) -> &F {
        &self.field
    }

    pub const fn edges(&self) -> &FeatureEdges {
        &self.edges
    }
}

impl<F: ImplicitField> MeshDomain for ImplicitDomain<F> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        self.field.eval(&self.scale.to_domain(p))
    }

    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        Err(MeshingError::Unsupported("bounding sphere of an implicit domain"))
    }

    fn feature_edges(&self) -> &[Segment] {
        self.edges.segments()
    }
}

/// One period of a field mapped onto the unit cube.
///
/// Unlike [`ImplicitDomain`] the mapping is componentwise, `p ↦ domain ⊙ p`,
/// since periodic meshers work on `[0, 1]³`.
#[derive(Debug)]
pub struct PeriodicImplicitDomain<F> {
    field: F,
    domain: Vector3<Real>,
}

impl<F: ImplicitField> PeriodicImplicitDomain<F> {
    pub fn new(field: F) -> Result<Self> {
        let domain = field.domain();
        // Validates the extents
        DomainScale::new(domain)?;
        Ok(Self { field, domain })
    }

    pub const fn domain(&self) -> &Vector3<Real> {
        &self.domain
    }
}

impl<F: ImplicitField> MeshDomain for PeriodicImplicitDomain<F> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        self.field.eval(&Point3::from(p.coords.component_mul(&self.domain)))
    }

    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        Err(MeshingError::Unsupported("bounding sphere of a periodic implicit domain"))
    }

    fn feature_edges(&self) -> &[Segment] {
        &[]
    }
}

/// Axis-aligned box domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    bbox: Aabb,
}

impl Cuboid {
    pub const fn new(bbox: Aabb) -> Self {
        Self { bbox }
    }

    pub const fn aabb(&self) -> &Aabb {
        &self.bbox
    }
}

impl MeshDomain for Cuboid {
    /// Largest signed slab distance over the three axes.
    fn eval(&self, p: &Point3<Real>) -> Real {
        let (lo, hi) = (&self.bbox.mins, &self.bbox.maxs);
        (0..3)
            .map(|i| (lo[i] - p[i]).max(p[i] - hi[i]))
            .fold(Real::NEG_INFINITY, Real::max)
    }

    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        Ok(self.bbox.half_extents().norm_squared())
    }

    fn feature_edges(&self) -> &[Segment] {
        &[]
    }
}

/// Pointwise intersection of several domains.
///
/// Feature edges are taken from the first child only; curves where the
/// children meet are not added.
pub struct Intersection<'a> {
    children: Vec<Box<dyn MeshDomain + 'a>>,
}

impl<'a> Intersection<'a> {
    pub fn new(children: Vec<Box<dyn MeshDomain + 'a>>) -> Result<Self> {
        if children.is_empty() {
            return Err(MeshingError::InvalidInput("intersection needs at least one domain".into()));
        }
        Ok(Self { children })
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl std::fmt::Debug for Intersection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Intersection").field("children", &self.children.len()).finish()
    }
}

impl MeshDomain for Intersection<'_> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        self.children
            .iter()
            .map(|c| c.eval(p))
            .fold(Real::NEG_INFINITY, Real::max)
    }

    /// Smallest child sphere. The first error met is returned.
    fn bounding_sphere_squared_radius(&self) -> Result<Real> {
        let mut radius = Real::INFINITY;
        for child in &self.children {
            radius = radius.min(child.bounding_sphere_squared_radius()?);
        }
        Ok(radius)
    }

    fn feature_edges(&self) -> &[Segment] {
        self.children.first().map_or(&[], |c| c.feature_edges())
    }
}
