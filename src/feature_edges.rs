//! Feature edge extraction for implicit domains.
//!
//! The mesher only keeps sharp creases it is told about. Two kinds are
//! collected here, both expressed in the normalized mesher frame:
//!
//! - the open boundary of a coarse iso-surface scan: where the level set
//!   runs into the domain box (or terminates), the scanned surface has edges
//!   used by a single triangle;
//! - the pieces of the twelve box edges that lie inside the field: a solid
//!   cut by the box has creases along the box edges which the scan alone does
//!   not produce.

use crate::errors::{MeshingError, Result};
use crate::float_types::{DOMAIN_PADDING, MIN_FEATURE_SEGMENT_LENGTH, Real};
use crate::geometry::{DomainScale, grid_resolution, lerp, point_finite};
use crate::implicit::ImplicitField;
use crate::sdf::{IsoSurfacer, MarchingTetrahedra, ScalarGrid};
use nalgebra::Point3;
use tracing::debug;

/// A straight feature segment.
pub type Segment = [Point3<Real>; 2];

/// Unit cube corners, bit pattern free ordering used by [`CUBE_EDGES`].
const CUBE_VERTICES: [[Real; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// The twelve edges of the unit cube as pairs of [`CUBE_VERTICES`].
const CUBE_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Ordered set of feature segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureEdges {
    segments: Vec<Segment>,
}

impl FeatureEdges {
    pub const fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn lengths(&self) -> impl Iterator<Item = Real> + '_ {
        self.segments.iter().map(|[a, b]| (b - a).norm())
    }

    /// Length of the shortest segment, `0` when empty.
    pub fn min_segment_length(&self) -> Real {
        self.lengths().reduce(Real::min).unwrap_or(0.0)
    }

    /// Length of the longest segment, `0` when empty.
    pub fn max_segment_length(&self) -> Real {
        self.lengths().reduce(Real::max).unwrap_or(0.0)
    }

    /// Sum of all segment lengths.
    pub fn total_length(&self) -> Real {
        self.lengths().sum()
    }

    /// Copy with `f` applied to every endpoint.
    pub fn mapped<F>(&self, f: F) -> FeatureEdges
    where
        F: Fn(&Point3<Real>) -> Point3<Real>,
    {
        FeatureEdges::new(self.segments.iter().map(|[a, b]| [f(a), f(b)]).collect())
    }
}

/// Feature edge scanner with a configurable iso-surfacer.
#[derive(Debug, Clone)]
pub struct FeatureEdgeExtractor<I = MarchingTetrahedra> {
    resolution: usize,
    surfacer: I,
    padding: Real,
}

impl FeatureEdgeExtractor<MarchingTetrahedra> {
    /// Scanner with `resolution` grid cells along y.
    pub const fn new(resolution: usize) -> Self {
        Self { resolution, surfacer: MarchingTetrahedra::new(), padding: DOMAIN_PADDING }
    }
}

impl<I: IsoSurfacer> FeatureEdgeExtractor<I> {
    /// Use a different iso-surfacer for the coarse scan.
    pub fn with_surfacer<J: IsoSurfacer>(self, surfacer: J) -> FeatureEdgeExtractor<J> {
        FeatureEdgeExtractor { resolution: self.resolution, surfacer, padding: self.padding }
    }

    /// Grow the scanned box by `padding` (physical units) on every side.
    pub const fn with_padding(mut self, padding: Real) -> Self {
        self.padding = padding;
        self
    }

    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    /// Scan `field` over the physical region described by `scale` and return
    /// the feature segments in the normalized frame: open boundary edges of
    /// the coarse surface first, then clipped box edges.
    pub fn extract<F: ImplicitField + ?Sized>(&self, field: &F, scale: &DomainScale) -> Result<FeatureEdges> {
        if self.resolution == 0 {
            return Err(MeshingError::InvalidInput("feature edge resolution must be positive".into()));
        }

        let bbox = scale.padded_box(self.padding);
        let cells = grid_resolution(&bbox, self.resolution);
        debug!("Feature edge scan grid: {:?} cells", cells);

        let grid = ScalarGrid::sample(field, &bbox, cells)?;
        let (min, max) = grid.range();
        debug!("Feature edge scan range: [{}, {}]", min, max);
        if !grid.crosses(0.0) {
            return Err(MeshingError::NoZeroCrossing { min, max });
        }

        let surface = self.surfacer.extract(&grid, 0.0);
        if surface.elements.is_empty() {
            return Err(MeshingError::EmptyMesh("coarse iso-surface"));
        }
        if !surface.vertices.iter().all(point_finite) {
            return Err(MeshingError::NonFiniteGeometry("coarse iso-surface"));
        }

        let mut segments: Vec<Segment> = surface
            .boundary_facets()
            .into_iter()
            .map(|[a, b]| [scale.to_unit(&surface.vertices[a]), scale.to_unit(&surface.vertices[b])])
            .filter(is_long_enough)
            .collect();
        let boundary_count = segments.len();

        segments.extend(box_edge_segments(field, scale, cells));
        if !segments.iter().flatten().all(point_finite) {
            return Err(MeshingError::NonFiniteGeometry("feature edges"));
        }

        debug!(
            "Feature edges: {} scan boundary + {} box edge segments",
            boundary_count,
            segments.len() - boundary_count
        );
        Ok(FeatureEdges::new(segments))
    }
}

/// Segments collapsed by clamped interpolation never reach the mesher.
fn is_long_enough([a, b]: &Segment) -> bool {
    (b - a).norm() >= MIN_FEATURE_SEGMENT_LENGTH
}

/// Pieces of the physical box edges where the field is inside, subdivided
/// like the scan grid and mapped to the normalized frame.
fn box_edge_segments<F: ImplicitField + ?Sized>(field: &F, scale: &DomainScale, cells: [usize; 3]) -> Vec<Segment> {
    let extents = scale.extents();
    let corner = |k: usize| {
        let [x, y, z] = CUBE_VERTICES[k];
        Point3::new(x * extents.x, y * extents.y, z * extents.z)
    };

    let mut segments = Vec::new();
    for [ia, ib] in CUBE_EDGES {
        let (a, b) = (corner(ia), corner(ib));
        // Box edges are axis aligned
        let axis = (b - a).abs().imax();
        let n = cells[axis];

        for i in 0..n {
            let c = lerp(&a, &b, i as Real / n as Real);
            let d = lerp(&a, &b, (i + 1) as Real / n as Real);
            let sc = field.eval(&c);
            let sd = field.eval(&d);
            if !(sc <= 0.0 || sd <= 0.0) {
                continue;
            }

            let crossing = || lerp(&c, &d, sc / (sc - sd));
            let start = if sc <= 0.0 { c } else { crossing() };
            let end = if sd <= 0.0 { d } else { crossing() };

            let segment = [scale.to_unit(&start), scale.to_unit(&end)];
            if is_long_enough(&segment) {
                segments.push(segment);
            }
        }
    }
    segments
}

/// Scan `field` with marching tetrahedra at `resolution` cells along y.
pub fn extract_feature_edges<F: ImplicitField + ?Sized>(
    field: &F,
    scale: &DomainScale,
    resolution: usize,
) -> Result<FeatureEdges> {
    FeatureEdgeExtractor::new(resolution).extract(field, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implicit::{CuboidField, Implicit};
    use nalgebra::Vector3;

    fn on_box_edge(p: &Point3<Real>, unit: &Vector3<Real>) -> bool {
        let on_face = |i: usize| p[i].abs() < 1e-9 || (p[i] - unit[i]).abs() < 1e-9;
        (0..3).filter(|&i| on_face(i)).count() >= 2
    }

    #[test]
    fn cuboid_edges_trace_the_box() {
        let r = 28.05;
        let h = 153.9;
        let extents = Vector3::new(2.0 * r, h, 2.0 * r);
        let field = CuboidField::new(Point3::origin(), Point3::from(extents));
        let scale = DomainScale::new(extents).unwrap();

        let edges = extract_feature_edges(&field, &scale, 25).unwrap();
        assert!(!edges.is_empty());

        let unit = scale.unit_extents();
        for [a, b] in edges.segments() {
            assert!(on_box_edge(a, &unit) && on_box_edge(b, &unit), "segment {a} -> {b} is off the box edges");
            assert!((b - a).norm() > 0.0);
        }
        let perimeter = 4.0 * (unit.x + unit.y + unit.z);
        assert!((edges.total_length() - perimeter).abs() < 1e-9);
    }

    #[test]
    fn plane_cut_yields_boundary_loop_and_clipped_edges() {
        // Solid below z = 0.4 in a unit box
        let field = Implicit::new(|p: &Point3<Real>| p.z - 0.4, Vector3::repeat(1.0));
        let scale = DomainScale::new(Vector3::repeat(1.0)).unwrap();
        let edges = extract_feature_edges(&field, &scale, 10).unwrap();

        // Open boundary of the z = 0.4 plane: the square loop on the box faces
        let on_plane = edges
            .segments()
            .iter()
            .filter(|[a, b]| (a.z - 0.4).abs() < 1e-9 && (b.z - 0.4).abs() < 1e-9)
            .count();
        assert!(on_plane >= 4);

        // The four bottom edges are inside, the four vertical edges are
        // clipped at 0.4, and the top edges are outside
        let box_length: Real = edges
            .segments()
            .iter()
            .filter(|[a, b]| !((a.z - 0.4).abs() < 1e-9 && (b.z - 0.4).abs() < 1e-9))
            .map(|[a, b]| (b - a).norm())
            .sum();
        assert!((box_length - (4.0 + 4.0 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn zero_plateau_yields_no_degenerate_segments() {
        // Exactly zero on the grid nodes between z = 0.4 and z = 0.6
        let field = Implicit::new(
            |p: &Point3<Real>| {
                if p.z < 0.4 {
                    p.z - 0.4
                } else if p.z > 0.6 {
                    p.z - 0.6
                } else {
                    0.0
                }
            },
            Vector3::repeat(1.0),
        );
        let scale = DomainScale::new(Vector3::repeat(1.0)).unwrap();
        let edges = extract_feature_edges(&field, &scale, 10).unwrap();

        assert!(!edges.is_empty());
        assert!(edges.min_segment_length() >= MIN_FEATURE_SEGMENT_LENGTH);
    }

    #[test]
    fn field_without_surface_fails_loudly() {
        let field = Implicit::new(|_: &Point3<Real>| 1.0, Vector3::repeat(1.0));
        let scale = DomainScale::new(Vector3::repeat(1.0)).unwrap();
        assert!(matches!(
            extract_feature_edges(&field, &scale, 8),
            Err(MeshingError::NoZeroCrossing { .. })
        ));
    }

    #[test]
    fn length_statistics() {
        let edges = FeatureEdges::new(vec![
            [Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            [Point3::origin(), Point3::new(0.0, 3.0, 0.0)],
        ]);
        assert_eq!(edges.min_segment_length(), 1.0);
        assert_eq!(edges.max_segment_length(), 3.0);
        assert_eq!(FeatureEdges::default().min_segment_length(), 0.0);
    }
}
