//! `SimplexMesh` struct: an indexed mesh of tetrahedra or triangles.
//!
//! Vertices are plain points and elements are fixed-size index arrays, the
//! layout the external mesher hands back and the post-processing stages
//! operate on.

use crate::errors::{MeshingError, Result};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::geometry::{point_finite, tet_volume, triangle_area};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use std::hash::Hash;

/// Boundary facet extraction
pub mod boundary;

/// Vertex and element connected components
pub mod connectivity;

/// Fixed-radius point lookup
pub mod spatial;

use spatial::SpatialHash;

/// A tetrahedron as four vertex indices.
pub type Tetrahedron = [usize; 4];

/// A triangle as three vertex indices.
pub type Triangle = [usize; 3];

/// An edge as two vertex indices.
pub type Edge = [usize; 2];

/// A simplex stored as a fixed-size index array.
pub trait Element: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Number of vertices per element.
    const NODES: usize;

    /// Name the external mesher uses for this cell type.
    const NAME: &'static str;

    /// Codimension-one faces of the element.
    type Facet: Copy + Debug + Eq + Hash + AsRef<[usize]> + AsMut<[usize]>;

    fn nodes(&self) -> &[usize];

    fn nodes_mut(&mut self) -> &mut [usize];

    /// Signed volume for tetrahedra, area for triangles.
    fn measure(&self, vertices: &[Point3<Real>]) -> Real;

    /// Facets, oriented outward for positively oriented elements.
    fn facets(&self) -> impl Iterator<Item = Self::Facet>;
}

impl Element for Tetrahedron {
    const NODES: usize = 4;
    const NAME: &'static str = "tetra";

    type Facet = Triangle;

    #[inline]
    fn nodes(&self) -> &[usize] {
        self
    }

    #[inline]
    fn nodes_mut(&mut self) -> &mut [usize] {
        self
    }

    #[inline]
    fn measure(&self, vertices: &[Point3<Real>]) -> Real {
        let [a, b, c, d] = *self;
        tet_volume(&vertices[a], &vertices[b], &vertices[c], &vertices[d])
    }

    fn facets(&self) -> impl Iterator<Item = Triangle> {
        let [a, b, c, d] = *self;
        [[b, c, d], [a, d, c], [a, b, d], [a, c, b]].into_iter()
    }
}

impl Element for Triangle {
    const NODES: usize = 3;
    const NAME: &'static str = "triangle";

    type Facet = Edge;

    #[inline]
    fn nodes(&self) -> &[usize] {
        self
    }

    #[inline]
    fn nodes_mut(&mut self) -> &mut [usize] {
        self
    }

    #[inline]
    fn measure(&self, vertices: &[Point3<Real>]) -> Real {
        let [a, b, c] = *self;
        triangle_area(&vertices[a], &vertices[b], &vertices[c])
    }

    fn facets(&self) -> impl Iterator<Item = Edge> {
        let [a, b, c] = *self;
        [[a, b], [b, c], [c, a]].into_iter()
    }
}

/// Indexed simplex mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexMesh<E: Element> {
    pub vertices: Vec<Point3<Real>>,
    pub elements: Vec<E>,
}

impl<E: Element> Default for SimplexMesh<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> SimplexMesh<E> {
    pub const fn new() -> Self {
        Self { vertices: Vec::new(), elements: Vec::new() }
    }

    /// Build a mesh, checking that indices are in range and coordinates
    /// finite.
    pub fn from_parts(vertices: Vec<Point3<Real>>, elements: Vec<E>) -> Result<Self> {
        if !vertices.iter().all(point_finite) {
            return Err(MeshingError::NonFiniteGeometry("mesh vertices"));
        }
        let mesh = Self { vertices, elements };
        mesh.check_indices()?;
        Ok(mesh)
    }

    /// Fails with [`MeshingError::InvalidIndex`] on the first element index
    /// past the end of the vertex array.
    ///
    /// The fields are public, so meshes built by hand skip this check; the
    /// index-walking methods below assume it holds and panic otherwise.
    pub fn check_indices(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        match self
            .elements
            .iter()
            .flat_map(|e| e.nodes().iter())
            .find(|&&i| i >= vertex_count)
        {
            Some(&index) => Err(MeshingError::InvalidIndex { index, vertex_count }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Measure (signed volume or area) of every element.
    pub fn measures(&self) -> Vec<Real> {
        self.elements.iter().map(|e| e.measure(&self.vertices)).collect()
    }

    /// Axis aligned bounding box of the vertices, `None` when empty.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = *self.vertices.first()?;
        let (mins, maxs) = self.vertices.iter().fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        });
        Some(Aabb::new(mins, maxs))
    }

    /// Apply `f` to every vertex position.
    pub fn map_vertices<F>(&mut self, f: F)
    where
        F: Fn(&Point3<Real>) -> Point3<Real>,
    {
        for v in &mut self.vertices {
            *v = f(v);
        }
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: &Vector3<Real>) {
        self.map_vertices(|p| p + offset);
    }

    /// Remove vertices no element references and renumber the rest.
    ///
    /// Returns the old-to-new index map, `None` for removed vertices.
    ///
    /// # Panics
    /// If an element index is out of range, see
    /// [`check_indices`](Self::check_indices).
    pub fn remove_unreferenced(&mut self) -> Vec<Option<usize>> {
        let mut referenced = vec![false; self.vertices.len()];
        for &i in self.elements.iter().flat_map(|e| e.nodes().iter()) {
            referenced[i] = true;
        }

        let mut remap = vec![None; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for (old, vertex) in self.vertices.iter().enumerate() {
            if referenced[old] {
                remap[old] = Some(kept.len());
                kept.push(*vertex);
            }
        }

        if kept.len() != self.vertices.len() {
            for element in &mut self.elements {
                for i in element.nodes_mut() {
                    // Referenced vertices always have a new index
                    *i = remap[*i].unwrap_or(*i);
                }
            }
            self.vertices = kept;
        }
        remap
    }

    /// Merge vertices closer than `epsilon`, keeping the position of the
    /// lowest index in each cluster, and compact the vertex array.
    ///
    /// Element indices are remapped; elements that collapse are kept, the
    /// caller decides what to do with them. Returns the number of vertices
    /// removed.
    pub fn merge_vertices(&mut self, epsilon: Real) -> usize {
        if self.vertices.is_empty() || epsilon <= 0.0 {
            return 0;
        }

        let spatial_hash = SpatialHash::new(&self.vertices, epsilon);
        let mut representative: Vec<usize> = (0..self.vertices.len()).collect();
        let mut merged = 0;

        for (idx, p) in self.vertices.iter().enumerate() {
            if representative[idx] != idx {
                continue;
            }
            for other in spatial_hash.candidates(p) {
                if other <= idx || representative[other] != other {
                    continue;
                }
                if (p - self.vertices[other]).norm() < epsilon {
                    representative[other] = idx;
                    merged += 1;
                }
            }
        }

        if merged == 0 {
            return 0;
        }

        // Representatives are never remapped themselves, so one hop resolves
        // every vertex. Compact in index order.
        let mut new_index = vec![0; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len() - merged);
        for idx in 0..self.vertices.len() {
            if representative[idx] == idx {
                new_index[idx] = kept.len();
                kept.push(self.vertices[idx]);
            }
        }
        for element in &mut self.elements {
            for i in element.nodes_mut() {
                *i = new_index[representative[*i]];
            }
        }
        self.vertices = kept;
        merged
    }

    /// Append `other`, offsetting its indices. No vertices are merged.
    pub fn append(&mut self, other: &SimplexMesh<E>) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.elements.extend(other.elements.iter().map(|e| {
            let mut e = *e;
            for i in e.nodes_mut() {
                *i += offset;
            }
            e
        }));
    }

    /// Keep only elements for which `keep` returns true.
    pub fn retain_elements<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &E) -> bool,
    {
        let mut index = 0;
        self.elements.retain(|e| {
            let k = keep(index, e);
            index += 1;
            k
        });
    }

    /// Report structural problems: out-of-range or repeated indices,
    /// non-positive elements and isolated vertices.
    pub fn validate(&self, tolerance: Real) -> Vec<String> {
        if self.vertices.is_empty() {
            return vec!["Mesh has no vertices".to_string()];
        }

        let mut issues = Vec::new();
        let mut used = vec![false; self.vertices.len()];
        for (i, element) in self.elements.iter().enumerate() {
            let nodes = element.nodes();
            if let Some(&idx) = nodes.iter().find(|&&idx| idx >= self.vertices.len()) {
                issues.push(format!("Element {i} references out-of-bounds vertex index {idx}"));
                continue;
            }
            for (k, &idx) in nodes.iter().enumerate() {
                used[idx] = true;
                if nodes[..k].contains(&idx) {
                    issues.push(format!("Element {i} has duplicate vertex index {idx}"));
                }
            }
            let measure = element.measure(&self.vertices);
            if measure <= tolerance {
                issues.push(format!("Element {i} has measure {measure} (tolerance {tolerance})"));
            }
        }
        issues.extend(
            used.iter()
                .enumerate()
                .filter(|(_, u)| !**u)
                .map(|(i, _)| format!("Vertex {i} is isolated (no adjacent elements)")),
        );
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tets() -> SimplexMesh<Tetrahedron> {
        SimplexMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(5.0, 5.0, 5.0),
            ],
            elements: vec![[0, 1, 2, 3], [1, 2, 3, 4]],
        }
    }

    #[test]
    fn from_parts_rejects_bad_indices() {
        let err = SimplexMesh::<Triangle>::from_parts(vec![Point3::origin()], vec![[0, 0, 3]]).unwrap_err();
        assert_eq!(err, MeshingError::InvalidIndex { index: 3, vertex_count: 1 });
    }

    #[test]
    fn check_indices_on_hand_built_mesh() {
        let mut mesh = two_tets();
        assert_eq!(mesh.check_indices(), Ok(()));
        mesh.elements.push([0, 1, 2, 9]);
        assert_eq!(mesh.check_indices(), Err(MeshingError::InvalidIndex { index: 9, vertex_count: 6 }));
    }

    #[test]
    fn remove_unreferenced_compacts() {
        let mut mesh = two_tets();
        mesh.vertices.swap(0, 5);
        for e in &mut mesh.elements {
            for i in e.nodes_mut() {
                if *i == 0 {
                    *i = 5;
                }
            }
        }
        let remap = mesh.remove_unreferenced();
        assert_eq!(remap[0], None);
        assert_eq!(remap[5], Some(4));
        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.elements[0], [4, 0, 1, 2]);
        assert!(mesh.validate(0.0).is_empty());
    }

    #[test]
    fn merge_vertices_keeps_lowest_index() {
        let mut mesh = two_tets();
        mesh.vertices.push(Point3::new(1.0 + 1e-13, 0.0, 0.0));
        mesh.elements.push([6, 2, 3, 4]);
        let merged = mesh.merge_vertices(1e-12);
        assert_eq!(merged, 1);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.elements[2], [1, 2, 3, 4]);
        assert_eq!(mesh.vertices[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn bounding_box_spans_vertices() {
        let bbox = two_tets().bounding_box().unwrap();
        assert_eq!(bbox.mins, Point3::origin());
        assert_eq!(bbox.maxs, Point3::new(5.0, 5.0, 5.0));
        assert!(SimplexMesh::<Tetrahedron>::new().bounding_box().is_none());
    }

    #[test]
    fn validate_reports_isolated_vertex() {
        let issues = two_tets().validate(0.0);
        assert!(issues.iter().any(|s| s.contains("Vertex 5 is isolated")));
    }
}
