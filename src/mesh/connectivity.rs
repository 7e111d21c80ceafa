//! Connected components over shared vertices.
//!
//! Two elements are connected when they share at least one vertex, which is
//! the adjacency a vertex adjacency matrix induces.

use super::{Element, SimplexMesh};

/// Disjoint-set forest with path halving and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), size: vec![1; n] }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }

    /// Component label for every entry, numbered `0..k` in order of first
    /// appearance.
    pub fn labels(&mut self) -> Vec<usize> {
        let n = self.parent.len();
        let mut root_label = vec![usize::MAX; n];
        let mut next = 0;
        (0..n)
            .map(|i| {
                let root = self.find(i);
                if root_label[root] == usize::MAX {
                    root_label[root] = next;
                    next += 1;
                }
                root_label[root]
            })
            .collect()
    }
}

impl<E: Element> SimplexMesh<E> {
    /// Union-find over vertices joined by element membership.
    pub(crate) fn vertex_union_find(&self) -> UnionFind {
        let mut uf = UnionFind::new(self.vertices.len());
        for element in &self.elements {
            let nodes = element.nodes();
            for &other in &nodes[1..] {
                uf.union(nodes[0], other);
            }
        }
        uf
    }

    /// Component label per vertex. Isolated vertices form their own
    /// components.
    pub fn vertex_components(&self) -> Vec<usize> {
        self.vertex_union_find().labels()
    }

    /// Component label per element, consistent with
    /// [`vertex_components`](Self::vertex_components).
    pub fn element_components(&self) -> Vec<usize> {
        let labels = self.vertex_components();
        self.elements.iter().map(|e| labels[e.nodes()[0]]).collect()
    }

    /// Number of components spanned by the elements (isolated vertices are
    /// not counted).
    pub fn component_count(&self) -> usize {
        let labels = self.element_components();
        let mut seen = vec![false; self.vertices.len()];
        labels.into_iter().filter(|&c| !std::mem::replace(&mut seen[c], true)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Triangle;
    use nalgebra::Point3;

    #[test]
    fn union_find_labels_are_dense() {
        let mut uf = UnionFind::new(5);
        uf.union(3, 4);
        uf.union(0, 2);
        assert_eq!(uf.labels(), vec![0, 1, 0, 2, 2]);
    }

    #[test]
    fn triangles_sharing_a_vertex_are_connected() {
        let mesh = SimplexMesh::<Triangle> {
            vertices: (0..8).map(|i| Point3::new(i as f64, (i % 2) as f64, 0.0)).collect(),
            elements: vec![[0, 1, 2], [2, 3, 4], [5, 6, 7]],
        };
        assert_eq!(mesh.element_components(), vec![0, 0, 1]);
        assert_eq!(mesh.component_count(), 2);
    }
}
