//! Boundary facets: facets used by exactly one element.

use super::{Element, SimplexMesh};
use hashbrown::HashMap;

impl<E: Element> SimplexMesh<E> {
    /// Facets that belong to exactly one element, in order of first
    /// appearance.
    ///
    /// For a tetrahedral mesh these are triangles oriented outward (for
    /// positively oriented tetrahedra); for a triangle mesh they are the open
    /// edges.
    pub fn boundary_facets(&self) -> Vec<E::Facet> {
        // sorted key -> (use count, first oriented facet)
        let mut seen: HashMap<E::Facet, (usize, E::Facet)> = HashMap::new();
        let mut order: Vec<E::Facet> = Vec::new();

        for element in &self.elements {
            for facet in element.facets() {
                let key = sorted(facet);
                seen.entry(key)
                    .and_modify(|(count, _)| *count += 1)
                    .or_insert_with(|| {
                        order.push(key);
                        (1, facet)
                    });
            }
        }

        order
            .into_iter()
            .filter_map(|key| match seen.get(&key) {
                Some(&(1, facet)) => Some(facet),
                _ => None,
            })
            .collect()
    }
}

/// Copy of `facet` with its indices in ascending order.
#[inline]
pub(crate) fn sorted<F: AsMut<[usize]> + Copy>(facet: F) -> F {
    let mut key = facet;
    key.as_mut().sort_unstable();
    key
}
