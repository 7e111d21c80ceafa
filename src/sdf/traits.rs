//! Traits defining iso-surface extraction for dependency inversion

use crate::float_types::Real;
use crate::mesh::{SimplexMesh, Triangle};
use crate::sdf::grid::ScalarGrid;

/// Extracts a triangulated level set from a sampled scalar grid.
pub trait IsoSurfacer {
    /// Triangles approximating `{p : f(p) = iso_value}`, with vertices in the
    /// coordinates of the grid box. Vertices shared between triangles must be
    /// shared by index, so open boundaries can be found topologically.
    fn extract(&self, grid: &ScalarGrid, iso_value: Real) -> SimplexMesh<Triangle>;
}
