//! Meshing errors

use crate::float_types::Real;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MeshingError>;

/// All the ways a meshing request can fail.
///
/// Numerical degeneracies and stray components are repaired in place and are
/// not errors; what remains here is either bad input, a broken invariant or
/// a capability the caller asked for but the domain does not provide.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshingError {
    /// The coarse scan never crossed the zero level set
    #[error("(NoZeroCrossing) sampled field range [{min}, {max}] does not cross zero")]
    NoZeroCrossing { min: Real, max: Real },

    /// A NaN or infinite coordinate showed up in extracted geometry
    #[error("(NonFiniteGeometry) {0} contains NaN or infinite coordinates")]
    NonFiniteGeometry(&'static str),

    /// A stage produced (or received) no vertices or no elements
    #[error("(EmptyMesh) {0} is empty")]
    EmptyMesh(&'static str),

    /// An element index points past the end of the vertex array
    #[error("(InvalidIndex) element references vertex {index} but only {vertex_count} exist")]
    InvalidIndex { index: usize, vertex_count: usize },

    /// An element kept volume/area at or below zero after cleanup
    #[error("(NonPositiveElement) element {element} has measure {measure} after cleanup")]
    NonPositiveElement { element: usize, measure: Real },

    /// The boundary of a volume mesh is not a single surface
    #[error("(Cavities) boundary surface has {components} connected components")]
    Cavities { components: usize },

    /// The caller asked for something a domain does not implement
    #[error("(Unsupported) {0}")]
    Unsupported(&'static str),

    /// Parameters that cannot describe a meshing request
    #[error("(InvalidInput) {0}")]
    InvalidInput(String),

    /// Failure reported by an external mesher implementation
    #[error("(Mesher) {0}")]
    Mesher(String),
}
