//! Coarse iso-surface extraction from sampled scalar fields
//!
//! This module samples fields on regular grids and extracts their level sets
//! with dependency inversion, so the feature edge scan can swap backends.

pub mod grid;
pub mod marching;
pub mod traits;

#[cfg(feature = "surface-nets")]
pub mod surface_nets;

// Re-export core types
pub use grid::{GridShape, ScalarGrid};
pub use marching::MarchingTetrahedra;
pub use traits::IsoSurfacer;

#[cfg(feature = "surface-nets")]
pub use surface_nets::SurfaceNets;
