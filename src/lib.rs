//! Tetrahedral meshing of **implicit fields**, aimed at periodic
//! microstructures such as shell-offset triply periodic minimal surfaces.
//!
//! A field `f(p)` (negative inside) with a periodic domain is turned into a
//! clean volume mesh in three steps:
//!
//! 1. [`ImplicitDomain`](domain::ImplicitDomain) wraps the field in the
//!    normalized mesher frame and extracts its [feature edges](feature_edges)
//!    with a coarse iso-surface scan plus clipping of the domain box edges;
//! 2. an external Delaunay refinement engine, plugged in through the
//!    [`mesher`] traits, meshes the domain;
//! 3. the [`postprocess`] and [`periodic`] stages weld duplicates, drop
//!    degenerate elements and stray components, and reconcile periodic seams.
//!
//! The [`pipeline`] functions run all three.
//!
//! # Features
//! #### Default
//! - **surface-nets**: an alternative coarse iso-surfacer for feature edge
//!   scans using [fast-surface-nets](https://crates.io/crates/fast-surface-nets)

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod domain;
pub mod errors;
pub mod feature_edges;
pub mod float_types;
pub mod geometry;
pub mod implicit;
pub mod mesh;
pub mod mesher;
pub mod periodic;
pub mod pipeline;
pub mod postprocess;
pub mod sdf;

pub use errors::{MeshingError, Result};
pub use feature_edges::{FeatureEdges, Segment, extract_feature_edges};
pub use implicit::{Implicit, ImplicitField, ImplicitShell};
pub use mesh::{SimplexMesh, Tetrahedron, Triangle};
pub use pipeline::{mesh_implicit, mesh_implicit_periodic, mesh_implicit_surface, mesh_surface_from_volume};
