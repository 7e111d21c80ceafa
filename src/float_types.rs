// Re-export parry for the active float size
pub use parry3d_f64 as parry3d;

// Our Real scalar type. The tolerances below are far under f32 precision, so
// the pipeline is f64 only.
pub type Real = f64;

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Tolerances
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// Elements with a signed volume (or area) at or below this are degenerate.
pub const VOLUME_TOLERANCE: Real = 1e-12;

/// Vertices closer than this are welded when degenerate elements show up.
pub const DUPLICATE_VERTEX_TOLERANCE: Real = 1e-12;

/// Weld distance used when stitching tiled copies of a periodic cell.
/// Cells meshed independently do not line up at machine precision.
pub const TILING_MERGE_TOLERANCE: Real = 1e-2;

/// Two vertices are identified across a periodic boundary when the
/// translated copy of one lies within this distance of the other.
pub const PERIODIC_MATCH_TOLERANCE: Real = 1e-10;

/// Padding added around the physical domain before the coarse scan, so the
/// scan does not clip the field exactly on its boundary.
pub const DOMAIN_PADDING: Real = 1e-14;

/// Box-clipped feature segments shorter than this (in the unit frame) are
/// dropped.
pub const MIN_FEATURE_SEGMENT_LENGTH: Real = 1e-12;

/// Periodic mesher facet distance never exceeds this (unit-cube frame).
pub const MAX_PERIODIC_FACET_DISTANCE: Real = 0.000625;

/// Refinement size used for periodic cells of fields without a thickness.
pub const DEFAULT_PERIODIC_RESOLUTION: Real = 0.025;
