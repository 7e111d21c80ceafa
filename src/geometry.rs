//! Scalar geometric helpers shared by the pipeline stages.
//!
//! The external mesher works in a normalized frame in which the physical
//! domain is divided by its largest extent, so the domain fits in the unit
//! cube with its longest side of length one. [`DomainScale`] converts between
//! the two frames.

use crate::errors::{MeshingError, Result};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use nalgebra::{Point3, Vector3};

/// Signed volume of the tetrahedron `(a, b, c, d)`.
///
/// Equal to `det([1 a; 1 b; 1 c; 1 d]) / 6`, positive when `d` lies on the
/// side of `(a, b, c)` given by the right-hand rule.
#[inline]
pub fn tet_volume(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>, d: &Point3<Real>) -> Real {
    (b - a).dot(&(c - a).cross(&(d - a))) / 6.0
}

/// Unsigned area of the triangle `(a, b, c)`.
#[inline]
pub fn triangle_area(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Real {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Linear interpolation between `a` and `b`, `t` in `[0, 1]`.
#[inline]
pub fn lerp(a: &Point3<Real>, b: &Point3<Real>, t: Real) -> Point3<Real> {
    debug_assert!((0.0..=1.0).contains(&t), "lerp parameter {t} outside [0, 1]");
    a + (b - a) * t
}

/// Conversion between the physical domain and the normalized mesher frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainScale {
    extents: Vector3<Real>,
    scale: Real,
}

impl DomainScale {
    /// `extents` are the physical sizes of the meshed region along x, y, z.
    pub fn new(extents: Vector3<Real>) -> Result<Self> {
        if extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(MeshingError::InvalidInput(format!(
                "domain extents must be finite and positive, got {extents:?}"
            )));
        }
        Ok(Self { extents, scale: extents.max() })
    }

    /// Scale for a field repeated `repeats` times along each axis.
    pub fn repeated(domain: &Vector3<Real>, repeats: &Vector3<usize>) -> Result<Self> {
        if repeats.iter().any(|&r| r == 0) {
            return Err(MeshingError::InvalidInput(format!(
                "repeat counts must be at least one, got {repeats:?}"
            )));
        }
        Self::new(domain.component_mul(&repeats.map(|r| r as Real)))
    }

    /// Physical extents of the region.
    pub const fn extents(&self) -> &Vector3<Real> {
        &self.extents
    }

    /// Largest physical extent, the factor between the two frames.
    pub const fn scale(&self) -> Real {
        self.scale
    }

    /// Extents of the region in the normalized frame.
    pub fn unit_extents(&self) -> Vector3<Real> {
        self.extents / self.scale
    }

    #[inline]
    pub fn to_unit(&self, p: &Point3<Real>) -> Point3<Real> {
        p / self.scale
    }

    #[inline]
    pub fn to_domain(&self, p: &Point3<Real>) -> Point3<Real> {
        p * self.scale
    }

    /// A physical length expressed in the normalized frame.
    #[inline]
    pub fn length_to_unit(&self, length: Real) -> Real {
        length / self.scale
    }

    /// A normalized length expressed in physical units.
    #[inline]
    pub fn length_to_domain(&self, length: Real) -> Real {
        length * self.scale
    }

    /// Physical box `[0, extents]`.
    pub fn physical_box(&self) -> Aabb {
        Aabb::new(Point3::origin(), Point3::from(self.extents))
    }

    /// Normalized box `[0, unit_extents]` handed to the mesher.
    pub fn unit_box(&self) -> Aabb {
        Aabb::new(Point3::origin(), Point3::from(self.unit_extents()))
    }

    /// Physical box grown by `eps` on every side.
    pub fn padded_box(&self, eps: Real) -> Aabb {
        let pad = Vector3::repeat(eps);
        Aabb::new(Point3::from(-pad), Point3::from(self.extents + pad))
    }
}

/// Sample counts along x, y, z for a grid over `bbox` with `res_y` cells
/// along y. The x and z counts follow the aspect ratio of the box.
pub fn grid_resolution(bbox: &Aabb, res_y: usize) -> [usize; 3] {
    let extents = bbox.extents();
    let scaled = |e: Real| ((res_y as Real * e / extents.y) as usize).max(1);
    [scaled(extents.x), res_y.max(1), scaled(extents.z)]
}

/// True if all three coordinates are finite.
#[inline]
pub fn point_finite(p: &Point3<Real>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_tet_volume_is_one_sixth() {
        let o = Point3::origin();
        let v = tet_volume(&o, &Point3::new(1.0, 0.0, 0.0), &Point3::new(0.0, 1.0, 0.0), &Point3::new(0.0, 0.0, 1.0));
        assert!((v - 1.0 / 6.0).abs() < 1e-15);

        // Swapping two vertices flips the sign
        let w = tet_volume(&o, &Point3::new(0.0, 1.0, 0.0), &Point3::new(1.0, 0.0, 0.0), &Point3::new(0.0, 0.0, 1.0));
        assert!((v + w).abs() < 1e-15);
    }

    #[test]
    fn domain_round_trip() {
        let scale = DomainScale::new(Vector3::new(56.1, 153.9, 56.1)).unwrap();
        let p = Point3::new(12.5, 140.25, 3.0);
        let q = scale.to_domain(&scale.to_unit(&p));
        assert!((p - q).norm() <= 1e-9 * p.coords.norm());
        assert!((scale.unit_extents().y - 1.0).abs() < 1e-15);
    }

    #[test]
    fn repeated_scale_multiplies_domain() {
        let scale = DomainScale::repeated(&Vector3::new(1.0, 2.0, 3.0), &Vector3::new(4, 2, 1)).unwrap();
        assert_eq!(scale.extents(), &Vector3::new(4.0, 4.0, 3.0));
        assert_eq!(scale.scale(), 4.0);
        assert!(DomainScale::repeated(&Vector3::new(1.0, 1.0, 1.0), &Vector3::new(0, 1, 1)).is_err());
    }

    #[test]
    fn grid_resolution_follows_aspect_ratio() {
        let bbox = Aabb::new(Point3::origin(), Point3::new(56.1, 153.9, 56.1));
        assert_eq!(grid_resolution(&bbox, 25), [9, 25, 9]);
    }
}
