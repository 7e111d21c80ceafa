//! Implicit scalar fields consumed by the meshing pipeline.
//!
//! A field is any smooth-ish function `f(p)` whose zero level set is the
//! surface to mesh, negative inside. Besides the function itself a field
//! carries the physical extents of one period (`domain`) and, for shell
//! structures, the shell thickness that drives element sizing.
//!
//! The crate does not evaluate TPMS formulas; callers wrap their own
//! functions in [`Implicit`] and optionally offset them with
//! [`ImplicitShell`].

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};
use std::fmt;

/// A scalar field with a periodic domain.
pub trait ImplicitField {
    /// Field value at `p` (physical units). Negative means inside.
    fn eval(&self, p: &Point3<Real>) -> Real;

    /// Physical extents of one period of the field.
    fn domain(&self) -> Vector3<Real>;

    /// Shell thickness, for fields describing an offset band.
    fn thickness(&self) -> Option<Real> {
        None
    }

    /// Analytical gradient, when the field provides one.
    fn gradient(&self, _p: &Point3<Real>) -> Option<Vector3<Real>> {
        None
    }
}

impl<T: ImplicitField + ?Sized> ImplicitField for &T {
    fn eval(&self, p: &Point3<Real>) -> Real {
        (**self).eval(p)
    }

    fn domain(&self) -> Vector3<Real> {
        (**self).domain()
    }

    fn thickness(&self) -> Option<Real> {
        (**self).thickness()
    }

    fn gradient(&self, p: &Point3<Real>) -> Option<Vector3<Real>> {
        (**self).gradient(p)
    }
}

impl<T: ImplicitField + ?Sized> ImplicitField for Box<T> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        (**self).eval(p)
    }

    fn domain(&self) -> Vector3<Real> {
        (**self).domain()
    }

    fn thickness(&self) -> Option<Real> {
        (**self).thickness()
    }

    fn gradient(&self, p: &Point3<Real>) -> Option<Vector3<Real>> {
        (**self).gradient(p)
    }
}

type ScalarFn = Box<dyn Fn(&Point3<Real>) -> Real + Send + Sync>;
type GradientFn = Box<dyn Fn(&Point3<Real>) -> Vector3<Real> + Send + Sync>;

/// A field built from closures.
///
/// ```
/// use nalgebra::{Point3, Vector3};
/// use tpmesh::implicit::{Implicit, ImplicitField};
///
/// let r = 28.05;
/// let cylinder = Implicit::new(
///     move |p: &Point3<f64>| (p.x - r).powi(2) + (p.z - r).powi(2) - r * r,
///     Vector3::new(2.0 * r, 153.9, 2.0 * r),
/// )
/// .with_gradient(move |p: &Point3<f64>| Vector3::new(2.0 * (p.x - r), 0.0, 2.0 * (p.z - r)));
///
/// assert!(cylinder.eval(&Point3::new(r, 10.0, r)) < 0.0);
/// ```
pub struct Implicit {
    f: ScalarFn,
    df: Option<GradientFn>,
    domain: Vector3<Real>,
}

impl Implicit {
    pub fn new<F>(f: F, domain: Vector3<Real>) -> Self
    where
        F: Fn(&Point3<Real>) -> Real + Send + Sync + 'static,
    {
        Self { f: Box::new(f), df: None, domain }
    }

    /// Attach an analytical gradient.
    pub fn with_gradient<G>(mut self, df: G) -> Self
    where
        G: Fn(&Point3<Real>) -> Vector3<Real> + Send + Sync + 'static,
    {
        self.df = Some(Box::new(df));
        self
    }
}

impl fmt::Debug for Implicit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implicit")
            .field("domain", &self.domain)
            .field("has_gradient", &self.df.is_some())
            .finish()
    }
}

impl ImplicitField for Implicit {
    fn eval(&self, p: &Point3<Real>) -> Real {
        (self.f)(p)
    }

    fn domain(&self) -> Vector3<Real> {
        self.domain
    }

    fn gradient(&self, p: &Point3<Real>) -> Option<Vector3<Real>> {
        self.df.as_ref().map(|df| df(p))
    }
}

/// Solid band of width `thickness` around the zero level set of a field.
///
/// Evaluates `(S - t)(S + t)` with `S = f(p)` and `t = thickness / 2 * |∇f(p)|`,
/// which is negative exactly where `|S| < t`, i.e. within roughly half the
/// thickness on either side of the surface. Fields without an analytical
/// gradient fall back to central differences.
#[derive(Debug)]
pub struct ImplicitShell<F> {
    field: F,
    thickness: Real,
}

impl<F: ImplicitField> ImplicitShell<F> {
    pub const fn new(field: F, thickness: Real) -> Self {
        Self { field, thickness }
    }

    pub const fn inner(&self) -> &F {
        &self.field
    }

    fn gradient_norm(&self, p: &Point3<Real>) -> Real {
        match self.field.gradient(p) {
            Some(g) => g.norm(),
            None => central_difference(&self.field, p).norm(),
        }
    }
}

impl<F: ImplicitField> ImplicitField for ImplicitShell<F> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        let s = self.field.eval(p);
        let t = self.thickness / 2.0 * self.gradient_norm(p);
        (s - t) * (s + t)
    }

    fn domain(&self) -> Vector3<Real> {
        self.field.domain()
    }

    fn thickness(&self) -> Option<Real> {
        Some(self.thickness)
    }
}

/// Central-difference gradient with a step relative to the field domain.
pub fn central_difference<F: ImplicitField + ?Sized>(field: &F, p: &Point3<Real>) -> Vector3<Real> {
    let h = field.domain().max() * 1e-6;
    let mut g = Vector3::zeros();
    for axis in 0..3 {
        let mut offset = Vector3::zeros();
        offset[axis] = h;
        g[axis] = (field.eval(&(p + offset)) - field.eval(&(p - offset))) / (2.0 * h);
    }
    g
}

/// Axis-aligned box written as a product field.
///
/// Each axis contributes `(x - x0)(x - x1)`, negative strictly between the
/// two bounds; the field is the maximum over the three axes. The field
/// domain is the box size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuboidField {
    pub min: Point3<Real>,
    pub max: Point3<Real>,
}

impl CuboidField {
    pub const fn new(min: Point3<Real>, max: Point3<Real>) -> Self {
        Self { min, max }
    }
}

impl ImplicitField for CuboidField {
    fn eval(&self, p: &Point3<Real>) -> Real {
        (0..3)
            .map(|i| (p[i] - self.min[i]) * (p[i] - self.max[i]))
            .fold(Real::NEG_INFINITY, Real::max)
    }

    fn domain(&self) -> Vector3<Real> {
        self.max - self.min
    }
}

/// Pointwise maximum of two fields. Domain and thickness come from `a`.
#[derive(Debug, Clone)]
pub struct FieldIntersection<A, B> {
    pub a: A,
    pub b: B,
}

impl<A: ImplicitField, B: ImplicitField> FieldIntersection<A, B> {
    pub const fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<A: ImplicitField, B: ImplicitField> ImplicitField for FieldIntersection<A, B> {
    fn eval(&self, p: &Point3<Real>) -> Real {
        self.a.eval(p).max(self.b.eval(p))
    }

    fn domain(&self) -> Vector3<Real> {
        self.a.domain()
    }

    fn thickness(&self) -> Option<Real> {
        self.a.thickness()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> Implicit {
        // z = 0.5 plane, inside below
        Implicit::new(|p: &Point3<Real>| p.z - 0.5, Vector3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn shell_is_negative_near_the_surface_only() {
        let shell = ImplicitShell::new(plane(), 0.2);
        assert!(shell.eval(&Point3::new(0.3, 0.3, 0.5)) < 0.0);
        assert!(shell.eval(&Point3::new(0.3, 0.3, 0.55)) < 0.0);
        assert!(shell.eval(&Point3::new(0.3, 0.3, 0.65)) > 0.0);
        assert!(shell.eval(&Point3::new(0.3, 0.3, 0.35)) > 0.0);
        assert_eq!(shell.thickness(), Some(0.2));
    }

    #[test]
    fn shell_uses_analytical_gradient_when_available() {
        let steep = Implicit::new(|p: &Point3<Real>| 2.0 * (p.z - 0.5), Vector3::new(1.0, 1.0, 1.0))
            .with_gradient(|_| Vector3::new(0.0, 0.0, 2.0));
        let shell = ImplicitShell::new(steep, 0.2);
        // S = 0.18, t = 0.2, so still inside at distance 0.09
        assert!(shell.eval(&Point3::new(0.0, 0.0, 0.59)) < 0.0);
        assert!(shell.eval(&Point3::new(0.0, 0.0, 0.61)) > 0.0);
    }

    #[test]
    fn central_difference_matches_linear_field() {
        let g = central_difference(&plane(), &Point3::new(0.2, 0.7, 0.1));
        assert!((g - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn cuboid_field_sign() {
        let cuboid = CuboidField::new(Point3::origin(), Point3::new(2.0, 1.0, 3.0));
        assert!(cuboid.eval(&Point3::new(1.0, 0.5, 1.5)) < 0.0);
        assert_eq!(cuboid.eval(&Point3::new(0.0, 0.5, 1.5)), 0.0);
        assert!(cuboid.eval(&Point3::new(2.5, 0.5, 1.5)) > 0.0);
        assert_eq!(cuboid.domain(), Vector3::new(2.0, 1.0, 3.0));
    }

    #[test]
    fn intersection_takes_maximum() {
        let cuboid = CuboidField::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let both = FieldIntersection::new(plane(), cuboid);
        assert!(both.eval(&Point3::new(0.5, 0.5, 0.25)) < 0.0);
        assert!(both.eval(&Point3::new(0.5, 0.5, 0.75)) > 0.0);
        assert!(both.eval(&Point3::new(1.5, 0.5, 0.25)) > 0.0);
    }
}
