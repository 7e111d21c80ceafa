//! Structured sampling grid for scalar fields

use crate::errors::{MeshingError, Result};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::implicit::ImplicitField;
use nalgebra::{Point3, Vector3};

/// Number of grid points along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
}

impl GridShape {
    #[inline]
    pub const fn len(&self) -> usize {
        (self.nx as usize) * (self.ny as usize) * (self.nz as usize)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn index(&self, x: u32, y: u32, z: u32) -> u32 {
        (z * self.ny + y) * self.nx + x
    }
}

#[cfg(feature = "surface-nets")]
impl fast_surface_nets::ndshape::Shape<3> for GridShape {
    type Coord = u32;

    #[inline]
    fn as_array(&self) -> [Self::Coord; 3] {
        [self.nx, self.ny, self.nz]
    }

    fn size(&self) -> Self::Coord {
        self.nx * self.ny * self.nz
    }

    fn usize(&self) -> usize {
        self.len()
    }

    fn linearize(&self, coords: [Self::Coord; 3]) -> u32 {
        let [x, y, z] = coords;
        self.index(x, y, z)
    }

    fn delinearize(&self, i: u32) -> [Self::Coord; 3] {
        let x = i % self.nx;
        let yz = i / self.nx;
        let y = yz % self.ny;
        let z = yz / self.ny;
        [x, y, z]
    }
}

/// A field sampled at the points of a regular grid over a box.
///
/// `cells[i]` cells along axis `i` give `cells[i] + 1` sample points, the
/// first and last lying on the box faces.
#[derive(Debug, Clone)]
pub struct ScalarGrid {
    pub bbox: Aabb,
    pub cells: [usize; 3],
    pub shape: GridShape,
    pub values: Vec<Real>,
}

impl ScalarGrid {
    /// Sample `field` over `bbox`. Fails if any sample is NaN or infinite.
    pub fn sample<F: ImplicitField + ?Sized>(field: &F, bbox: &Aabb, cells: [usize; 3]) -> Result<Self> {
        if cells.iter().any(|&c| c == 0) {
            return Err(MeshingError::InvalidInput(format!("grid needs at least one cell per axis, got {cells:?}")));
        }
        let shape = GridShape {
            nx: cells[0] as u32 + 1,
            ny: cells[1] as u32 + 1,
            nz: cells[2] as u32 + 1,
        };

        let mut grid = ScalarGrid { bbox: *bbox, cells, shape, values: Vec::with_capacity(shape.len()) };
        for z in 0..shape.nz {
            for y in 0..shape.ny {
                for x in 0..shape.nx {
                    let value = field.eval(&grid.point(x, y, z));
                    if !value.is_finite() {
                        return Err(MeshingError::NonFiniteGeometry("sampled field"));
                    }
                    grid.values.push(value);
                }
            }
        }
        Ok(grid)
    }

    /// Distance between neighbouring samples along each axis.
    pub fn spacing(&self) -> Vector3<Real> {
        let extents = self.bbox.extents();
        Vector3::new(
            extents.x / self.cells[0] as Real,
            extents.y / self.cells[1] as Real,
            extents.z / self.cells[2] as Real,
        )
    }

    /// Position of grid point `(x, y, z)`.
    #[inline]
    pub fn point(&self, x: u32, y: u32, z: u32) -> Point3<Real> {
        self.grid_to_world(&Point3::new(x as Real, y as Real, z as Real))
    }

    /// Map fractional grid coordinates to positions inside the box.
    #[inline]
    pub fn grid_to_world(&self, g: &Point3<Real>) -> Point3<Real> {
        let mins = self.bbox.mins;
        let extents = self.bbox.extents();
        Point3::new(
            mins.x + extents.x * g.x / self.cells[0] as Real,
            mins.y + extents.y * g.y / self.cells[1] as Real,
            mins.z + extents.z * g.z / self.cells[2] as Real,
        )
    }

    #[inline]
    pub fn value(&self, x: u32, y: u32, z: u32) -> Real {
        self.values[self.shape.index(x, y, z) as usize]
    }

    /// Smallest and largest sampled value.
    pub fn range(&self) -> (Real, Real) {
        self.values
            .iter()
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// True if the sampled values take both signs around `iso_value`.
    pub fn crosses(&self, iso_value: Real) -> bool {
        let (lo, hi) = self.range();
        lo < iso_value && hi > iso_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implicit::Implicit;

    #[test]
    fn samples_include_box_corners() {
        let field = Implicit::new(|p: &Point3<Real>| p.x + 10.0 * p.y + 100.0 * p.z, Vector3::repeat(1.0));
        let bbox = Aabb::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 2.0, 4.0));
        let grid = ScalarGrid::sample(&field, &bbox, [2, 4, 8]).unwrap();

        assert_eq!(grid.values.len(), 3 * 5 * 9);
        assert_eq!(grid.value(0, 0, 0), -1.0);
        assert_eq!(grid.value(2, 4, 8), 1.0 + 20.0 + 400.0);
        assert_eq!(grid.point(1, 2, 4), Point3::new(0.0, 1.0, 2.0));
        assert_eq!(grid.spacing(), Vector3::new(1.0, 0.5, 0.5));
        assert!(grid.crosses(0.0));
    }

    #[test]
    fn nan_samples_fail() {
        let field = Implicit::new(|_: &Point3<Real>| Real::NAN, Vector3::repeat(1.0));
        let bbox = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(
            ScalarGrid::sample(&field, &bbox, [1, 1, 1]).unwrap_err(),
            MeshingError::NonFiniteGeometry("sampled field")
        );
    }
}
