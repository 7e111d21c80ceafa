//! Uniform-grid spatial hash for fixed-radius point queries.

use crate::float_types::Real;
use hashbrown::HashMap;
use nalgebra::Point3;

type Cell = (i64, i64, i64);

/// Buckets point indices by a cubic cell of side `2 * radius`, so every
/// point within `radius` of a query lies in the 27 cells around it.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: Real,
    cells: HashMap<Cell, Vec<usize>>,
}

impl SpatialHash {
    pub fn new(points: &[Point3<Real>], radius: Real) -> Self {
        let mut hash = Self { cell_size: radius * 2.0, cells: HashMap::new() };
        for (idx, p) in points.iter().enumerate() {
            let cell = hash.cell_of(p);
            hash.cells.entry(cell).or_default().push(idx);
        }
        hash
    }

    fn cell_of(&self, p: &Point3<Real>) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }

    /// Indices stored in the cells around `q`, a superset of the points
    /// within `radius`.
    pub fn candidates(&self, q: &Point3<Real>) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy, cz) = self.cell_of(q);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| (cx + dx, cy + dy, cz + dz))))
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
    }

    /// Closest of `points` to `q` if it lies strictly within `radius`.
    pub fn nearest_within(&self, points: &[Point3<Real>], q: &Point3<Real>, radius: Real) -> Option<usize> {
        self.candidates(q)
            .map(|i| (i, (points[i] - q).norm()))
            .filter(|&(_, d)| d < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_closest_point_in_range() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1e-11, 0.0),
            Point3::new(1.0, 3e-11, 0.0),
        ];
        let hash = SpatialHash::new(&points, 1e-10);
        assert_eq!(hash.nearest_within(&points, &Point3::new(1.0, 0.0, 0.0), 1e-10), Some(1));
        assert_eq!(hash.nearest_within(&points, &Point3::new(1.0, 2.5e-11, 0.0), 1e-10), Some(3));
        assert_eq!(hash.nearest_within(&points, &Point3::new(0.5, 0.0, 0.0), 1e-10), None);
    }
}
