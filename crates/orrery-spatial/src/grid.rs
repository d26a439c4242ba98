//! Spatial hash grid for efficient object lookup by location.
//!
//! Objects are bucketed by integer cell coordinate (`floor(p / cell_size)` per
//! axis). The grid is built once per scene generation and is read-only while
//! it is queried; there is no removal or update API.

use glam::DVec3;
use rustc_hash::FxHashMap;

/// Reasons a grid cannot be built or queried.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Cell size must be positive and finite.
    #[error("cell size {0} must be positive and finite")]
    InvalidCellSize(f64),

    /// A position or query center has a NaN or infinite component.
    #[error("position ({x}, {y}, {z}) is not finite")]
    NonFinitePosition { x: f64, y: f64, z: f64 },

    /// A query radius is NaN or infinite.
    #[error("query radius {0} is not finite")]
    NonFiniteRadius(f64),
}

/// Integer coordinate of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellCoord {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Cell containing `position` for a grid of the given cell size.
    pub fn from_position(position: DVec3, cell_size: f64) -> Result<Self, GridError> {
        check_finite(position)?;
        let cell = (position / cell_size).floor();
        Ok(Self {
            x: cell.x as i64,
            y: cell.y as i64,
            z: cell.z as i64,
        })
    }

    /// Largest per-axis distance to another cell, in cells.
    fn chebyshev_distance(&self, other: &CellCoord) -> u128 {
        let dx = (self.x as i128 - other.x as i128).unsigned_abs();
        let dy = (self.y as i128 - other.y as i128).unsigned_abs();
        let dz = (self.z as i128 - other.z as i128).unsigned_abs();
        dx.max(dy).max(dz)
    }
}

/// An object reference stored in the grid, with the position it was inserted at.
#[derive(Debug, Clone, PartialEq)]
pub struct GridEntry<K> {
    pub key: K,
    pub position: DVec3,
}

/// A uniform spatial hash grid keyed by [`CellCoord`].
/// `K` is an opaque reference to the caller's object.
pub struct SpatialGrid<K> {
    /// Cell coordinate -> entries in that cell.
    cells: FxHashMap<CellCoord, Vec<GridEntry<K>>>,

    /// Edge length of a cell in world units.
    cell_size: f64,

    /// Total number of entries across all cells.
    count: usize,
}

impl<K> SpatialGrid<K> {
    /// Create an empty grid with the given cell edge length.
    pub fn new(cell_size: f64) -> Result<Self, GridError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cells: FxHashMap::default(),
            cell_size,
            count: 0,
        })
    }

    /// Build a grid from `(key, position)` pairs, stopping at the first
    /// non-finite position.
    pub fn build<I>(cell_size: f64, entries: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (K, DVec3)>,
    {
        let mut grid = Self::new(cell_size)?;
        for (key, position) in entries {
            grid.insert(key, position)?;
        }
        Ok(grid)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Return the total number of entries in the grid.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Return true if the grid contains no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell that `position` falls into.
    pub fn cell_of(&self, position: DVec3) -> Result<CellCoord, GridError> {
        CellCoord::from_position(position, self.cell_size)
    }

    /// Insert an entry into the cell containing `position`.
    /// Returns the cell it landed in. Duplicate keys are kept as separate entries.
    pub fn insert(&mut self, key: K, position: DVec3) -> Result<CellCoord, GridError> {
        let coord = self.cell_of(position)?;
        self.cells
            .entry(coord)
            .or_default()
            .push(GridEntry { key, position });
        self.count += 1;
        Ok(coord)
    }

    /// Return all entries in the given cell. Returns an empty slice if
    /// the cell is unoccupied.
    pub fn query_cell(&self, coord: &CellCoord) -> &[GridEntry<K>] {
        self.cells.get(coord).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Return every entry in any cell within `ceil(radius / cell_size)` cells
    /// of the center's cell on each axis.
    ///
    /// This is a box superset of the sphere: no distance test is applied, so
    /// callers needing exact membership should use
    /// [`query_radius_exact`](Self::query_radius_exact). A radius of zero or
    /// less returns exactly the occupants of the center cell.
    pub fn query_radius(&self, center: DVec3, radius: f64) -> Result<Vec<&GridEntry<K>>, GridError> {
        if radius.is_nan() || radius == f64::INFINITY {
            return Err(GridError::NonFiniteRadius(radius));
        }
        let center_coord = self.cell_of(center)?;

        // How many cells the radius spans in each direction.
        let reach: u128 = if radius <= 0.0 {
            0
        } else {
            (radius / self.cell_size).ceil() as u128
        };

        let span = reach.saturating_mul(2).saturating_add(1);
        let visited = span
            .checked_mul(span)
            .and_then(|s| s.checked_mul(span))
            .unwrap_or(u128::MAX);

        let mut results = Vec::new();

        // When the neighborhood holds more cells than are occupied, scanning
        // the occupied cells is cheaper and yields the same set.
        if visited > self.cells.len() as u128 {
            for (coord, bucket) in &self.cells {
                if coord.chebyshev_distance(&center_coord) <= reach {
                    results.extend(bucket.iter());
                }
            }
            return Ok(results);
        }

        let reach = reach as i64;
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let neighbor = CellCoord {
                        x: center_coord.x.saturating_add(dx),
                        y: center_coord.y.saturating_add(dy),
                        z: center_coord.z.saturating_add(dz),
                    };
                    if let Some(bucket) = self.cells.get(&neighbor) {
                        results.extend(bucket.iter());
                    }
                }
            }
        }

        Ok(results)
    }

    /// Like [`query_radius`](Self::query_radius) but keeps only entries whose
    /// Euclidean distance to `center` is at most `radius`.
    pub fn query_radius_exact(
        &self,
        center: DVec3,
        radius: f64,
    ) -> Result<Vec<&GridEntry<K>>, GridError> {
        let radius_sq = radius.max(0.0) * radius.max(0.0);
        let mut results = self.query_radius(center, radius)?;
        results.retain(|entry| entry.position.distance_squared(center) <= radius_sq);
        Ok(results)
    }
}

fn check_finite(position: DVec3) -> Result<(), GridError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(GridError::NonFinitePosition {
            x: position.x,
            y: position.y,
            z: position.z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_keys(entries: &[&GridEntry<u32>]) -> Vec<u32> {
        let mut keys: Vec<u32> = entries.iter().map(|e| e.key).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_insert_uses_floor_division() {
        let mut grid = SpatialGrid::new(10.0).unwrap();
        assert_eq!(
            grid.insert(1, DVec3::new(9.9, 0.0, 10.0)).unwrap(),
            CellCoord::new(0, 0, 1)
        );
        assert_eq!(
            grid.insert(2, DVec3::new(-0.1, -10.0, -10.1)).unwrap(),
            CellCoord::new(-1, -1, -2)
        );
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell_count(), 2);
    }

    #[test]
    fn test_query_empty_cell_returns_empty() {
        let grid: SpatialGrid<u32> = SpatialGrid::new(1.0).unwrap();
        assert!(grid.query_cell(&CellCoord::new(99, 99, 99)).is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_invalid_cell_size_rejected() {
        for size in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(SpatialGrid::<u32>::new(size).is_err(), "size {size}");
        }
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let err = grid.insert(1, DVec3::new(f64::NAN, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, GridError::NonFinitePosition { .. }));
        assert!(grid.is_empty());

        assert!(grid.query_radius(DVec3::new(0.0, f64::INFINITY, 0.0), 1.0).is_err());
        assert!(matches!(
            grid.query_radius(DVec3::ZERO, f64::NAN),
            Err(GridError::NonFiniteRadius(_))
        ));
    }

    /// Five objects straddling the corner where eight cells meet, all within
    /// radius 100 of the corner, must all be returned.
    #[test]
    fn test_query_radius_spans_cell_boundaries() {
        let mut grid = SpatialGrid::new(1000.0).unwrap();
        let center = DVec3::new(1000.0, 1000.0, 1000.0);
        let offsets = [
            DVec3::new(-50.0, -50.0, -50.0),
            DVec3::new(50.0, -50.0, -50.0),
            DVec3::new(-50.0, 50.0, -50.0),
            DVec3::new(-50.0, -50.0, 50.0),
            DVec3::new(50.0, 50.0, 50.0),
        ];
        let mut cells = Vec::new();
        for (key, offset) in offsets.iter().enumerate() {
            cells.push(grid.insert(key as u32, center + *offset).unwrap());
        }
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 5, "objects must occupy five distinct cells");

        let found = grid.query_radius(center, 100.0).unwrap();
        assert_eq!(sorted_keys(&found), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_radius_returns_center_cell_only() {
        let mut grid = SpatialGrid::new(10.0).unwrap();
        grid.insert(1, DVec3::new(1.0, 1.0, 1.0)).unwrap();
        grid.insert(2, DVec3::new(9.0, 9.0, 9.0)).unwrap();
        grid.insert(3, DVec3::new(10.5, 1.0, 1.0)).unwrap();

        let found = grid.query_radius(DVec3::new(5.0, 5.0, 5.0), 0.0).unwrap();
        assert_eq!(sorted_keys(&found), vec![1, 2]);

        let negative = grid.query_radius(DVec3::new(5.0, 5.0, 5.0), -3.0).unwrap();
        assert_eq!(sorted_keys(&negative), vec![1, 2]);
    }

    #[test]
    fn test_query_radius_is_a_box_superset() {
        let mut grid = SpatialGrid::new(10.0).unwrap();
        // Diagonal neighbor cell corner: outside the sphere but inside the visited box.
        grid.insert(1, DVec3::new(19.0, 19.0, 19.0)).unwrap();
        grid.insert(2, DVec3::new(5.0, 5.0, 5.0)).unwrap();

        let center = DVec3::new(5.0, 5.0, 5.0);
        let superset = grid.query_radius(center, 5.0).unwrap();
        assert_eq!(sorted_keys(&superset), vec![1, 2]);

        let exact = grid.query_radius_exact(center, 5.0).unwrap();
        assert_eq!(sorted_keys(&exact), vec![2]);
    }

    #[test]
    fn test_query_radius_excludes_distant_cells() {
        let mut grid = SpatialGrid::new(100.0).unwrap();
        grid.insert(1, DVec3::ZERO).unwrap();
        grid.insert(2, DVec3::new(1.0e9, 0.0, 0.0)).unwrap();

        let found = grid.query_radius(DVec3::ZERO, 150.0).unwrap();
        assert_eq!(sorted_keys(&found), vec![1]);
    }

    #[test]
    fn test_huge_radius_scans_occupied_cells() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        grid.insert(1, DVec3::new(-1.0e12, 0.0, 0.0)).unwrap();
        grid.insert(2, DVec3::new(1.0e12, 5.0, -3.0)).unwrap();

        let found = grid.query_radius(DVec3::ZERO, 2.0e12).unwrap();
        assert_eq!(sorted_keys(&found), vec![1, 2]);
    }

    /// Every object within true distance `r` of `p` is returned, for a sweep
    /// of deterministic centers, radii and cell sizes.
    #[test]
    fn test_grid_completeness_sweep() {
        for &cell_size in &[0.7, 3.0, 25.0] {
            let mut positions = Vec::new();
            let mut grid = SpatialGrid::new(cell_size).unwrap();
            for i in 0..400u32 {
                let f = i as f64;
                let p = DVec3::new(
                    (f * 7.31).sin() * 40.0,
                    (f * 3.17).cos() * 40.0,
                    (f * 1.93).sin() * (f * 0.41).cos() * 40.0,
                );
                grid.insert(i, p).unwrap();
                positions.push(p);
            }
            for j in 0..20 {
                let g = j as f64;
                let center = DVec3::new(g * 3.0 - 30.0, 20.0 - g * 2.0, (g * 0.9).sin() * 30.0);
                let radius = 0.5 + g * 1.7;
                let found = grid.query_radius(center, radius).unwrap();
                let found_keys = sorted_keys(&found);
                for (key, p) in positions.iter().enumerate() {
                    if p.distance(center) <= radius {
                        assert!(
                            found_keys.binary_search(&(key as u32)).is_ok(),
                            "missing key {key} for center {center} radius {radius} cell {cell_size}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_build_from_iterator() {
        let grid = SpatialGrid::build(
            5.0,
            vec![("a", DVec3::ZERO), ("b", DVec3::new(6.0, 0.0, 0.0))],
        )
        .unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.query_cell(&CellCoord::new(1, 0, 0))[0].key, "b");

        let bad = SpatialGrid::build(5.0, vec![("a", DVec3::splat(f64::NAN))]);
        assert!(bad.is_err());
    }
}
