//! Uniform hash grid for proximity queries over scene objects.

mod grid;

pub use grid::{CellCoord, GridEntry, GridError, SpatialGrid};
