// core/grid.rs

// Owns the two square maps the crawler keeps while exploring: the occupancy grid
// (cells an obstacle observation has landed in) and the visited grid (cells the
// tracked pose has occupied). Every access is bounds-checked; dead reckoning can
// push coordinates off the map, so out-of-range writes are dropped and
// out-of-range reads answer `false`.

// Dependencies
use log::debug;
use serde::{Deserialize, Serialize};

use crate::CrawlerError;

/// Largest accepted grid side
pub const MAX_GRID_SIZE: usize = 65_536;

/// Integer grid coordinate. `x` is the column, `y` the row (row 0 at the top).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Cell {
    /// Cell at column `x`, row `y`
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed-size `size x size` boolean matrix, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    data: Vec<bool>,
}

impl Grid {
    /// Creates an all-false grid with `size` cells per side
    pub fn new(size: usize) -> Self {
        Grid {
            size,
            data: vec![false; size * size],
        }
    }

    /// Number of cells per side
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true when `(x, y)` lies inside `[0, size)` on both axes
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Reads a cell; anything outside the grid reads as `false`
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map(|i| self.data[i]).unwrap_or(false)
    }

    /// Sets a cell to `true`, failing with `OutOfBounds` for off-grid coordinates
    pub fn set(&mut self, x: i32, y: i32) -> Result<(), CrawlerError> {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = true;
                Ok(())
            }
            None => Err(CrawlerError::OutOfBounds { x, y }),
        }
    }

    /// Number of cells set to `true`
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&cell| cell).count()
    }

    /// Iterates over every set cell in row-major order
    pub fn set_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let size = self.size;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell)
            .map(move |(i, _)| Cell::new((i % size) as i32, (i / size) as i32))
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(y * self.size + x)
    }
}

/// Occupancy and visited grids of identical shape.
#[derive(Clone, Debug)]
pub struct GridStore {
    occupancy: Grid,
    visited: Grid,
}

impl GridStore {
    /// Creates empty occupancy and visited grids of `size x size` cells
    pub fn new(size: usize) -> Self {
        GridStore {
            occupancy: Grid::new(size),
            visited: Grid::new(size),
        }
    }

    /// Cells per side of both grids
    pub fn size(&self) -> usize {
        self.occupancy.size()
    }

    /// Marks `(x, y)` as containing an obstacle. Off-grid coordinates are dropped.
    pub fn mark_obstacle(&mut self, x: i32, y: i32) {
        if let Err(e) = self.try_mark_obstacle(x, y) {
            debug!("Obstacle write dropped: {}", e);
        }
    }

    /// Marks `(x, y)` as visited. Idempotent; off-grid coordinates are dropped.
    pub fn mark_visited(&mut self, x: i32, y: i32) {
        if let Err(e) = self.try_mark_visited(x, y) {
            debug!("Visited write dropped: {}", e);
        }
    }

    /// Like [`GridStore::mark_obstacle`] but reports off-grid coordinates
    pub fn try_mark_obstacle(&mut self, x: i32, y: i32) -> Result<(), CrawlerError> {
        self.occupancy.set(x, y)
    }

    /// Like [`GridStore::mark_visited`] but reports off-grid coordinates
    pub fn try_mark_visited(&mut self, x: i32, y: i32) -> Result<(), CrawlerError> {
        self.visited.set(x, y)
    }

    /// True once the tracked pose has occupied `(x, y)`; false off the grid
    pub fn is_visited(&self, x: i32, y: i32) -> bool {
        self.visited.get(x, y)
    }

    /// True once an obstacle has been mapped to `(x, y)`; false off the grid
    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.occupancy.get(x, y)
    }

    /// Read-only view of the occupancy grid, used for rendering
    pub fn occupancy(&self) -> &Grid {
        &self.occupancy
    }

    /// Read-only view of the visited grid
    pub fn visited(&self) -> &Grid {
        &self.visited
    }
}
