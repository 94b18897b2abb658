//! Square cell grid addressed by a flat index
//!
//! Cells are numbered row-major from the top-left corner. Any index at or
//! past `size()` is off-grid: motion that lands there simply ends.

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::consts::GRID_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GRID_WIDTH)
    }
}

impl Grid {
    pub const fn new(width: usize) -> Self {
        Self { width }
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.width * self.width
    }

    #[inline]
    pub const fn row_of(&self, index: usize) -> usize {
        index / self.width
    }

    #[inline]
    pub const fn col_of(&self, index: usize) -> usize {
        index % self.width
    }

    #[inline]
    pub const fn is_left_edge(&self, index: usize) -> bool {
        self.col_of(index) == 0
    }

    #[inline]
    pub const fn is_right_edge(&self, index: usize) -> bool {
        self.col_of(index) == self.width - 1
    }

    #[inline]
    pub const fn is_in_bounds(&self, index: usize) -> bool {
        index < self.size()
    }

    /// Index one row up, or `None` when that would leave the grid
    #[inline]
    pub fn step_up(&self, index: usize) -> Option<usize> {
        index
            .checked_sub(self.width)
            .filter(|&i| self.is_in_bounds(i))
    }

    /// Flat index of (row, col)
    #[inline]
    pub const fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// (col, row) of a cell for renderers
    pub fn cell_coords(&self, index: usize) -> UVec2 {
        UVec2::new(self.col_of(index) as u32, self.row_of(index) as u32)
    }
}
