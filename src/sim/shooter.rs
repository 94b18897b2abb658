//! Player shooter, confined to its starting row

use serde::{Deserialize, Serialize};

use super::grid::Grid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShooterController {
    grid: Grid,
    start: usize,
    index: usize,
}

impl ShooterController {
    pub fn new(grid: Grid, start: usize) -> Self {
        Self {
            grid,
            start,
            index: start,
        }
    }

    /// Back to the start cell
    pub fn reset(&mut self) {
        self.index = self.start;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Step one column left. Returns false at the left edge.
    pub fn move_left(&mut self) -> bool {
        if self.grid.is_left_edge(self.index) {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step one column right. Returns false at the right edge.
    pub fn move_right(&mut self) -> bool {
        if self.grid.is_right_edge(self.index) {
            return false;
        }
        self.index += 1;
        true
    }
}
