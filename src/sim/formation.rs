//! Enemy formation and its bounce-on-edge march
//!
//! Members keep their array position for the whole session. Destroyed
//! members stay in the array (so positions remain stable) and are skipped
//! for collision and rendering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::grid::Grid;

/// Horizontal travel direction of the formation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Heading {
    Left,
    #[default]
    Right,
}

impl Heading {
    /// Column delta per step (+1 / -1)
    #[inline]
    pub fn delta(&self) -> isize {
        match self {
            Heading::Left => -1,
            Heading::Right => 1,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationController {
    grid: Grid,
    rows: usize,
    cols: usize,
    /// Cell index of every member, in layout order (top-left first)
    members: Vec<usize>,
    /// Array positions of destroyed members
    destroyed: BTreeSet<usize>,
    heading: Heading,
}

impl FormationController {
    /// Build the starting block of `rows` x `cols` members in the top-left corner
    pub fn new(grid: Grid, rows: usize, cols: usize) -> Self {
        let mut formation = Self {
            grid,
            rows,
            cols,
            members: Vec::with_capacity(rows * cols),
            destroyed: BTreeSet::new(),
            heading: Heading::Right,
        };
        formation.reset();
        formation
    }

    /// Restore the starting layout, heading right, nobody destroyed
    pub fn reset(&mut self) {
        self.members.clear();
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.members.push(self.grid.index_of(row, col));
            }
        }
        self.destroyed.clear();
        self.heading = Heading::Right;
    }

    /// Drop every member (end of session)
    pub fn clear(&mut self) {
        self.members.clear();
        self.destroyed.clear();
        self.heading = Heading::Right;
    }

    /// March one step. Returns true when this step bounced off an edge.
    ///
    /// Edge contact is judged on the first and last array entries, which are
    /// the top-left and bottom-right corners of the block. A bounce drops the
    /// whole block one row and reverses it within the same step.
    pub fn advance(&mut self) -> bool {
        let (Some(&first), Some(&last)) = (self.members.first(), self.members.last()) else {
            return false;
        };
        let left_edge = self.grid.is_left_edge(first);
        let right_edge = self.grid.is_right_edge(last);

        let bounce = match self.heading {
            Heading::Right => right_edge,
            Heading::Left => left_edge,
        };
        if bounce {
            let width = self.grid.width();
            for member in &mut self.members {
                *member = member.saturating_add(width);
            }
            self.heading = self.heading.reversed();
        }

        let delta = self.heading.delta();
        for member in &mut self.members {
            *member = member.saturating_add_signed(delta);
        }

        bounce
    }

    /// Array position of the live member standing on `cell`
    pub fn live_at(&self, cell: usize) -> Option<usize> {
        self.members
            .iter()
            .enumerate()
            .find(|&(pos, &member)| member == cell && !self.destroyed.contains(&pos))
            .map(|(pos, _)| pos)
    }

    /// Whether a live member stands on `cell`
    pub fn occupies(&self, cell: usize) -> bool {
        self.live_at(cell).is_some()
    }

    /// Mark the member at array position `pos` destroyed.
    /// Returns false if it was already destroyed or does not exist.
    pub fn destroy(&mut self, pos: usize) -> bool {
        pos < self.members.len() && self.destroyed.insert(pos)
    }

    /// Cells of live members that are on the grid
    pub fn live_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter(|(pos, _)| !self.destroyed.contains(pos))
            .map(|(_, &cell)| cell)
            .filter(|&cell| self.grid.is_in_bounds(cell))
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn destroyed(&self) -> &BTreeSet<usize> {
        &self.destroyed
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Total members, destroyed ones included
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.len()
    }

    pub fn live_count(&self) -> usize {
        self.members.len() - self.destroyed.len()
    }

    /// Every member destroyed (and there was at least one)
    pub fn is_cleared(&self) -> bool {
        !self.members.is_empty() && self.destroyed.len() == self.members.len()
    }
}
