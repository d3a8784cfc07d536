use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Cells along one side of the grid.
pub const GRID_SIDE: u8 = 3;

/// Total number of cells on the grid.
pub const GRID_CELLS: usize = (GRID_SIDE as usize) * (GRID_SIDE as usize);

/// Position of a cell on the 3x3 grid, numbered row by row from the top left.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CellIndex(u8);

impl CellIndex {
    pub const fn new(index: u8) -> Result<Self> {
        if (index as usize) < GRID_CELLS {
            Ok(Self(index))
        } else {
            Err(GameError::InvalidIndex(index))
        }
    }

    pub(crate) const fn new_unchecked(index: u8) -> Self {
        Self(index)
    }

    pub const fn from_row_col(row: u8, col: u8) -> Option<Self> {
        if row < GRID_SIDE && col < GRID_SIDE {
            Some(Self(row * GRID_SIDE + col))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub const fn row(self) -> u8 {
        self.0 / GRID_SIDE
    }

    pub const fn col(self) -> u8 {
        self.0 % GRID_SIDE
    }

    /// True when the two cells share an edge.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.row().abs_diff(other.row()) + self.col().abs_diff(other.col()) == 1
    }

    pub fn all() -> impl Iterator<Item = Self> + Clone {
        (0..GRID_CELLS as u8).map(Self)
    }

    pub fn iter_neighbors(self) -> NeighborIter {
        NeighborIter::new(self)
    }
}

impl TryFrom<u8> for CellIndex {
    type Error = GameError;

    fn try_from(index: u8) -> Result<Self> {
        Self::new(index)
    }
}

impl From<CellIndex> for u8 {
    fn from(index: CellIndex) -> Self {
        index.0
    }
}

impl core::fmt::Display for CellIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// up, down, left, right
const DISPLACEMENTS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Applies `delta` to `index`, returning a value only when it stays on the grid.
fn apply_delta(index: CellIndex, (d_row, d_col): (i8, i8)) -> Option<CellIndex> {
    let row = index.row().checked_add_signed(d_row)?;
    let col = index.col().checked_add_signed(d_col)?;
    CellIndex::from_row_col(row, col)
}

#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: CellIndex,
    index: u8,
}

impl NeighborIter {
    fn new(center: CellIndex) -> Self {
        Self { center, index: 0 }
    }
}

impl Iterator for NeighborIter {
    type Item = CellIndex;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let delta = *DISPLACEMENTS.get(usize::from(self.index))?;
            self.index += 1;

            if let Some(next_item) = apply_delta(self.center, delta) {
                return Some(next_item);
            }
        }
    }
}

/// Fixed-size set of grid cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSet(u16);

impl CellSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn with(self, index: CellIndex) -> Self {
        Self(self.0 | (1 << index.0))
    }

    /// Returns `true` when the cell was not already present.
    pub fn insert(&mut self, index: CellIndex) -> bool {
        let fresh = !self.contains(index);
        self.0 |= 1 << index.0;
        fresh
    }

    pub const fn contains(self, index: CellIndex) -> bool {
        self.0 & (1 << index.0) != 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = CellIndex> {
        CellIndex::all().filter(move |&index| self.contains(index))
    }
}

impl FromIterator<CellIndex> for CellSet {
    fn from_iter<I: IntoIterator<Item = CellIndex>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn idx(index: u8) -> CellIndex {
        CellIndex::new(index).unwrap()
    }

    #[test]
    fn rejects_indices_outside_the_grid() {
        assert_eq!(CellIndex::new(9), Err(GameError::InvalidIndex(9)));
        assert!(CellIndex::new(8).is_ok());
    }

    #[test]
    fn row_and_col_follow_row_major_layout() {
        assert_eq!((idx(5).row(), idx(5).col()), (1, 2));
        assert_eq!(CellIndex::from_row_col(2, 0), Some(idx(6)));
        assert_eq!(CellIndex::from_row_col(3, 0), None);
    }

    #[test]
    fn center_has_four_neighbors_in_up_down_left_right_order() {
        let neighbors: Vec<_> = idx(4).iter_neighbors().map(CellIndex::get).collect();
        assert_eq!(neighbors, [1, 7, 3, 5]);
    }

    #[test]
    fn corners_and_edges_do_not_wrap() {
        let corner: Vec<_> = idx(2).iter_neighbors().map(CellIndex::get).collect();
        assert_eq!(corner, [5, 1]);

        let edge: Vec<_> = idx(3).iter_neighbors().map(CellIndex::get).collect();
        assert_eq!(edge, [0, 6, 4]);
    }

    #[test]
    fn adjacency_excludes_diagonals() {
        assert!(idx(0).is_adjacent(idx(1)));
        assert!(idx(0).is_adjacent(idx(3)));
        assert!(!idx(0).is_adjacent(idx(4)));
        assert!(!idx(2).is_adjacent(idx(3)));
        assert!(!idx(4).is_adjacent(idx(4)));
    }

    #[test]
    fn cell_set_tracks_membership() {
        let mut set = CellSet::empty();
        assert!(set.insert(idx(3)));
        assert!(!set.insert(idx(3)));
        assert!(set.contains(idx(3)));
        assert!(!set.contains(idx(4)));
        assert_eq!(set.len(), 1);

        let set: CellSet = [idx(8), idx(0)].into_iter().collect();
        let members: Vec<_> = set.iter().map(CellIndex::get).collect();
        assert_eq!(members, [0, 8]);
    }

    #[test]
    fn serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&idx(7)).unwrap(), "7");
        assert!(serde_json::from_str::<CellIndex>("12").is_err());
    }
}
