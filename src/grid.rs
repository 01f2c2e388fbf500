//! Board: the 4×4 tile matrix and pure queries over it.

use thiserror::Error;

/// Side length of the board.
pub const SIZE: usize = 4;

/// Number of cells on the board.
pub const CELLS: usize = SIZE * SIZE;

/// Row-major tile values; 0 is an empty cell.
pub type Rows = [[u32; SIZE]; SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is already occupied by {value}")]
    Occupied { row: usize, col: usize, value: u32 },
    #[error("cell ({row}, {col}) is outside the 4x4 board")]
    OutOfBounds { row: usize, col: usize },
    #[error("tile value {0} is not a power of two >= 2")]
    InvalidValue(u32),
}

/// True for the values a tile may hold: 2, 4, 8, …
#[inline]
pub fn is_tile_value(value: u32) -> bool {
    value >= 2 && value.is_power_of_two()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Grid {
    cells: Rows,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from explicit rows, rejecting values that are neither empty nor a tile.
    pub fn from_rows(rows: Rows) -> Result<Self, GridError> {
        if let Some(&bad) = rows.iter().flatten().find(|&&v| v != 0 && !is_tile_value(v)) {
            return Err(GridError::InvalidValue(bad));
        }
        Ok(Self { cells: rows })
    }

    #[inline]
    pub fn rows(&self) -> &Rows {
        &self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Unchecked write used by the shift engine, which only ever writes tile values or 0.
    #[inline]
    pub(crate) fn set(&mut self, row: usize, col: usize, value: u32) {
        self.cells[row][col] = value;
    }

    pub fn empty_cell_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v == 0).count()
    }

    pub fn tile_count(&self) -> usize {
        CELLS - self.empty_cell_count()
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, r)| {
            r.iter()
                .enumerate()
                .filter(|&(_, &v)| v == 0)
                .map(move |(col, _)| (row, col))
        })
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Any tile equal to its right or lower neighbour. Checking one direction per axis
    /// covers every adjacent pair since equality is symmetric.
    pub fn any_adjacent_merge_possible(&self) -> bool {
        for row in 0..SIZE {
            for col in 0..SIZE {
                let v = self.cells[row][col];
                if v == 0 {
                    continue;
                }
                if col + 1 < SIZE && self.cells[row][col + 1] == v {
                    return true;
                }
                if row + 1 < SIZE && self.cells[row + 1][col] == v {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_move_possible(&self) -> bool {
        self.empty_cell_count() > 0 || self.any_adjacent_merge_possible()
    }

    /// Place `value` into an empty cell.
    pub fn spawn_tile_at(&mut self, row: usize, col: usize, value: u32) -> Result<(), GridError> {
        if !is_tile_value(value) {
            return Err(GridError::InvalidValue(value));
        }
        match self.get(row, col) {
            None => Err(GridError::OutOfBounds { row, col }),
            Some(0) => {
                self.cells[row][col] = value;
                Ok(())
            }
            Some(existing) => Err(GridError::Occupied {
                row,
                col,
                value: existing,
            }),
        }
    }
}
