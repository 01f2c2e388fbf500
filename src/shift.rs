//! Shift engine: slide and merge tiles in one direction.
//!
//! Every direction is reduced to the same line problem: each row (Left/Right) or
//! column (Up/Down) is read as a sequence starting at the edge tiles move toward,
//! compacted and merged as a plain slice, then written back.

use crate::grid::{Grid, SIZE};

/// Tile value that wins the game.
pub const WIN_TILE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Lines are rows.
    Row,
    /// Lines are columns.
    Column,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Row,
            Self::Up | Self::Down => Axis::Column,
        }
    }

    /// True when tiles move toward the higher index (Down, Right).
    pub fn toward_high_end(self) -> bool {
        matches!(self, Self::Down | Self::Right)
    }
}

/// What one move did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    /// Tiles that changed position plus one per merge; 0 means the board is unchanged.
    pub moves: u32,
    pub merges: u32,
    pub score_delta: u32,
    /// A merge produced WIN_TILE.
    pub reached_win: bool,
}

impl MoveOutcome {
    #[inline]
    pub fn changed(&self) -> bool {
        self.moves > 0
    }

    fn absorb(&mut self, other: Self) {
        self.moves += other.moves;
        self.merges += other.merges;
        self.score_delta += other.score_delta;
        self.reached_win |= other.reached_win;
    }
}

/// Board coordinates of line `index` in traversal order: the first entry is the edge
/// tiles slide toward.
pub fn line_positions(direction: Direction, index: usize) -> [(usize, usize); SIZE] {
    let mut out = [(0, 0); SIZE];
    for (step, pos) in out.iter_mut().enumerate() {
        let along = if direction.toward_high_end() {
            SIZE - 1 - step
        } else {
            step
        };
        *pos = match direction.axis() {
            Axis::Row => (index, along),
            Axis::Column => (along, index),
        };
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Tile {
    /// Index in the line before the move.
    origin: usize,
    value: u32,
    merged: bool,
}

/// Non-zero tiles in line order, gaps removed.
fn compact(line: &[u32; SIZE]) -> Vec<Tile> {
    line.iter()
        .enumerate()
        .filter(|&(_, &value)| value != 0)
        .map(|(origin, &value)| Tile {
            origin,
            value,
            merged: false,
        })
        .collect()
}

/// Slide and merge one line toward index 0.
pub fn shift_line(line: [u32; SIZE]) -> ([u32; SIZE], MoveOutcome) {
    let mut outcome = MoveOutcome::default();

    let mut slots: Vec<Option<Tile>> = compact(&line).into_iter().map(Some).collect();
    for i in 0..slots.len().saturating_sub(1) {
        let (Some(lead), Some(next)) = (slots[i], slots[i + 1]) else {
            continue;
        };
        if lead.merged || next.merged || lead.value != next.value {
            continue;
        }
        let value = lead.value * 2;
        slots[i] = Some(Tile {
            value,
            merged: true,
            ..lead
        });
        // The trailing tile is consumed; its slot stays empty for the rest of the scan.
        slots[i + 1] = None;
        outcome.merges += 1;
        outcome.moves += 1;
        outcome.score_delta += value;
        outcome.reached_win |= value == WIN_TILE;
    }

    let mut out = [0; SIZE];
    for (to, tile) in slots.into_iter().flatten().enumerate() {
        out[to] = tile.value;
        if tile.origin != to {
            outcome.moves += 1;
        }
    }
    (out, outcome)
}

/// Apply a move to `grid`, returning the resulting board and what changed.
pub fn shift(grid: &Grid, direction: Direction) -> (Grid, MoveOutcome) {
    let mut next = *grid;
    let mut outcome = MoveOutcome::default();
    for index in 0..SIZE {
        let positions = line_positions(direction, index);
        let line = positions.map(|(row, col)| grid.rows()[row][col]);
        let (shifted, line_outcome) = shift_line(line);
        for ((row, col), value) in positions.into_iter().zip(shifted) {
            next.set(row, col, value);
        }
        outcome.absorb(line_outcome);
    }
    (next, outcome)
}
