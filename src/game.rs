//! Game state: board, score, status, tile spawning.

use crate::grid::{Grid, GridError};
use crate::rng::RandomSource;
use crate::shift::{self, Direction, MoveOutcome, WIN_TILE};
use std::num::NonZeroU32;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Value of every newly spawned tile.
pub const SPAWN_VALUE: u32 = 2;

/// Tiles dealt before the first move.
const STARTING_TILES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Won,
    Lost,
}

impl Status {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Self::InProgress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game is over ({0:?}); no further moves are accepted")]
    GameOver(Status),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// One game: the board plus everything that persists across turns.
#[derive(Debug, Clone)]
pub struct Game<R> {
    grid: Grid,
    score: u32,
    /// A merge has produced the winning tile. Sticky.
    won: bool,
    moves: u32,
    last_spawn: Option<(usize, usize)>,
    rng: R,
}

impl<R: RandomSource> Game<R> {
    /// Deal a new game: empty board with two starting tiles.
    pub fn new(rng: R) -> Result<Self, GameError> {
        let mut game = Self::from_grid(Grid::new(), 0, rng);
        for _ in 0..STARTING_TILES {
            game.spawn_random_tile()?;
        }
        info!(grid = ?game.grid.rows(), "new game");
        Ok(game)
    }

    /// Resume from an existing board. A board already holding the winning tile resumes as won.
    pub fn from_grid(grid: Grid, score: u32, rng: R) -> Self {
        Self {
            won: grid.max_tile() >= WIN_TILE,
            grid,
            score,
            moves: 0,
            last_spawn: None,
            rng,
        }
    }

    /// Throw the current game away and deal a new one.
    pub fn restart(&mut self, rng: R) -> Result<(), GameError> {
        *self = Self::new(rng)?;
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Effective moves played (moves that changed the board).
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Cell that received the most recent spawned tile.
    pub fn last_spawn(&self) -> Option<(usize, usize)> {
        self.last_spawn
    }

    pub fn status(&self) -> Status {
        if self.won {
            Status::Won
        } else if !self.grid.is_move_possible() {
            Status::Lost
        } else {
            Status::InProgress
        }
    }

    /// Shift the board one way. A move that changes nothing leaves the game untouched
    /// and spawns nothing.
    #[instrument(level = "debug", skip(self), fields(score = self.score))]
    pub fn apply_move(&mut self, direction: Direction) -> Result<MoveOutcome, GameError> {
        let status = self.status();
        if status.is_terminal() {
            return Err(GameError::GameOver(status));
        }

        let (grid, outcome) = shift::shift(&self.grid, direction);
        if !outcome.changed() {
            debug!("move had no effect");
            return Ok(outcome);
        }

        self.grid = grid;
        self.score += outcome.score_delta;
        self.moves += 1;
        debug!(
            moves = outcome.moves,
            merges = outcome.merges,
            gained = outcome.score_delta,
            "tiles shifted"
        );

        if outcome.reached_win {
            self.won = true;
            self.last_spawn = None;
            info!(score = self.score, moves = self.moves, "won");
            return Ok(outcome);
        }

        self.spawn_random_tile()?;
        if self.status() == Status::Lost {
            info!(score = self.score, moves = self.moves, "no moves left");
        }
        Ok(outcome)
    }

    /// Place a tile of SPAWN_VALUE on a uniformly chosen empty cell (row-major enumeration).
    /// Returns the chosen cell, or None on a full board.
    fn spawn_random_tile(&mut self) -> Result<Option<(usize, usize)>, GameError> {
        let empty = self.grid.empty_cell_count() as u32;
        let Some(bound) = NonZeroU32::new(empty) else {
            return Ok(None);
        };
        let pick = self.rng.uniform_int(bound) as usize;
        let Some((row, col)) = self.grid.empty_cells().nth(pick) else {
            return Ok(None);
        };
        self.grid.spawn_tile_at(row, col, SPAWN_VALUE)?;
        self.last_spawn = Some((row, col));
        debug!(row, col, "spawned tile");
        Ok(Some((row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CELLS, Rows, SIZE, is_tile_value};
    use crate::rng::{Scripted, seeded};
    use proptest::prelude::*;

    fn game(rows: Rows, draws: &[u32]) -> Game<Scripted> {
        Game::from_grid(Grid::from_rows(rows).unwrap(), 0, Scripted::new(draws))
    }

    const EMPTY_ROW: [u32; SIZE] = [0; SIZE];

    #[test]
    fn test_new_game_has_two_starting_tiles() {
        let g = Game::new(Scripted::new(&[0, 0])).unwrap();
        // First pick is cell 0 of 16; second is cell 0 of the remaining 15.
        assert_eq!(g.grid().rows()[0], [2, 2, 0, 0]);
        assert_eq!(g.grid().tile_count(), 2);
        assert_eq!(g.score(), 0);
        assert_eq!(g.status(), Status::InProgress);
        assert_eq!(g.last_spawn(), Some((0, 1)));
    }

    #[test]
    fn test_new_game_tiles_are_distinct_cells() {
        for seed in 0..50 {
            let g = Game::new(seeded(seed)).unwrap();
            assert_eq!(g.grid().tile_count(), 2);
            assert!(g.grid().rows().iter().flatten().all(|&v| v == 0 || v == 2));
        }
    }

    #[test]
    fn test_merge_adds_score_and_spawns() {
        let mut g = game([[2, 2, 0, 0], EMPTY_ROW, EMPTY_ROW, EMPTY_ROW], &[0]);
        let out = g.apply_move(Direction::Left).unwrap();
        assert_eq!(out.score_delta, 4);
        assert_eq!(g.score(), 4);
        assert_eq!(g.moves(), 1);
        // Draw 0 picks the first empty cell in row-major order: (0, 1).
        assert_eq!(g.grid().rows()[0], [4, 2, 0, 0]);
        assert_eq!(g.last_spawn(), Some((0, 1)));
    }

    #[test]
    fn test_spawn_uses_row_major_index() {
        let mut g = game([[2, 0, 0, 0], EMPTY_ROW, EMPTY_ROW, EMPTY_ROW], &[14]);
        g.apply_move(Direction::Right).unwrap();
        // After the move (0,3) holds the 2; the 15th empty cell is (3,3).
        assert_eq!(g.grid().get(0, 3), Some(2));
        assert_eq!(g.grid().get(3, 3), Some(2));
        assert_eq!(g.last_spawn(), Some((3, 3)));
    }

    #[test]
    fn test_noop_move_changes_nothing() {
        let rows = [[2, 4, 0, 0], [8, 0, 0, 0], EMPTY_ROW, EMPTY_ROW];
        let mut g = game(rows, &[0]);
        let out = g.apply_move(Direction::Left).unwrap();
        assert!(!out.changed());
        assert_eq!(g.grid().rows(), &rows);
        assert_eq!(g.score(), 0);
        assert_eq!(g.moves(), 0);
        assert_eq!(g.last_spawn(), None);
        assert_eq!(g.status(), Status::InProgress);
    }

    #[test]
    fn test_deadlocked_board_is_lost() {
        let g = game([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]], &[0]);
        assert_eq!(g.status(), Status::Lost);
    }

    #[test]
    fn test_spawn_that_fills_board_loses() {
        // Left frees only (3,3); the spawned 2 has no equal neighbour.
        let rows = [
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [32, 16, 4, 4],
        ];
        let mut g = game(rows, &[0]);
        g.apply_move(Direction::Left).unwrap();
        assert_eq!(g.grid().rows()[3], [32, 16, 8, 2]);
        assert_eq!(g.grid().empty_cell_count(), 0);
        assert_eq!(g.status(), Status::Lost);
        assert_eq!(
            g.apply_move(Direction::Up),
            Err(GameError::GameOver(Status::Lost))
        );
    }

    #[test]
    fn test_reaching_2048_wins_without_spawn() {
        let rows = [[1024, 1024, 0, 0], [2, 0, 0, 0], EMPTY_ROW, EMPTY_ROW];
        let mut g = game(rows, &[0]);
        let out = g.apply_move(Direction::Left).unwrap();
        assert!(out.reached_win);
        assert_eq!(g.status(), Status::Won);
        assert_eq!(g.grid().rows()[0], [WIN_TILE, 0, 0, 0]);
        assert_eq!(g.grid().tile_count(), 2);
        assert_eq!(g.last_spawn(), None);
        assert_eq!(g.score(), 2048);
    }

    #[test]
    fn test_win_completes_the_whole_move() {
        let rows = [[1024, 1024, 0, 0], [4, 4, 0, 0], EMPTY_ROW, EMPTY_ROW];
        let mut g = game(rows, &[0]);
        g.apply_move(Direction::Left).unwrap();
        assert_eq!(g.grid().rows()[1], [8, 0, 0, 0]);
        assert_eq!(g.score(), 2048 + 8);
    }

    #[test]
    fn test_no_moves_after_win() {
        let mut g = game([[1024, 1024, 0, 0], EMPTY_ROW, EMPTY_ROW, EMPTY_ROW], &[0]);
        g.apply_move(Direction::Left).unwrap();
        let before = *g.grid();
        assert_eq!(
            g.apply_move(Direction::Right),
            Err(GameError::GameOver(Status::Won))
        );
        assert_eq!(g.grid(), &before);
        assert_eq!(g.score(), 2048);
    }

    #[test]
    fn test_resumed_board_with_winning_tile_is_won() {
        let mut g = game([[WIN_TILE, 2, 0, 0], EMPTY_ROW, EMPTY_ROW, EMPTY_ROW], &[0]);
        assert_eq!(g.status(), Status::Won);
        assert_eq!(
            g.apply_move(Direction::Right),
            Err(GameError::GameOver(Status::Won))
        );
        let g = game([[1024, 2, 0, 0], EMPTY_ROW, EMPTY_ROW, EMPTY_ROW], &[0]);
        assert_eq!(g.status(), Status::InProgress);
    }

    #[test]
    fn test_restart_deals_fresh_game() {
        let mut g = game([[1024, 1024, 0, 0], EMPTY_ROW, EMPTY_ROW, EMPTY_ROW], &[0]);
        g.apply_move(Direction::Left).unwrap();
        g.restart(Scripted::new(&[3, 3])).unwrap();
        assert_eq!(g.status(), Status::InProgress);
        assert_eq!(g.score(), 0);
        assert_eq!(g.moves(), 0);
        assert_eq!(g.grid().tile_count(), 2);
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = Game::new(seeded(12345)).unwrap();
        let mut b = Game::new(seeded(12345)).unwrap();
        for d in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
            let _ = a.apply_move(d);
            let _ = b.apply_move(d);
            assert_eq!(a.grid(), b.grid());
            assert_eq!(a.score(), b.score());
        }
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_random_play_keeps_invariants(
            seed in any::<u64>(),
            dirs in prop::collection::vec(any_direction(), 1..300),
        ) {
            let mut g = Game::new(seeded(seed)).unwrap();
            for d in dirs {
                let before_grid = *g.grid();
                let before_score = g.score();
                match g.apply_move(d) {
                    Ok(out) if out.changed() => {
                        prop_assert_eq!(g.score(), before_score + out.score_delta);
                        let spawned = usize::from(g.last_spawn().is_some());
                        prop_assert_eq!(
                            g.grid().tile_count(),
                            before_grid.tile_count() - out.merges as usize + spawned
                        );
                    }
                    Ok(_) => {
                        prop_assert_eq!(g.grid(), &before_grid);
                        prop_assert_eq!(g.score(), before_score);
                    }
                    Err(GameError::GameOver(status)) => {
                        prop_assert!(status.is_terminal());
                        prop_assert_eq!(g.grid(), &before_grid);
                        break;
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {e}"),
                }
                let grid = g.grid();
                prop_assert_eq!(grid.empty_cell_count() + grid.tile_count(), CELLS);
                prop_assert!(grid
                    .rows()
                    .iter()
                    .flatten()
                    .all(|&v| v == 0 || (is_tile_value(v) && v <= WIN_TILE)));
            }
        }
    }
}
