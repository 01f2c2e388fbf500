//! Engine for the sliding-tile merge puzzle (2048) on a 4×4 board.
//!
//! ```
//! use mergetui::game::{Game, Status};
//! use mergetui::rng::seeded;
//! use mergetui::shift::Direction;
//!
//! let mut game = Game::new(seeded(42)).unwrap();
//! let outcome = game.apply_move(Direction::Left).unwrap();
//! println!("score {} (+{})", game.score(), outcome.score_delta);
//! assert_eq!(game.status(), Status::InProgress);
//! ```

pub mod game;
pub mod grid;
pub mod rng;
pub mod shift;
