//! A terminal maze game: walk a token through a chain of random perfect
//! mazes without stepping into a dead end, and beat your best attempt count.

pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod leaderboard;
pub mod maze;
pub mod progression;
pub mod render;
pub mod session;

pub use error::{GameError, Result};
pub use grid::{Cell, Direction, Grid, Tile};
pub use maze::{Maze, MazeSet};
pub use progression::{Progress, ProgressionController, Tick};
pub use session::{MoveOutcome, NavigationSession, Phase, SessionEvent, SessionState};
