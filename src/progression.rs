//! Map advancement, forfeits and win detection across a run.

use std::fmt;

use log::{info, warn};

use crate::error::Result;
use crate::grid::{Cell, Grid};
use crate::input::InputSnapshot;
use crate::maze::{Maze, MazeSet};
use crate::session::{MoveOutcome, NavigationSession, Path, SessionEvent, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Moved on to the (0-based) map.
    Advanced { map_index: usize },
    /// Failure budget exhausted; the run starts over from map 0.
    Restarted,
    RunComplete { total_attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Quit,
    NoInput,
    Move {
        outcome: MoveOutcome,
        progress: Option<Progress>,
    },
}

/// Everything a renderer needs for one frame of the active map.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub grid: &'a Grid,
    pub failed_paths: &'a [Path],
    pub exit: Cell,
    pub player: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub map: usize,
    pub map_count: usize,
    pub fails: u32,
    pub max_fails: u32,
    pub total_attempts: u32,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Map {}/{}   Fails {}/{}   Total Attempts {}",
            self.map, self.map_count, self.fails, self.max_fails, self.total_attempts
        )
    }
}

pub struct ProgressionController {
    mazes: MazeSet,
    navigation: NavigationSession,
}

impl ProgressionController {
    pub fn new(mazes: MazeSet, max_fails_per_map: u32) -> Self {
        Self {
            mazes,
            navigation: NavigationSession::new(max_fails_per_map),
        }
    }

    pub fn mazes(&self) -> &MazeSet {
        &self.mazes
    }

    pub fn new_session(&self) -> Result<SessionState> {
        let start = self.mazes.maze_at(0)?.start();
        Ok(SessionState::new(self.mazes.count(), start))
    }

    pub fn active_maze(&self, state: &SessionState) -> Result<&Maze> {
        self.mazes.maze_at(state.map_index())
    }

    /// One loop iteration: at most one move, then any map switch it causes.
    pub fn tick(&self, state: &mut SessionState, input: &InputSnapshot) -> Result<Tick> {
        if input.quit {
            return Ok(Tick::Quit);
        }
        let Some(dir) = input.direction() else {
            return Ok(Tick::NoInput);
        };
        let maze = self.active_maze(state)?;
        let outcome = self.navigation.attempt_move(state, maze, dir);
        let progress = match outcome.event() {
            Some(event) => Some(self.handle(state, event)?),
            None => None,
        };
        Ok(Tick::Move { outcome, progress })
    }

    pub fn handle(&self, state: &mut SessionState, event: SessionEvent) -> Result<Progress> {
        match event {
            SessionEvent::MapCleared => {
                let next = state.map_index() + 1;
                if next < self.mazes.count() {
                    let start = self.mazes.maze_at(next)?.start();
                    state.enter_map(next, start);
                    info!("advancing to map {}/{}", next + 1, self.mazes.count());
                    Ok(Progress::Advanced { map_index: next })
                } else {
                    state.finish();
                    info!("run complete in {} attempts", state.total_attempts());
                    Ok(Progress::RunComplete {
                        total_attempts: state.total_attempts(),
                    })
                }
            }
            SessionEvent::MapExhausted => {
                warn!(
                    "map {} exhausted after {} fails, restarting run",
                    state.map_index() + 1,
                    state.fail_count(state.map_index())
                );
                state.restart();
                Ok(Progress::Restarted)
            }
        }
    }

    pub fn status(&self, state: &SessionState) -> Status {
        Status {
            map: state.map_index() + 1,
            map_count: self.mazes.count(),
            fails: state.fail_count(state.map_index()),
            max_fails: self.navigation.max_fails_per_map(),
            total_attempts: state.total_attempts(),
        }
    }

    pub fn frame<'a>(&'a self, state: &'a SessionState) -> Result<Frame<'a>> {
        let maze = self.active_maze(state)?;
        Ok(Frame {
            grid: maze.grid(),
            failed_paths: state.failed_paths(state.map_index()),
            exit: maze.exit(),
            player: state.position(),
        })
    }
}
