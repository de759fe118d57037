//! Per-step navigation: move validation, dead-end detection and attempt
//! bookkeeping for the active map.

use std::collections::HashSet;

use log::{debug, info};

use crate::grid::{Cell, Direction};
use crate::maze::Maze;

/// Ordered cells of one attempt, starting at the maze start.
pub type Path = Vec<Cell>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No move yet on the current attempt.
    Idle,
    InTransit,
    /// Dead end; the attempt is over.
    Dead,
    /// Exit reached.
    Reached,
}

/// Classifies a freshly entered cell. The exit always wins over the
/// dead-end rule.
pub fn classify(maze: &Maze, cell: Cell) -> Phase {
    if cell == maze.exit() {
        Phase::Reached
    } else if maze.grid().open_neighbors(cell) <= 1 {
        Phase::Dead
    } else {
        Phase::InTransit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: Cell,
    pub to: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Wall, edge of the grid, or the attempt is already over.
    Blocked,
    /// Target is already on the current path.
    Revisit,
    Moved(Step),
    DeadEnd { step: Step, exhausted: bool },
    Reached(Step),
}

impl MoveOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MoveOutcome::Blocked | MoveOutcome::Revisit)
    }

    pub fn step(&self) -> Option<Step> {
        match *self {
            MoveOutcome::Moved(step)
            | MoveOutcome::Reached(step)
            | MoveOutcome::DeadEnd { step, .. } => Some(step),
            MoveOutcome::Blocked | MoveOutcome::Revisit => None,
        }
    }

    /// The event the progression layer has to act on, if any.
    pub fn event(&self) -> Option<SessionEvent> {
        match self {
            MoveOutcome::Reached(_) => Some(SessionEvent::MapCleared),
            MoveOutcome::DeadEnd {
                exhausted: true, ..
            } => Some(SessionEvent::MapExhausted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    MapCleared,
    MapExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    map_index: usize,
    start: Cell,
    position: Cell,
    path: Path,
    visited: HashSet<Cell>,
    fail_counts: Vec<u32>,
    failed_paths: Vec<Vec<Path>>,
    total_attempts: u32,
    phase: Phase,
}

impl SessionState {
    pub fn new(map_count: usize, start: Cell) -> Self {
        Self {
            map_index: 0,
            start,
            position: start,
            path: vec![start],
            visited: HashSet::from([start]),
            fail_counts: vec![0; map_count],
            failed_paths: vec![Vec::new(); map_count],
            total_attempts: 0,
            phase: Phase::Idle,
        }
    }

    pub fn map_index(&self) -> usize {
        self.map_index
    }

    pub fn map_count(&self) -> usize {
        self.fail_counts.len()
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn fail_count(&self, map_index: usize) -> u32 {
        self.fail_counts.get(map_index).copied().unwrap_or(0)
    }

    pub fn failed_paths(&self, map_index: usize) -> &[Path] {
        self.failed_paths
            .get(map_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Puts the player back on `start` of map `map_index` with a fresh path.
    pub(crate) fn enter_map(&mut self, map_index: usize, start: Cell) {
        self.map_index = map_index;
        self.reset_attempt(start);
    }

    /// Marks the run as won; no further moves are accepted.
    pub(crate) fn finish(&mut self) {
        self.phase = Phase::Reached;
    }

    /// Drops all progress: map 0, zero counters, empty failure logs.
    pub(crate) fn restart(&mut self) {
        *self = SessionState::new(self.map_count(), self.start);
    }

    fn reset_attempt(&mut self, start: Cell) {
        self.start = start;
        self.position = start;
        self.path.clear();
        self.path.push(start);
        self.visited.clear();
        self.visited.insert(start);
        self.phase = Phase::Idle;
    }
}

/// Move validation and dead-end handling for the active map.
#[derive(Debug, Clone, Copy)]
pub struct NavigationSession {
    max_fails_per_map: u32,
}

impl NavigationSession {
    pub fn new(max_fails_per_map: u32) -> Self {
        Self { max_fails_per_map }
    }

    pub fn max_fails_per_map(&self) -> u32 {
        self.max_fails_per_map
    }

    pub fn attempt_move(&self, state: &mut SessionState, maze: &Maze, dir: Direction) -> MoveOutcome {
        if !matches!(state.phase, Phase::Idle | Phase::InTransit) {
            return MoveOutcome::Blocked;
        }
        let from = state.position;
        let Some(to) = maze
            .grid()
            .step(from, dir)
            .filter(|&cell| maze.grid().is_open(cell))
        else {
            return MoveOutcome::Blocked;
        };
        if state.visited.contains(&to) {
            return MoveOutcome::Revisit;
        }

        state.position = to;
        state.path.push(to);
        state.visited.insert(to);
        let step = Step { from, to };

        match classify(maze, to) {
            Phase::Reached => {
                state.total_attempts += 1;
                state.phase = Phase::Reached;
                info!(
                    "map {} cleared after {} attempts in total",
                    state.map_index + 1,
                    state.total_attempts
                );
                MoveOutcome::Reached(step)
            }
            Phase::Dead => {
                state.phase = Phase::Dead;
                let exhausted = self.record_dead_end(state, maze);
                MoveOutcome::DeadEnd { step, exhausted }
            }
            _ => {
                state.phase = Phase::InTransit;
                MoveOutcome::Moved(step)
            }
        }
    }

    /// Logs the failed path, bumps counters and resets to the start.
    /// Returns whether the map's failure budget is used up.
    fn record_dead_end(&self, state: &mut SessionState, maze: &Maze) -> bool {
        let map = state.map_index;
        let failed = std::mem::take(&mut state.path);
        state.failed_paths[map].push(failed);
        state.fail_counts[map] += 1;
        state.total_attempts += 1;
        let exhausted = state.fail_counts[map] >= self.max_fails_per_map;
        debug!(
            "dead end on map {} at {:?} ({}/{})",
            map + 1,
            state.position,
            state.fail_counts[map],
            self.max_fails_per_map
        );
        state.reset_attempt(maze.start());
        exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use Direction::*;

    fn maze(rows: &[&[u8]]) -> Maze {
        Maze::from_grid(Grid::from_rows(rows).unwrap()).unwrap()
    }

    fn ring() -> Maze {
        maze(&[
            &[1, 1, 1, 1, 1],
            &[1, 0, 0, 0, 1],
            &[1, 0, 1, 0, 1],
            &[1, 0, 0, 0, 1],
            &[1, 1, 1, 1, 1],
        ])
    }

    /// (2,2) has open neighbours only above and below; (3,2) is a dead end.
    fn corridor() -> Maze {
        maze(&[
            &[1, 1, 1, 1, 1, 1, 1],
            &[1, 0, 0, 0, 0, 0, 1],
            &[1, 1, 0, 1, 0, 1, 1],
            &[1, 1, 0, 1, 0, 1, 1],
            &[1, 1, 1, 1, 0, 1, 1],
            &[1, 1, 1, 1, 0, 0, 1],
            &[1, 1, 1, 1, 1, 1, 1],
        ])
    }

    #[test]
    fn right_right_down_down_reaches_exit() {
        let maze = ring();
        let nav = NavigationSession::new(10);
        let mut state = SessionState::new(1, maze.start());

        for dir in [Right, Right, Down] {
            assert!(matches!(
                nav.attempt_move(&mut state, &maze, dir),
                MoveOutcome::Moved(_)
            ));
        }
        let last = nav.attempt_move(&mut state, &maze, Down);
        assert_eq!(
            last,
            MoveOutcome::Reached(Step {
                from: Cell::new(2, 3),
                to: Cell::new(3, 3)
            })
        );
        assert_eq!(last.event(), Some(SessionEvent::MapCleared));
        assert_eq!(state.phase(), Phase::Reached);
        assert_eq!(state.total_attempts(), 1);
        assert_eq!(state.fail_count(0), 0);
    }

    #[test]
    fn walls_and_revisits_are_no_ops() {
        let maze = ring();
        let nav = NavigationSession::new(10);
        let mut state = SessionState::new(1, maze.start());
        let before = state.clone();

        assert_eq!(nav.attempt_move(&mut state, &maze, Up), MoveOutcome::Blocked);
        assert_eq!(state, before);

        nav.attempt_move(&mut state, &maze, Right);
        assert_eq!(nav.attempt_move(&mut state, &maze, Left), MoveOutcome::Revisit);
        assert_eq!(state.position(), Cell::new(1, 2));
        assert_eq!(state.path(), &[Cell::new(1, 1), Cell::new(1, 2)]);
        assert_eq!(state.phase(), Phase::InTransit);
    }

    #[test]
    fn two_open_neighbours_is_not_dead_but_the_next_cell_is() {
        let maze = corridor();
        let nav = NavigationSession::new(10);
        let mut state = SessionState::new(1, maze.start());

        nav.attempt_move(&mut state, &maze, Right);
        let into_corridor = nav.attempt_move(&mut state, &maze, Down);
        assert!(matches!(into_corridor, MoveOutcome::Moved(_)));
        assert_eq!(state.position(), Cell::new(2, 2));

        let outcome = nav.attempt_move(&mut state, &maze, Down);
        assert_eq!(
            outcome,
            MoveOutcome::DeadEnd {
                step: Step {
                    from: Cell::new(2, 2),
                    to: Cell::new(3, 2)
                },
                exhausted: false
            }
        );
        assert_eq!(outcome.event(), None);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.position(), maze.start());
        assert_eq!(state.path(), &[maze.start()]);
        assert_eq!(state.fail_count(0), 1);
        assert_eq!(state.total_attempts(), 1);
        assert_eq!(
            state.failed_paths(0),
            &[vec![
                Cell::new(1, 1),
                Cell::new(1, 2),
                Cell::new(2, 2),
                Cell::new(3, 2)
            ]]
        );
    }

    #[test]
    fn classify_exempts_exit() {
        let maze = corridor();
        assert_eq!(maze.grid().open_neighbors(maze.exit()), 1);
        assert_eq!(classify(&maze, maze.exit()), Phase::Reached);
        assert_eq!(classify(&maze, Cell::new(3, 2)), Phase::Dead);
        assert_eq!(classify(&maze, Cell::new(2, 2)), Phase::InTransit);
    }

    #[test]
    fn exhausting_the_map_is_signalled() {
        let maze = corridor();
        let nav = NavigationSession::new(2);
        let mut state = SessionState::new(1, maze.start());

        let mut outcomes = Vec::new();
        for _ in 0..2 {
            nav.attempt_move(&mut state, &maze, Right);
            nav.attempt_move(&mut state, &maze, Down);
            outcomes.push(nav.attempt_move(&mut state, &maze, Down));
        }
        assert_eq!(outcomes[0].event(), None);
        assert_eq!(outcomes[1].event(), Some(SessionEvent::MapExhausted));
        assert_eq!(state.fail_count(0), 2);
        assert_eq!(state.failed_paths(0).len(), 2);
    }

    #[test]
    fn no_moves_after_reaching_exit() {
        let maze = ring();
        let nav = NavigationSession::new(10);
        let mut state = SessionState::new(1, maze.start());
        for dir in [Down, Down, Right, Right] {
            nav.attempt_move(&mut state, &maze, dir);
        }
        assert_eq!(state.phase(), Phase::Reached);
        assert_eq!(nav.attempt_move(&mut state, &maze, Up), MoveOutcome::Blocked);
        assert_eq!(state.position(), maze.exit());
    }

    #[test]
    fn restart_matches_fresh_state() {
        let maze = corridor();
        let nav = NavigationSession::new(10);
        let mut state = SessionState::new(3, maze.start());
        nav.attempt_move(&mut state, &maze, Right);
        nav.attempt_move(&mut state, &maze, Down);
        nav.attempt_move(&mut state, &maze, Down);
        state.enter_map(2, maze.start());
        nav.attempt_move(&mut state, &maze, Right);

        state.restart();
        assert_eq!(state, SessionState::new(3, maze.start()));
    }

    proptest! {
        #[test]
        fn paths_never_repeat_cells(
            seed in any::<u64>(),
            moves in prop::collection::vec(0usize..4, 1..200),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = Maze::generate(&mut rng, 15, 11).unwrap();
            let nav = NavigationSession::new(u32::MAX);
            let mut state = SessionState::new(1, maze.start());
            let mut finished = 0u32;

            for m in moves {
                let outcome = nav.attempt_move(&mut state, &maze, Direction::ALL[m]);
                if matches!(outcome, MoveOutcome::DeadEnd { .. } | MoveOutcome::Reached(_)) {
                    finished += 1;
                }
                let unique: HashSet<_> = state.path().iter().collect();
                prop_assert_eq!(unique.len(), state.path().len());
                for paths in state.failed_paths(0) {
                    let unique: HashSet<_> = paths.iter().collect();
                    prop_assert_eq!(unique.len(), paths.len());
                }
            }
            prop_assert_eq!(state.total_attempts(), finished);
            prop_assert_eq!(state.fail_count(0) as usize, state.failed_paths(0).len());
        }
    }
}
