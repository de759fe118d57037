//! Perfect maze generation and the per-run set of maps.
//!
//! Carving nodes sit on odd coordinates; the wall between two neighbouring
//! nodes is the even cell halfway between them. A randomized depth-first
//! backtracker over the nodes yields a spanning tree, so there is exactly one
//! simple path between any two open cells.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{GameError, Result};
use crate::grid::{check_dimensions, Cell, Grid, Tile};

pub const START: Cell = Cell::new(1, 1);

const NODE_OFFSETS: [(isize, isize); 4] = [(0, 2), (0, -2), (2, 0), (-2, 0)];

/// One node on the carving stack together with the offsets it has yet to try.
struct Carve {
    cell: Cell,
    offsets: std::array::IntoIter<(isize, isize), 4>,
}

impl Carve {
    fn enter(grid: &mut Grid, cell: Cell, rng: &mut impl Rng) -> Self {
        grid.set(cell, Tile::Open);
        let mut offsets = NODE_OFFSETS;
        offsets.shuffle(rng);
        Self {
            cell,
            offsets: offsets.into_iter(),
        }
    }
}

pub(crate) fn exit_for(width: usize, height: usize) -> Cell {
    Cell::new(height - 2, width - 2)
}

pub fn generate(rng: &mut impl Rng, width: usize, height: usize) -> Result<Grid> {
    check_dimensions(width, height)?;
    let mut grid = Grid::filled(width, height, Tile::Wall);
    let mut stack = vec![Carve::enter(&mut grid, START, rng)];

    while let Some(top) = stack.last_mut() {
        let Some((dr, dc)) = top.offsets.next() else {
            stack.pop();
            continue;
        };
        let here = top.cell;
        let (Some(row), Some(col)) = (
            here.row.checked_add_signed(dr),
            here.col.checked_add_signed(dc),
        ) else {
            continue;
        };
        let next = Cell::new(row, col);
        let interior = row > 0 && row < height - 1 && col > 0 && col < width - 1;
        if interior && grid.get(next) == Some(Tile::Wall) {
            grid.set(carve_between(here, next), Tile::Open);
            stack.push(Carve::enter(&mut grid, next, rng));
        }
    }

    grid.set(exit_for(width, height), Tile::Open);
    Ok(grid)
}

fn carve_between(a: Cell, b: Cell) -> Cell {
    Cell::new((a.row + b.row) / 2, (a.col + b.col) / 2)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    grid: Grid,
    start: Cell,
    exit: Cell,
}

impl Maze {
    pub fn generate(rng: &mut impl Rng, width: usize, height: usize) -> Result<Self> {
        let grid = generate(rng, width, height)?;
        Ok(Self {
            grid,
            start: START,
            exit: exit_for(width, height),
        })
    }

    /// Wraps a prepared grid; start and exit are forced open.
    pub fn from_grid(mut grid: Grid) -> Result<Self> {
        check_dimensions(grid.width(), grid.height())?;
        let exit = exit_for(grid.width(), grid.height());
        grid.set(START, Tile::Open);
        grid.set(exit, Tile::Open);
        Ok(Self {
            grid,
            start: START,
            exit,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn exit(&self) -> Cell {
        self.exit
    }
}

/// The ordered maps of one run. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct MazeSet {
    mazes: Vec<Maze>,
}

impl MazeSet {
    pub fn build(rng: &mut impl Rng, count: usize, width: usize, height: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        let mazes = (0..count)
            .map(|_| Maze::generate(rng, width, height))
            .collect::<Result<Vec<_>>>()?;
        debug!("built {count} mazes of {width}x{height}");
        Ok(Self { mazes })
    }

    pub fn from_mazes(mazes: Vec<Maze>) -> Self {
        Self { mazes }
    }

    pub fn maze_at(&self, index: usize) -> Result<&Maze> {
        self.mazes.get(index).ok_or(GameError::IndexOutOfRange {
            index,
            count: self.mazes.len(),
        })
    }

    pub fn count(&self) -> usize {
        self.mazes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashSet, VecDeque};

    use crate::grid::Direction;

    fn reachable_from(grid: &Grid, start: Cell) -> HashSet<Cell> {
        let mut seen = HashSet::from([start]);
        let mut q = VecDeque::from([start]);
        while let Some(cell) = q.pop_front() {
            for dir in Direction::ALL {
                if let Some(next) = grid.step(cell, dir) {
                    if grid.is_open(next) && seen.insert(next) {
                        q.push_back(next);
                    }
                }
            }
        }
        seen
    }

    #[test]
    fn rejects_bad_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate(&mut rng, 4, 5),
            Err(GameError::InvalidDimensions { width: 4, height: 5 })
        ));
        assert!(generate(&mut rng, 5, 3).is_err());
        assert!(MazeSet::build(&mut rng, 3, 9, 10).is_err());
    }

    #[test]
    fn smallest_maze_is_an_open_l_or_u() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = generate(&mut rng, 5, 5).unwrap();
        let open = grid.open_cells();
        // 4 nodes plus the 3 connectors of a spanning tree.
        assert_eq!(open.len(), 7);
        assert!(grid.is_open(Cell::new(3, 3)));
        assert!(!grid.is_open(Cell::new(2, 2)));
    }

    #[test]
    fn maze_set_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let set = MazeSet::build(&mut rng, 3, 7, 5).unwrap();
        assert_eq!(set.count(), 3);
        assert!(set.maze_at(2).is_ok());
        assert!(matches!(
            set.maze_at(3),
            Err(GameError::IndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn maze_set_draws_independent_mazes() {
        let mut rng = StdRng::seed_from_u64(11);
        let set = MazeSet::build(&mut rng, 6, 21, 21).unwrap();
        let first = set.maze_at(0).unwrap();
        assert!((1..6).any(|i| set.maze_at(i).unwrap() != first));
    }

    #[test]
    fn from_grid_forces_exit_open() {
        let rows: [&[u8]; 5] = [
            &[1, 1, 1, 1, 1],
            &[1, 0, 0, 0, 1],
            &[1, 1, 1, 0, 1],
            &[1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1],
        ];
        let maze = Maze::from_grid(Grid::from_rows(&rows).unwrap()).unwrap();
        assert_eq!(maze.exit(), Cell::new(3, 3));
        assert!(maze.grid().is_open(maze.exit()));
    }

    #[test]
    fn from_grid_rejects_grids_without_room_for_an_exit() {
        for (width, height) in [(1, 1), (2, 5), (5, 3), (6, 5)] {
            let grid = Grid::filled(width, height, Tile::Wall);
            assert!(matches!(
                Maze::from_grid(grid),
                Err(GameError::InvalidDimensions { .. })
            ));
        }
    }

    proptest! {
        #[test]
        fn generated_mazes_are_perfect(
            seed in any::<u64>(),
            half_w in 2usize..15,
            half_h in 2usize..12,
        ) {
            let (width, height) = (half_w * 2 + 1, half_h * 2 + 1);
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = generate(&mut rng, width, height).unwrap();

            let mut nodes = 0;
            let mut connectors = 0;
            for cell in grid.open_cells() {
                prop_assert!(cell.row > 0 && cell.row < height - 1);
                prop_assert!(cell.col > 0 && cell.col < width - 1);
                match (cell.row % 2, cell.col % 2) {
                    (1, 1) => nodes += 1,
                    (0, 0) => prop_assert!(false, "lattice corner {:?} opened", cell),
                    _ => connectors += 1,
                }
            }
            prop_assert_eq!(nodes, half_w * half_h);
            prop_assert_eq!(connectors, nodes - 1);

            let reached = reachable_from(&grid, START);
            prop_assert_eq!(reached.len(), grid.open_cells().len());
        }

        #[test]
        fn exit_is_always_open(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = Maze::generate(&mut rng, 41, 31).unwrap();
            prop_assert!(maze.grid().is_open(maze.exit()));
            prop_assert_eq!(maze.exit(), Cell::new(29, 39));
            prop_assert!(maze.grid().is_open(maze.start()));
        }
    }
}
