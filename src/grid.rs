use crate::error::{GameError, Result};

/// Smallest odd side length that leaves room for a border and one carving node.
pub const MIN_SIDE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Row and column offset of one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Self {
            width,
            height,
            tiles: vec![vec![tile; width]; height],
        }
    }

    /// Builds a grid from rows of `1` (wall) and `0` (open).
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if width == 0 || rows.iter().any(|r| r.as_ref().len() != width) {
            return Err(GameError::InvalidDimensions { width, height });
        }
        let tiles = rows
            .iter()
            .map(|r| {
                r.as_ref()
                    .iter()
                    .map(|&v| if v == 0 { Tile::Open } else { Tile::Wall })
                    .collect()
            })
            .collect();
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, cell: Cell) -> Option<Tile> {
        self.tiles.get(cell.row).and_then(|r| r.get(cell.col)).copied()
    }

    pub(crate) fn set(&mut self, cell: Cell, tile: Tile) {
        self.tiles[cell.row][cell.col] = tile;
    }

    pub fn is_open(&self, cell: Cell) -> bool {
        self.get(cell) == Some(Tile::Open)
    }

    /// The in-bounds neighbour one step away, if any.
    pub fn step(&self, cell: Cell, dir: Direction) -> Option<Cell> {
        let (dr, dc) = dir.delta();
        let row = cell.row.checked_add_signed(dr)?;
        let col = cell.col.checked_add_signed(dc)?;
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(Cell { row, col })
    }

    pub fn open_neighbors(&self, cell: Cell) -> usize {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.step(cell, dir))
            .filter(|&n| self.is_open(n))
            .count()
    }

    pub fn open_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for (row, tiles) in self.tiles.iter().enumerate() {
            for (col, tile) in tiles.iter().enumerate() {
                if *tile == Tile::Open {
                    cells.push(Cell { row, col });
                }
            }
        }
        cells
    }
}

pub fn check_dimensions(width: usize, height: usize) -> Result<()> {
    let valid = |side: usize| side >= MIN_SIDE && side % 2 == 1;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(GameError::InvalidDimensions { width, height })
    }
}
