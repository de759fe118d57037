use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::warn;

use crate::error::Result;
use crate::grid::check_dimensions;

pub const DEFAULT_MAZE_WIDTH: usize = 41;
pub const DEFAULT_MAZE_HEIGHT: usize = 31;
pub const DEFAULT_MAP_COUNT: u32 = 5;
pub const DEFAULT_MAX_FAILS: u32 = 10;
pub const DEFAULT_USERNAME: &str = "Anonymous";
pub const LEADERBOARD_SIZE: usize = 10;
/// Terminal columns per grid cell.
pub const CELL_W: usize = 2;
const DEFAULT_TICK_MS: u64 = 100;
const DEFAULT_RENDER_FPS: u64 = 60;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Escape a chain of random mazes without walking into dead ends")]
pub struct Args {
    /// Maze width in cells (odd, at least 5)
    #[arg(short = 'W', long, default_value_t = DEFAULT_MAZE_WIDTH)]
    pub width: usize,

    /// Maze height in cells (odd, at least 5)
    #[arg(short = 'H', long, default_value_t = DEFAULT_MAZE_HEIGHT)]
    pub height: usize,

    /// Number of mazes in a run
    #[arg(short, long, default_value_t = DEFAULT_MAP_COUNT, value_parser = clap::value_parser!(u32).range(1..))]
    pub maps: u32,

    /// Dead ends allowed per maze before the run restarts
    #[arg(short = 'f', long, default_value_t = DEFAULT_MAX_FAILS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_fails: u32,

    /// Seed for reproducible mazes
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Player name; prompted for when omitted
    #[arg(short, long)]
    pub username: Option<String>,

    /// Leaderboard file
    #[arg(long, default_value = "leaderboard.json")]
    pub leaderboard: PathBuf,

    /// Log file (the terminal is taken by the game)
    #[arg(long, default_value = "maze_game.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub map_count: usize,
    pub max_fails_per_map: u32,
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Self {
            width: args.width,
            height: args.height,
            map_count: args.maps as usize,
            max_fails_per_map: args.max_fails,
            seed: args.seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_dimensions(self.width, self.height)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_MAZE_WIDTH,
            height: DEFAULT_MAZE_HEIGHT,
            map_count: DEFAULT_MAP_COUNT as usize,
            max_fails_per_map: DEFAULT_MAX_FAILS,
            seed: None,
        }
    }
}

/// Blank names fall back to the placeholder.
pub fn resolve_username(input: Option<&str>) -> String {
    match input.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => DEFAULT_USERNAME.to_owned(),
    }
}

/// Asks for a name on `output` and reads one line from `input`. Terminal
/// trouble is logged and falls back to the placeholder name.
pub fn prompt_username(input: &mut impl BufRead, output: &mut impl Write) -> String {
    let shown = write!(output, "Enter your username: ").and_then(|()| output.flush());
    if let Err(e) = shown {
        warn!("could not show username prompt: {e}");
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => resolve_username(Some(&line)),
        Err(e) => {
            warn!("could not read username: {e}");
            resolve_username(None)
        }
    }
}

/// Loop and presentation timings. None of these affect game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub tick: Duration,
    pub frame: Duration,
}

impl Pacing {
    pub fn from_env() -> Self {
        let tick_ms = read_positive("MAZE_TICK_MS").unwrap_or(DEFAULT_TICK_MS);
        let render_fps = read_positive("MAZE_FPS").unwrap_or(DEFAULT_RENDER_FPS);
        Self {
            tick: Duration::from_millis(tick_ms),
            frame: Duration::from_micros(1_000_000 / render_fps),
        }
    }

    /// Pause after a rejected move.
    pub fn throttle(sprint: bool) -> Duration {
        Duration::from_millis(if sprint { 10 } else { 50 })
    }

    /// Animation frame count and per-frame delay for one accepted move.
    pub fn animation(sprint: bool) -> (u32, Duration) {
        if sprint {
            (4, Duration::from_millis(5))
        } else {
            (8, Duration::from_millis(20))
        }
    }
}

fn read_positive(var: &str) -> Option<u64> {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
}
