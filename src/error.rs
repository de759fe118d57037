use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("invalid maze dimensions {width}x{height}: width and height must be odd and at least 5")]
    InvalidDimensions { width: usize, height: usize },

    #[error("map index {index} out of range for {count} maps")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("leaderboard {} unavailable: {source}", path.display())]
    LeaderboardUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("leaderboard format error: {0}")]
    LeaderboardFormat(#[from] serde_json::Error),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
