//! Best attempt counts per user, persisted as a small JSON object.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use linked_hash_map::LinkedHashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::progression::{Progress, Tick};

/// Username to best (lowest) total attempts, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: LinkedHashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub username: String,
    pub attempts: u32,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str) -> Option<u32> {
        self.entries.get(username).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `attempts` when the user is new or improved. Returns whether
    /// anything changed.
    pub fn record_if_better(&mut self, username: &str, attempts: u32) -> bool {
        match self.entries.get_mut(username) {
            Some(best) if attempts < *best => {
                *best = attempts;
                true
            }
            Some(_) => false,
            None => {
                self.entries.insert(username.to_owned(), attempts);
                true
            }
        }
    }

    /// Fewest attempts first; ties keep insertion order.
    pub fn top_n(&self, n: usize) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .entries
            .iter()
            .map(|(username, &attempts)| Standing {
                username: username.clone(),
                attempts,
            })
            .collect();
        standings.sort_by_key(|s| s.attempts);
        standings.truncate(n);
        standings
    }
}

pub trait LeaderboardStore {
    /// Never fails; an absent or unreadable store reads as empty.
    fn load(&self) -> Leaderboard;

    /// Replaces the stored mapping wholesale.
    fn save(&mut self, board: &Leaderboard) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Leaderboard> {
        let text = fs::read_to_string(&self.path).map_err(|source| self.unavailable(source))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn unavailable(&self, source: io::Error) -> GameError {
        GameError::LeaderboardUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl LeaderboardStore for JsonFileStore {
    fn load(&self) -> Leaderboard {
        match self.read() {
            Ok(board) => board,
            Err(GameError::LeaderboardUnavailable { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Leaderboard::new()
            }
            Err(e) => {
                warn!("{e}; starting from an empty leaderboard");
                Leaderboard::new()
            }
        }
    }

    fn save(&mut self, board: &Leaderboard) -> Result<()> {
        let mut text = serde_json::to_string_pretty(board)?;
        text.push('\n');
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let write = || -> io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(text.as_bytes())?;
            f.sync_all()?;
            drop(f);
            fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| self.unavailable(e))
    }
}

/// In-process store, for tests and runs that should leave no file behind.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    board: Leaderboard,
    saves: usize,
}

impl MemoryStore {
    pub fn new(board: Leaderboard) -> Self {
        Self { board, saves: 0 }
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl LeaderboardStore for MemoryStore {
    fn load(&self) -> Leaderboard {
        self.board.clone()
    }

    fn save(&mut self, board: &Leaderboard) -> Result<()> {
        self.board = board.clone();
        self.saves += 1;
        Ok(())
    }
}

/// Records a finished run and returns the top `limit` standings. A failed
/// save is logged and yields no standings.
pub fn submit_score(
    store: &mut impl LeaderboardStore,
    username: &str,
    attempts: u32,
    limit: usize,
) -> Vec<Standing> {
    let mut board = store.load();
    if board.record_if_better(username, attempts) {
        if let Err(e) = store.save(&board) {
            warn!("could not save leaderboard: {e}");
            return Vec::new();
        }
        info!("new best for {username}: {attempts} attempts");
    }
    board.top_n(limit)
}

/// Submits the run's score when `tick` completed the run and returns the
/// standings to show. Every other tick, closing included, leaves the store
/// untouched.
pub fn settle(
    tick: &Tick,
    store: &mut impl LeaderboardStore,
    username: &str,
    limit: usize,
) -> Option<Vec<Standing>> {
    match tick {
        Tick::Move {
            progress: Some(Progress::RunComplete { total_attempts }),
            ..
        } => Some(submit_score(store, username, *total_attempts, limit)),
        _ => None,
    }
}
