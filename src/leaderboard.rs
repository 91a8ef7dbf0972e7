//! Leaderboard persistence: top scores as a JSON array in the config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const FILENAME: &str = "leaderboard.json";

/// Entries kept after each submission.
pub const MAX_ENTRIES: usize = 10;

/// Shown in place of the board when it cannot be read.
const PLACEHOLDER_NAME: &str = "connection failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    /// Unix time in milliseconds.
    #[serde(default)]
    pub timestamp: u64,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            score,
            timestamp: unix_millis(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

/// Score storage used by the app. Implementations must be usable from a background thread.
pub trait ScoreBoard: Send + Sync {
    /// Add a score and return the updated top list.
    fn submit_score(&self, name: &str, score: u32) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;

    /// Top entries, highest score first.
    fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

/// Leaderboard stored as pretty-printed JSON at `path`.
#[derive(Debug)]
pub struct FileLeaderboard {
    path: PathBuf,
    /// Held across each read-modify-write so concurrent submissions don't drop entries.
    lock: Mutex<()>,
}

impl FileLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries. A missing file is seeded with the default board; a corrupt one reads as it.
    fn read(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let seeded = default_entries();
                self.write(&seeded)?;
                return Ok(seeded);
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Vec<LeaderboardEntry>>(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                log::warn!("leaderboard {} unreadable ({}); using defaults", self.path.display(), e);
                Ok(default_entries())
            }
        }
    }

    /// Write to a sibling temp file, then rename over the real one so readers never see a partial file.
    fn write(&self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ScoreBoard for FileLeaderboard {
    fn submit_score(&self, name: &str, score: u32) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeaderboardError::InvalidEntry("empty name".to_string()));
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read()?;
        entries.push(LeaderboardEntry::new(name, score));
        let top = top_entries(entries);
        self.write(&top)?;
        log::info!("submitted {} for {}", score, name);
        Ok(top)
    }

    fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(top_entries(self.read()?))
    }
}

/// Sort by score, highest first (stable, so earlier entries win ties), and cap at [`MAX_ENTRIES`].
fn top_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(MAX_ENTRIES);
    entries
}

fn default_entries() -> Vec<LeaderboardEntry> {
    [
        ("Ami the Great", 99_999),
        ("Kittymi", 88_888),
        ("Clear Master", 77_777),
        ("Meme", 66_666),
    ]
    .into_iter()
    .map(|(name, score)| LeaderboardEntry::new(name, score))
    .collect()
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fetched entries, or a single placeholder row if the fetch failed.
pub fn leaderboard_or_placeholder(
    result: Result<Vec<LeaderboardEntry>, LeaderboardError>,
) -> Vec<LeaderboardEntry> {
    result.unwrap_or_else(|e| {
        log::warn!("leaderboard fetch failed: {}", e);
        vec![LeaderboardEntry {
            name: PLACEHOLDER_NAME.to_string(),
            score: 0,
            timestamp: 0,
        }]
    })
}

/// Fire-and-forget submission. Failures are logged and never reach the caller.
pub fn submit_in_background(board: Arc<dyn ScoreBoard>, name: String, score: u32) -> JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = board.submit_score(&name, score) {
            log::warn!("score submission for {} failed: {}", name, e);
        }
    })
}
