//! Remembered player name ("login"), stored as one line of text.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const FILENAME: &str = "player";

/// Longest name accepted from the prompt.
pub const MAX_NAME_LEN: usize = 24;

#[derive(Debug, Clone)]
pub struct Profile {
    path: PathBuf,
}

impl Profile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved name, or None on missing/empty file.
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        normalize_name(content.lines().next().unwrap_or_default())
    }

    /// Save a name. Creates the config directory if needed.
    pub fn save(&self, name: &str) -> Result<()> {
        let name = normalize_name(name).ok_or_else(|| anyhow::anyhow!("player name is empty"))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", name))?;
        Ok(())
    }

    /// Forget the saved name (switch player).
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Trimmed, length-capped name; None if nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    (!name.is_empty()).then_some(name)
}
