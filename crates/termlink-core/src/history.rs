//! Command history persisted as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of remembered commands.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Commands the user has run, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistory {
    entries: Vec<String>,
}

impl CommandHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default history file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        crate::termlink_home().join("history.json")
    }

    /// Loads history from `path`; a missing file yields an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read history file {}", path.display()))?;
        let mut history: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history file {}", path.display()))?;
        history.truncate();
        Ok(history)
    }

    /// Writes history to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create history directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize history")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write history file {}", path.display()))?;
        Ok(())
    }

    /// Records `command`. Blank commands and repeats of the previous entry are
    /// skipped; returns whether the command was added.
    pub fn push(&mut self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() || self.entries.last().is_some_and(|last| last == command) {
            return false;
        }

        self.entries.push(command.to_string());
        self.truncate();
        true
    }

    fn truncate(&mut self) {
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let excess = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    /// Returns the recorded commands, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every recorded command.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
