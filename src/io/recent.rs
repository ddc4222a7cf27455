use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parse::is_history_excluded;

/// One entry of the recently opened list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    pub file_path: String,
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    pub title: String,
}

/// Persisted list of deliberately opened notes, most recent first.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    path: PathBuf,
    limit: usize,
}

impl RecentFiles {
    pub fn new(path: PathBuf, limit: usize) -> Self {
        RecentFiles { path, limit }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the list. A missing file is an empty list; a corrupt one is
    /// reset to `[]` with a warning.
    pub fn load(&self) -> Vec<RecentEntry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "recent files list unreadable, resetting");
                if let Err(e) = self.save(&[]) {
                    tracing::warn!(path = %self.path.display(), error = %e, "could not reset recent files list");
                }
                Vec::new()
            }
        }
    }

    pub fn save(&self, entries: &[RecentEntry]) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        crate::io::fs::atomic_write(&self.path, content.as_bytes())
    }

    /// Move `file` to the front of the list. Date and sequence notes are
    /// skipped. Returns whether the list changed.
    pub fn add(&self, file: &Path, title: &str) -> Result<bool, std::io::Error> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_history_excluded(&name) {
            return Ok(false);
        }
        let file_path = file.to_string_lossy().into_owned();
        let mut entries: Vec<RecentEntry> = self
            .load()
            .into_iter()
            .filter(|e| e.file_path != file_path)
            .collect();
        entries.insert(
            0,
            RecentEntry {
                file_path,
                opened_at: Utc::now(),
                title: title.to_string(),
            },
        );
        entries.truncate(self.limit);
        self.save(&entries)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), std::io::Error> {
        self.save(&[])
    }
}

/// Default location: `$XDG_DATA_HOME/bext/history.json`.
pub fn default_recent_path() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| crate::io::config_io::home_dir().join(".local").join("share"));
    data_dir.join("bext").join("history.json")
}
