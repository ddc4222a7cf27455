use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub recent: RecentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period before a burst of writes is reported as one change.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentConfig {
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
    /// Override for the recent-files JSON location.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for RecentConfig {
    fn default() -> Self {
        RecentConfig {
            limit: default_recent_limit(),
            path: None,
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_recent_limit() -> usize {
    30
}
