use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::EditorConfig;

/// Get the config file path, respecting XDG_CONFIG_HOME
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_dir.join("bext").join("config.toml")
}

/// Get the user's home directory
pub fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read the config from a specific path.
/// If the file doesn't exist, returns defaults.
/// If the file is corrupted, backs it up as .bak and returns defaults.
pub fn read_config_from(path: &Path) -> EditorConfig {
    if !path.exists() {
        return EditorConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<EditorConfig>(&content) {
            Ok(config) => config,
            Err(e) => {
                let bak = path.with_extension("toml.bak");
                let _ = fs::copy(path, &bak);
                eprintln!(
                    "warning: could not parse {} (backed up as {}): {}",
                    path.display(),
                    bak.display(),
                    e
                );
                EditorConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
            EditorConfig::default()
        }
    }
}

/// Read the config from the default location.
pub fn read_config() -> EditorConfig {
    read_config_from(&config_path())
}
