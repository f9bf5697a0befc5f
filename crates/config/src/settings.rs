// Application settings
// Loaded from ~/.config/caserecon/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Report store
    #[serde(rename = "store.path")]
    pub store_path: Option<PathBuf>,  // None = <data dir>/caserecon/reports.db

    // Archive
    #[serde(rename = "archive.path")]
    pub archive_path: Option<PathBuf>,

    // Comparison defaults
    #[serde(rename = "compare.filterByEventCode")]
    pub filter_by_event_code: bool,

    #[serde(rename = "compare.attributes")]
    pub attributes: Option<Vec<String>>,  // None = every authoritative field
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: None,
            archive_path: None,
            filter_by_event_code: true,
            attributes: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caserecon");
        config_dir.join("settings.json")
    }

    /// Default location of the report database
    pub fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caserecon")
            .join("reports.db")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Store path after applying the `CASERECON_STORE` override
    pub fn effective_store_path(&self) -> PathBuf {
        self.resolve_store_path(std::env::var_os(crate::STORE_ENV).map(PathBuf::from))
    }

    fn resolve_store_path(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| self.store_path.clone())
            .unwrap_or_else(Self::default_store_path)
    }
}
