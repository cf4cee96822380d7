// Configuration loading
// Loaded from <config-dir>/gridsift/settings.toml

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// User settings. Every field has a default, so a partial (or absent)
/// settings file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rows shown per page.
    pub page_size: usize,
    /// Maximum number of undo entries kept.
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 10,
            history_limit: 100,
        }
    }
}

impl Settings {
    /// Path of the settings file, if a config directory exists on this
    /// platform.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gridsift").join("settings.toml"))
    }

    /// Load settings from the default location. Missing file or unreadable
    /// content falls back to defaults.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from an explicit path, falling back to defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Write settings to the default location, creating the directory.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::path().ok_or("no config directory on this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, content).map_err(|e| e.to_string())
    }
}
