/// Persisted reviewer preferences
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/pavement-qc/settings.json
/// - macOS: ~/Library/Application Support/pavement-qc/settings.json
/// - Windows: %APPDATA%\pavement-qc\settings.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reviewer preferences that survive restarts
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Image folder of the last successful load; the folder picker opens here
    pub last_image_folder: Option<PathBuf>,
    /// Folder of the last prediction CSV; the CSV picker opens here
    pub last_csv_folder: Option<PathBuf>,
    /// Initial window size in logical pixels
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_image_folder: None,
            last_csv_folder: None,
            window_width: 1000.0,
            window_height: 600.0,
        }
    }
}

impl Settings {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Where the settings file lives, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("pavement-qc");
        path.push("settings.json");
        Some(path)
    }

    /// Load settings, falling back to defaults if the file is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings");
                Self::default()
            }
        }
    }

    /// Write settings, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        fs::write(path, json)
    }
}
