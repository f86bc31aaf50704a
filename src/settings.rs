//! Shared settings for the ADB driver and CLI.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tools::DEFAULT_SWIPE_DURATION_MS;

/// Settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSettings {
    /// Path to the adb binary
    pub adb_path: String,
    /// ADB device ID (empty for the default device)
    pub device_id: String,
    /// Delay after each delivered action, in milliseconds
    pub action_delay_ms: u64,
    /// Default swipe duration in milliseconds
    pub swipe_duration_ms: u64,
    /// Switch to ADB Keyboard for text input and restore the previous IME afterwards
    pub manage_keyboard: bool,
}

impl Default for ToolsSettings {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_id: String::new(),
            action_delay_ms: 500,
            swipe_duration_ms: DEFAULT_SWIPE_DURATION_MS,
            manage_keyboard: true,
        }
    }
}

impl ToolsSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "moderras", "droid-tools")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut loaded: Self = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        // Backfill fields that older files left empty
        let defaults = Self::default();
        if loaded.adb_path.is_empty() {
            loaded.adb_path = defaults.adb_path;
        }
        if loaded.swipe_duration_ms == 0 {
            loaded.swipe_duration_ms = defaults.swipe_duration_ms;
        }

        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::settings_path().ok_or("Cannot determine config directory")?;
        self.save_to(&path)
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Override fields from `ADB_PATH`, `ADB_DEVICE_ID`, `ACTION_DELAY_MS`
    /// and `SWIPE_DURATION_MS` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = env::var("ADB_PATH") {
            if !path.is_empty() {
                self.adb_path = path;
            }
        }
        if let Ok(id) = env::var("ADB_DEVICE_ID") {
            self.device_id = id;
        }
        if let Some(delay) = env::var("ACTION_DELAY_MS").ok().and_then(|s| s.parse().ok()) {
            self.action_delay_ms = delay;
        }
        if let Some(duration) = env::var("SWIPE_DURATION_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|d: &u64| *d > 0)
        {
            self.swipe_duration_ms = duration;
        }
        self
    }

    /// Device ID, or `None` for the default device.
    pub fn device(&self) -> Option<&str> {
        if self.device_id.is_empty() {
            None
        } else {
            Some(&self.device_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ToolsSettings::default();
        assert_eq!(settings.adb_path, "adb");
        assert_eq!(settings.swipe_duration_ms, 300);
        assert_eq!(settings.device(), None);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = ToolsSettings {
            device_id: "emulator-5554".to_string(),
            action_delay_ms: 0,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = ToolsSettings::load_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.device(), Some("emulator-5554"));
    }

    #[test]
    fn test_load_backfills_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"adb_path": "", "device_id": "abc"}"#).unwrap();

        let loaded = ToolsSettings::load_from(&path);
        assert_eq!(loaded.adb_path, "adb");
        assert_eq!(loaded.device_id, "abc");
        assert_eq!(loaded.action_delay_ms, 500);
    }

    #[test]
    fn test_load_missing_or_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ToolsSettings::load_from(&dir.path().join("absent.json")),
            ToolsSettings::default()
        );

        let path = dir.path().join("corrupt.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(ToolsSettings::load_from(&path), ToolsSettings::default());
    }
}
