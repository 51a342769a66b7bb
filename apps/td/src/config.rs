//! Configuration for td.

use anyhow::Context;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use td_core::storage::{self, StorageConfig, StorageKind};

const APP_NAME: &str = "td";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data file; defaults to `~/.td.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Save after every change instead of only on quit.
    #[serde(default)]
    pub autosave: bool,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub keymap: KeymapConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Read `path`, or the default config file when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::config_path) else {
            return Ok(Self::default());
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    #[cfg(test)]
    pub fn save(&self, path: Option<&Path>) -> anyhow::Result<()> {
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::config_path) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(self)?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    pub fn default_log_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.data_dir().join("td.log"))
    }

    /// Repository settings with the data file resolved.
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            kind: self.storage.kind,
            file_path: self
                .data_file
                .clone()
                .unwrap_or_else(storage::default_data_file),
            integrity: self.storage.integrity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub kind: StorageKind,
    /// Write the checksummed file format.
    #[serde(default)]
    pub integrity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoConfig {
    #[serde(default = "default_undo_size")]
    pub max_size: usize,
}

fn default_undo_size() -> usize {
    td_core::DEFAULT_MAX_UNDO_SIZE
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_size: default_undo_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub primary_color: String,
    pub high_priority_color: String,
    pub medium_priority_color: String,
    pub low_priority_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary_color: "#FF75B7".to_string(),
            high_priority_color: "#FF0000".to_string(),
            medium_priority_color: "#FFFF00".to_string(),
            low_priority_color: "#00FF00".to_string(),
        }
    }
}

impl ThemeConfig {
    pub fn primary(&self) -> Color {
        hex_color(&self.primary_color).unwrap_or(Color::Rgb(0xFF, 0x75, 0xB7))
    }

    pub fn high(&self) -> Color {
        hex_color(&self.high_priority_color).unwrap_or(Color::Red)
    }

    pub fn medium(&self) -> Color {
        hex_color(&self.medium_priority_color).unwrap_or(Color::Yellow)
    }

    pub fn low(&self) -> Color {
        hex_color(&self.low_priority_color).unwrap_or(Color::Green)
    }
}

/// Parse `#RRGGBB`.
fn hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Key notations per command; see [`crate::keymap::parse_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeymapConfig {
    pub add: String,
    pub delete: String,
    pub edit: String,
    pub enter: String,
    pub escape: String,
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub list_type: String,
    pub help: String,
    pub quit: String,
    pub priority: String,
    pub filter: String,
    pub undo: String,
    pub redo: String,
    pub clear_completed: String,
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            add: "a".to_string(),
            delete: "d".to_string(),
            edit: "e".to_string(),
            enter: "enter".to_string(),
            escape: "esc".to_string(),
            up: "up".to_string(),
            down: "down".to_string(),
            left: "left".to_string(),
            right: "right".to_string(),
            list_type: "t".to_string(),
            help: "?".to_string(),
            quit: "q".to_string(),
            priority: "p".to_string(),
            filter: "f".to_string(),
            undo: "ctrl+u".to_string(),
            redo: "ctrl+r".to_string(),
            clear_completed: "C".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive; `TD_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.autosave);
        assert_eq!(config.undo.max_size, 100);
        assert_eq!(config.keymap.undo, "ctrl+u");
        assert_eq!(config.theme.primary(), Color::Rgb(0xFF, 0x75, 0xB7));
        assert!(config
            .storage_config()
            .file_path
            .ends_with(storage::DEFAULT_DATA_FILE_NAME));
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_file = "/tmp/tasks.json"

            [storage]
            kind = "memory"

            [keymap]
            add = "x"
            "#,
        )
        .unwrap();
        assert_eq!(config.keymap.add, "x");
        assert_eq!(config.keymap.delete, "d");
        assert_eq!(config.storage.kind, StorageKind::Memory);
        assert_eq!(config.undo.max_size, 100);
        assert_eq!(config.log.level, "info");
        assert_eq!(
            config.storage_config().file_path,
            PathBuf::from("/tmp/tasks.json")
        );
    }

    #[test]
    fn test_unknown_storage_kind_rejected() {
        let result: Result<Config, _> = toml::from_str("[storage]\nkind = \"sqlite\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.data_file = Some(dir.path().join("tasks.json"));
        config.theme.primary_color = "#ABCDEF".to_string();
        config.keymap.add = "x".to_string();
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.theme.primary(), Color::Rgb(0xAB, 0xCD, 0xEF));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(Config::load(Some(&missing)).unwrap(), Config::default());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "autosave = [").unwrap();
        assert!(Config::load(Some(&bad)).is_err());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#00FF00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(hex_color("ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(hex_color("#FFF"), None);
        assert_eq!(hex_color("#GGGGGG"), None);
        let theme = ThemeConfig {
            high_priority_color: "nope".to_string(),
            ..ThemeConfig::default()
        };
        assert_eq!(theme.high(), Color::Red);
    }
}
