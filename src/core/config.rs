//! Application configuration management

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const MAX_RECENT_DIRECTORIES: usize = 10;
const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Last opened content directory
    pub last_directory: Option<PathBuf>,
    /// Recently opened directories, newest first
    pub recent_directories: Vec<PathBuf>,
    pub bulk_edit: BulkEditConfig,
    pub backup: BackupConfig,
    pub ui: UiConfig,
}

/// Defaults for the bulk edit panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkEditConfig {
    /// Pattern pre-filled in the path filter
    pub default_pattern: String,
}

/// Backup archive settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Gzip level, 0 (store) to 9 (smallest)
    pub compression_level: u32,
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Sidebar width
    pub sidebar_width: f32,
    /// List documents with unsaved changes above the tree
    pub show_unsaved_list: bool,
}

impl Default for BulkEditConfig {
    fn default() -> Self {
        Self {
            default_pattern: ".*".to_string(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sidebar_width: 260.0,
            show_unsaved_list: true,
        }
    }
}

impl BackupConfig {
    /// Compression level clamped to the supported range
    pub fn level(&self) -> u32 {
        self.compression_level.min(MAX_COMPRESSION_LEVEL)
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "frontmatter-studio", "Frontmatter Studio")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Record a directory as the most recently opened one
    pub fn add_recent_directory(&mut self, path: PathBuf) {
        self.recent_directories.retain(|p| p != &path);
        self.recent_directories.insert(0, path.clone());
        self.recent_directories.truncate(MAX_RECENT_DIRECTORIES);
        self.last_directory = Some(path);
    }
}
