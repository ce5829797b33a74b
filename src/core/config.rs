//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seed forest: a JSON file or a directory of markdown files
    pub seed: Option<PathBuf>,
    /// Recently used seeds, most recent first
    pub recent_seeds: Vec<PathBuf>,
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Persistence bridge settings
    pub bridge: BridgeConfig,
    /// Preview settings
    pub preview: PreviewConfig,
}

/// Settings for the simulated persistence bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Simulated save latency in milliseconds
    pub save_delay_ms: u64,
    /// Simulated export latency in milliseconds
    pub export_delay_ms: u64,
    /// Simulated publish latency in milliseconds
    pub publish_delay_ms: u64,
    /// Make every publish report a failure
    pub fail_publish: bool,
}

/// Preview settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Hide YAML front matter in the rendered preview
    pub strip_frontmatter: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: 800,
            export_delay_ms: 1200,
            publish_delay_ms: 1500,
            fail_publish: false,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            strip_frontmatter: true,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "docuhub", "DocuHub")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Add a seed to recent seeds
    pub fn add_recent_seed(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_seeds.retain(|p| p != &path);
        // Add to front
        self.recent_seeds.insert(0, path);
        // Keep only last 10
        self.recent_seeds.truncate(10);
    }

    /// Log level, falling back to `info` when unset
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }
}
