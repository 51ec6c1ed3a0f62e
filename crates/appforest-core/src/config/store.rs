//! Config store for loading and saving appforest.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{AppForestConfig, parser};

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "appforest.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `<config_dir>/appforest/appforest.toml`.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("appforest");
        Ok(Self::from_dir(&global_dir))
    }

    pub fn from_dir(dir: &Path) -> Self {
        Self::from_path(dir.join(CONFIG_FILE_NAME))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration, falling back to defaults when the file is absent.
    pub fn load(&self) -> anyhow::Result<AppForestConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "config file not found, using defaults");
            return Ok(AppForestConfig::new());
        }
        parser::parse_config_toml(&self.config_path)
    }

    pub fn save(&self, config: &AppForestConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
