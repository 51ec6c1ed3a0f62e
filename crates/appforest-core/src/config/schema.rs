//! Configuration schema for appforest.toml

use serde::{Deserialize, Serialize};
use url::Url;

/// Default MBean of the application service exposed over Jolokia.
pub const DEFAULT_MBEAN: &str =
    "org.codice.ddf.admin.application.service.ApplicationService:service=application-service";

/// Root configuration structure for appforest.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppForestConfig {
    /// Remote control surface settings
    #[serde(default)]
    pub control: ControlConfig,
}

/// Where and how to reach the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Base URL the `/jolokia/...` paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// MBean hosting `startApplication`, `stopApplication` and `ApplicationTree`
    #[serde(default = "default_mbean")]
    pub mbean: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://localhost:8993".to_string()
}

fn default_mbean() -> String {
    DEFAULT_MBEAN.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mbean: default_mbean(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ControlConfig {
    /// Parsed base URL.
    pub fn url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid base_url '{}': {}", self.base_url, e))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.url()?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "Invalid base_url '{}': scheme must be http or https",
                self.base_url
            );
        }
        if self.mbean.trim().is_empty() {
            anyhow::bail!("mbean must not be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

impl AppForestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        use anyhow::Context;

        self.control
            .validate()
            .context("Invalid [control] configuration")
    }
}
