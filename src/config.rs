//! Inbox configuration.
//!
//! Stored as `ticketdesk.yaml` in the platform config directory. Every field
//! is optional in the file; missing fields fall back to defaults, and a
//! missing file yields [`InboxConfig::default`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{InboxError, Result};
use crate::inbox::window::ViewMode;

pub const CONFIG_FILE: &str = "ticketdesk.yaml";
pub const PAGE_SIZE_ENV: &str = "TICKETDESK_PAGE_SIZE";
pub const PUSH_CHANNEL_ENV: &str = "TICKETDESK_PUSH_CHANNEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Identifiers per page
    pub page_size: usize,
    /// Quiet period before a search keystroke re-runs the pipeline
    pub search_debounce_ms: u64,
    /// Extra rows materialized above and below the viewport
    pub overscan: usize,
    /// Viewport height in pixels
    pub viewport_height: u32,
    pub view_mode: ViewMode,
    /// Logical push channel the realtime layer subscribes to
    pub push_channel: String,
    /// How long a toast stays visible
    pub toast_ttl_ms: u64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        InboxConfig {
            page_size: 25,
            search_debounce_ms: 300,
            overscan: 2,
            viewport_height: 600,
            view_mode: ViewMode::Comfortable,
            push_channel: "tickets".to_string(),
            toast_ttl_ms: 4000,
        }
    }
}

impl InboxConfig {
    /// Default location of the config file, if the platform has a config dir.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "ticketdesk", "ticketdesk")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, or from [`config_path`](Self::config_path) when `None`.
    /// Environment overrides are applied on top, then the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::config_path(),
        };

        let mut config = match path {
            Some(p) if p.exists() => {
                let content = fs::read_to_string(&p)?;
                tracing::debug!(path = %p.display(), "loading config");
                serde_yaml_ng::from_str(&content)?
            }
            _ => InboxConfig::default(),
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment variables win over the file.
    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = env::var(PAGE_SIZE_ENV)
            && !value.is_empty()
        {
            self.page_size = value.trim().parse().map_err(|_| {
                InboxError::Config(format!("{PAGE_SIZE_ENV} must be a positive integer, got '{value}'"))
            })?;
        }

        if let Ok(value) = env::var(PUSH_CHANNEL_ENV)
            && !value.is_empty()
        {
            self.push_channel = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(InboxError::Config("page_size must be at least 1".to_string()));
        }
        if self.push_channel.trim().is_empty() {
            return Err(InboxError::Config("push_channel must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml_ng::to_string(self)?)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}
