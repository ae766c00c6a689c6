use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::models::ListingMode;

pub const DEFAULT_CONFIG_FILE: &str = "courseboard.toml";

/// Settings read from `courseboard.toml`, then overridden by environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub base_url: String,
    pub listing_mode: ListingMode,
    pub feed_path: String,
    /// Team membership CSV endpoint; roster commands need it.
    pub team_membership_path: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            listing_mode: ListingMode::Status,
            feed_path: "/api/moochub/v1/moochubinfo/".to_string(),
            team_membership_path: None,
            request_timeout_secs: 30,
        }
    }
}

impl BoardConfig {
    /// Loads the given file, or `courseboard.toml` when present, or defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let candidate: Option<PathBuf> = match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let mut config = match candidate {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(base_url) = lookup("COURSEBOARD_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(mode) = lookup("COURSEBOARD_LISTING_MODE") {
            self.listing_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "status" => ListingMode::Status,
                "quarter" => ListingMode::Quarter,
                other => anyhow::bail!("COURSEBOARD_LISTING_MODE must be status or quarter, got {other}"),
            };
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<url::Url> {
        let base = url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {}", self.base_url))?;
        base.join(path)
            .with_context(|| format!("cannot join {path} onto {}", self.base_url))
    }
}
