//! Persistent settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use talentdesk_core::InboxConfig;

/// Environment variable that overrides [`Settings::api_base_url`].
pub const API_URL_ENV: &str = "TALENTDESK_API_URL";

/// Settings that persist across runs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL.
    pub api_base_url: String,
    /// Seconds between classification refreshes of a watched thread.
    pub classification_refresh_secs: u64,
    /// Seconds between background inbox refetches; 0 disables them.
    pub inbox_refetch_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001".to_string(),
            classification_refresh_secs: 45,
            inbox_refetch_secs: 60,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// `<config dir>/talentdesk/settings.json`.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("talentdesk")
            .join("settings.json")
    }

    /// Loads settings from the default path and applies the environment
    /// override.
    pub async fn load() -> anyhow::Result<Self> {
        let settings = Self::load_from(&Self::path()).await?;
        Ok(settings.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Loads settings from `path`; a missing file yields the defaults.
    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Writes settings to `path`, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Replaces the base URL with `value` when it is set and not blank.
    #[must_use]
    pub fn with_api_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        self
    }

    /// Pipeline intervals.
    pub const fn inbox_config(&self) -> InboxConfig {
        InboxConfig::from_secs(self.classification_refresh_secs, self.inbox_refetch_secs)
    }

    /// Per-request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
