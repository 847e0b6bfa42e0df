//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use wl_core::{DayBoundary, SyncSettings, offset_from_minutes};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed UTC offset, in minutes, for day windows and worklog start times.
    pub timezone_offset_minutes: i32,
    /// Where each day window ends.
    pub day_boundary: DayBoundary,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    pub scrin: ScrinConfig,
    pub jira: JiraConfig,
}

/// ScreenshotMonitor settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrinConfig {
    pub token: Option<String>,
    pub base_url: String,
}

/// Jira settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub email: Option<String>,
    pub api_token: Option<String>,
    /// Site root, e.g. `https://example.atlassian.net`.
    pub base_url: Option<String>,
}

/// Jira credentials once every required key is present.
#[derive(Clone, Copy)]
pub struct JiraCredentials<'a> {
    pub email: &'a str,
    pub api_token: &'a str,
    pub base_url: &'a str,
}

impl fmt::Debug for JiraCredentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("timezone_offset_minutes", &self.timezone_offset_minutes)
            .field("day_boundary", &self.day_boundary)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("scrin.token", &redacted(self.scrin.token.as_ref()))
            .field("scrin.base_url", &self.scrin.base_url)
            .field("jira.email", &self.jira.email)
            .field("jira.api_token", &redacted(self.jira.api_token.as_ref()))
            .field("jira.base_url", &self.jira.base_url)
            .finish()
    }
}

const fn redacted(secret: Option<&String>) -> Option<&'static str> {
    match secret {
        Some(_) => Some("[REDACTED]"),
        None => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: 0,
            day_boundary: DayBoundary::default(),
            http_timeout_secs: wl_jira::DEFAULT_TIMEOUT.as_secs(),
            scrin: ScrinConfig::default(),
            jira: JiraConfig::default(),
        }
    }
}

impl Default for ScrinConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: wl_scrin::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WL_*, nested keys split on "__")
        figment = figment.merge(Env::prefixed("WL_").split("__"));

        figment.extract()
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        offset_from_minutes(self.timezone_offset_minutes)
            .context("invalid timezone_offset_minutes")
    }

    pub fn sync_settings(&self) -> Result<SyncSettings> {
        Ok(SyncSettings {
            offset: self.offset()?,
            boundary: self.day_boundary,
        })
    }

    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn scrin_token(&self) -> Result<&str> {
        required(self.scrin.token.as_deref(), "scrin.token", "WL_SCRIN__TOKEN")
    }

    pub fn jira_credentials(&self) -> Result<JiraCredentials<'_>> {
        Ok(JiraCredentials {
            email: required(self.jira.email.as_deref(), "jira.email", "WL_JIRA__EMAIL")?,
            api_token: required(
                self.jira.api_token.as_deref(),
                "jira.api_token",
                "WL_JIRA__API_TOKEN",
            )?,
            base_url: required(
                self.jira.base_url.as_deref(),
                "jira.base_url",
                "WL_JIRA__BASE_URL",
            )?,
        })
    }
}

fn required<'a>(value: Option<&'a str>, key: &str, env: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("missing `{key}` in configuration (or set {env})"),
    }
}

/// Returns the platform-specific config directory for wl.
///
/// On Linux: `~/.config/wl`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wl"))
}
