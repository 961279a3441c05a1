use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chat::DEFAULT_CHAT_MODEL;
use super::endpoints::{
    DEFAULT_AVATAR_HOST, DEFAULT_CHAT_COMPLETION_URL, DEFAULT_GENERATE_HOST, DEFAULT_PAGE_SIZE,
    DEFAULT_PROJECT_HOST, MAX_PAGE_SIZE, ServiceHosts,
};
use crate::platform::{NativePlatform, Platform};

pub const CONFIG_ENV: &str = "PIPIO_STUDIO_CONFIG";

const SECRET_HINTS: &[&str] = &["key", "token", "secret", "password", "credential"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostsConfig {
    pub avatar: String,
    pub generate: String,
    pub project: String,
    pub chat_completion: String,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            avatar: DEFAULT_AVATAR_HOST.to_string(),
            generate: DEFAULT_GENERATE_HOST.to_string(),
            project: DEFAULT_PROJECT_HOST.to_string(),
            chat_completion: DEFAULT_CHAT_COMPLETION_URL.to_string(),
        }
    }
}

/// Startup settings. Credentials never live here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    pub hosts: HostsConfig,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub chat_model: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            hosts: HostsConfig::default(),
            timeout_secs: 30,
            page_size: DEFAULT_PAGE_SIZE,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

/// Validated settings a session is built from.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub hosts: ServiceHosts,
    pub timeout: Duration,
    pub page_size: u32,
    pub chat_model: String,
}

impl StudioConfig {
    /// Explicit path, then `PIPIO_STUDIO_CONFIG`, then the per-user config file.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV)
            && !env_path.trim().is_empty()
        {
            return PathBuf::from(env_path);
        }
        NativePlatform::config_dir().join("config.toml")
    }

    /// Load from `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(raw).context("Config is not valid TOML")?;
        if let Some(key) = find_secret_key(&table) {
            bail!(
                "Config must not hold credentials ('{}'). Use PIPIO_API_KEY / OPENAI_API_KEY or the prompt instead.",
                key
            );
        }
        let config: StudioConfig = toml::from_str(raw).context("Unexpected config shape")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            bail!("page_size must be between 1 and {}", MAX_PAGE_SIZE);
        }
        if self.chat_model.trim().is_empty() {
            bail!("chat_model must not be empty");
        }
        Ok(())
    }

    pub fn session_settings(&self) -> Result<SessionSettings> {
        self.validate()?;
        let hosts = ServiceHosts::parse(
            &self.hosts.avatar,
            &self.hosts.generate,
            &self.hosts.project,
            &self.hosts.chat_completion,
        )?;
        Ok(SessionSettings {
            hosts,
            timeout: Duration::from_secs(self.timeout_secs),
            page_size: self.page_size,
            chat_model: self.chat_model.trim().to_string(),
        })
    }
}

fn find_secret_key(table: &toml::Table) -> Option<String> {
    for (key, value) in table {
        let lowered = key.to_ascii_lowercase();
        if SECRET_HINTS.iter().any(|hint| lowered.contains(hint)) {
            return Some(key.clone());
        }
        if let toml::Value::Table(inner) = value
            && let Some(nested) = find_secret_key(inner)
        {
            return Some(format!("{}.{}", key, nested));
        }
    }
    None
}
