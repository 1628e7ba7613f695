//! Client config load/save for `~/.backchannel/config.yaml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientSettings, DEFAULT_CHAT_CONTEXT, DEFAULT_TIMEOUT};
use crate::reveal::DEFAULT_TICK;

/// Endpoints section (search_url, chat_url, timeout_secs, legacy_search_payload).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EndpointsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub legacy_search_payload: bool,
}

/// Chat section (system preamble sent as `context`).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Reveal section (tick between revealed characters).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RevealSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: EndpointsSection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub reveal: RevealSection,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        self.endpoints
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn reveal_tick(&self) -> Duration {
        self.reveal
            .tick_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK)
    }

    /// Build client settings. Both endpoint URLs must be present.
    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        let search_url = self
            .endpoints
            .search_url
            .clone()
            .ok_or(ConfigError::Missing("endpoints.search_url"))?;
        let chat_url = self
            .endpoints
            .chat_url
            .clone()
            .ok_or(ConfigError::Missing("endpoints.chat_url"))?;
        Ok(ClientSettings::new(search_url, chat_url)
            .with_timeout(self.timeout())
            .with_legacy_search_payload(self.endpoints.legacy_search_payload)
            .with_chat_context(
                self.chat
                    .context
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CHAT_CONTEXT.to_string()),
            ))
    }
}

/// Returns the default config file path: `~/.backchannel/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".backchannel").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}
