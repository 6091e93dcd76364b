use crate::error::{ConfigError, ConfigResult};
use crate::github::DEFAULT_API_BASE;
use crate::types::{Query, DEFAULT_ORGANISATION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserConfig {
    pub default_organisation: String,
    pub api_base_url: String,
    pub live_tick_ms: u64,
    pub live_step: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            default_organisation: DEFAULT_ORGANISATION.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            live_tick_ms: 1500,
            live_step: 1,
        }
    }
}

impl BrowserConfig {
    pub fn load() -> ConfigResult<Self> {
        Ok(Self::load_from(&Self::config_path()?))
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring unreadable config: {}", e);
            Self::default()
        })
    }

    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("orgstars"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// The configured default, or `swiftlang` if it trims to nothing.
    pub fn default_query(&self) -> Query {
        Query::parse(&self.default_organisation).unwrap_or_default()
    }

    pub fn live_tick(&self) -> Duration {
        Duration::from_millis(self.live_tick_ms.max(10))
    }
}
