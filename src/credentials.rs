//! Where the personal access token lives.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait CredentialStore: Send + Sync {
    fn token(&self) -> ConfigResult<Option<String>>;

    /// `None`, or a token that trims to nothing, removes the stored token.
    fn set_token(&self, token: Option<String>) -> ConfigResult<()>;
}

fn normalise(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[derive(Serialize, Deserialize, Default)]
struct CredentialsFile {
    token: Option<String>,
}

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> ConfigResult<Self> {
        Ok(Self::new(
            crate::config::BrowserConfig::config_dir()?.join("credentials.json"),
        ))
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> ConfigResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let file: CredentialsFile = serde_json::from_str(&contents)?;
        Ok(normalise(file.token))
    }

    fn set_token(&self, token: Option<String>) -> ConfigResult<()> {
        let Some(token) = normalise(token) else {
            if self.path.exists() {
                fs::remove_file(&self.path).map_err(|e| self.io_error(e))?;
            }
            return Ok(());
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let contents = serde_json::to_string_pretty(&CredentialsFile { token: Some(token) })?;
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> ConfigResult<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn set_token(&self, token: Option<String>) -> ConfigResult<()> {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = normalise(token);
        Ok(())
    }
}
