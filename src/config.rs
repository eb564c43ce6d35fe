// Credential handling. The API is accessed with an `APP_ID:APP_KEY` pair
// given directly, read from a file, or stored in the home directory.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const AUTH_FILE_NAME: &str = ".infermedica_auth";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid credentials `{0}`: expected APP_ID:APP_KEY or a file containing it")]
    InvalidCredentials(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_key: String,
}

// Keep the key out of logs and error reports.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"***")
            .finish()
    }
}

impl Credentials {
    /// Parse an `APP_ID:APP_KEY` string.
    pub fn parse(auth: &str) -> Result<Self, ConfigError> {
        match auth.trim().split_once(':') {
            Some((id, key)) if !id.is_empty() && !key.is_empty() => Ok(Credentials {
                app_id: id.to_string(),
                app_key: key.to_string(),
            }),
            _ => Err(ConfigError::InvalidCredentials(auth.to_string())),
        }
    }

    pub fn to_auth_string(&self) -> String {
        format!("{}:{}", self.app_id, self.app_key)
    }
}

/// `~/.infermedica_auth`, or the current directory when there is no home.
pub fn default_auth_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(AUTH_FILE_NAME)
}

fn read_auth_file(path: &Path) -> Option<Credentials> {
    let content = std::fs::read_to_string(path).ok()?;
    debug!(path = %path.display(), "read credentials file");
    Credentials::parse(&content).ok()
}

/// Resolve credentials from a CLI value (the pair itself or a path to a file
/// holding it). With no value the default file is tried.
pub fn resolve_credentials(
    auth_or_path: Option<&str>,
    default_path: &Path,
) -> Result<Credentials, ConfigError> {
    match auth_or_path {
        Some(value) if value.contains(':') => Credentials::parse(value),
        Some(value) => read_auth_file(Path::new(value))
            .ok_or_else(|| ConfigError::InvalidCredentials(value.to_string())),
        None => read_auth_file(default_path)
            .ok_or_else(|| ConfigError::InvalidCredentials(default_path.display().to_string())),
    }
}

/// Store credentials for future runs.
pub fn persist_credentials(credentials: &Credentials, path: &Path) -> Result<()> {
    std::fs::write(path, credentials.to_auth_string())?;
    Ok(())
}
