//! Configuration Storage
//!
//! Reads the connection profile from disk.
//! Lookup order: `./connection.json`, then `~/.pimotion/connection.json`
//! (`%APPDATA%\pimotion\connection.json` on Windows).

use std::path::{Path, PathBuf};

use tokio::fs;

use super::profile::ConnectionProfile;

pub const CONFIG_FILE_NAME: &str = "connection.json";

/// Configuration storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Get the pimotion configuration directory
pub fn config_dir() -> Result<PathBuf, StorageError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("pimotion"));
        }
        dirs::home_dir()
            .map(|home| home.join(".pimotion"))
            .ok_or(StorageError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".pimotion"))
            .ok_or(StorageError::NoConfigDir)
    }
}

/// `./connection.json` if present, else the one in [`config_dir`]
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

/// Reader for the connection profile file
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Storage at [`default_config_path`]
    pub fn new() -> Self {
        Self {
            path: default_config_path(),
        }
    }

    /// Create storage with custom path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile, never failing.
    ///
    /// A missing file yields defaults silently; an unreadable or malformed
    /// one yields defaults with a warning.
    pub async fn load(&self) -> ConnectionProfile {
        match self.try_load().await {
            Ok(profile) => profile,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", self.path);
                ConnectionProfile::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring config {:?}: {}", self.path, e);
                ConnectionProfile::default()
            }
        }
    }

    /// Load the profile, reporting any problem
    pub async fn try_load(&self) -> Result<ConnectionProfile, StorageError> {
        let contents = fs::read_to_string(&self.path).await?;
        let profile = serde_json::from_str::<ConnectionProfile>(&contents)?;
        tracing::info!("Loaded connection profile from {:?}", self.path);
        Ok(profile)
    }
}

impl Default for ConfigStorage {
    fn default() -> Self {
        Self::new()
    }
}
