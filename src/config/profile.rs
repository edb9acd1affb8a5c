//! Connection profile

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ssh::{default_port, default_timeout, SshConfig};

/// Placeholder shown until a real address is configured
pub const DEFAULT_HOST: &str = "192.168.1.X";
pub const DEFAULT_USER: &str = "pi";
pub const DEFAULT_PATH: &str = "/home/pi/motion_videos";

/// Where and how to connect. Every key is optional in the file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProfile {
    pub host: String,
    pub user: String,
    pub password: String,
    /// Remote directory holding the recordings
    pub path: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl ConnectionProfile {
    /// True while `host` is still the placeholder (or blank)
    pub fn has_placeholder_host(&self) -> bool {
        let host = self.host.trim();
        host.is_empty() || host == DEFAULT_HOST
    }

    pub fn ssh_config(&self) -> SshConfig {
        SshConfig {
            host: self.host.trim().to_string(),
            port: self.port,
            username: self.user.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Apply `PIMOTION_HOST`, `PIMOTION_USER`, `PIMOTION_PASSWORD` and
    /// `PIMOTION_PATH` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup("PIMOTION_HOST") {
            self.host = host;
        }
        if let Some(user) = lookup("PIMOTION_USER") {
            self.user = user;
        }
        if let Some(password) = lookup("PIMOTION_PASSWORD") {
            self.password = password;
        }
        if let Some(path) = lookup("PIMOTION_PATH") {
            self.path = path;
        }
        self
    }
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            user: DEFAULT_USER.to_string(),
            password: String::new(),
            path: DEFAULT_PATH.to_string(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("path", &self.path)
            .field("port", &self.port)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
