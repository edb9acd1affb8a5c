//! SSH Configuration

use std::fmt;

use serde::{Deserialize, Serialize};

/// SSH connection configuration
///
/// Only password authentication is supported.
#[derive(Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote host address
    pub host: String,

    /// SSH port (default: 22)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    #[serde(default)]
    pub password: String,

    /// Connection timeout in seconds, covering resolve + handshake + auth
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SshConfig {
    pub fn with_password(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            timeout_secs: default_timeout(),
        }
    }

    /// `user@host:port`, used in log lines and status messages
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

// Keep the password out of logs
impl fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub(crate) fn default_port() -> u16 {
    22
}

pub(crate) fn default_timeout() -> u64 {
    5
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let config = SshConfig::with_password("pi.local", 22, "pi", "hunter2");
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("pi.local"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: SshConfig =
            serde_json::from_str(r#"{"host": "10.0.0.2", "username": "pi"}"#).unwrap();
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout_secs, 5);
        assert!(config.password.is_empty());
        assert_eq!(config.display_name(), "pi@10.0.0.2:22");
    }
}
