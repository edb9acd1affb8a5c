//! SSH Client implementation using russh

use std::sync::Arc;
use std::time::Duration;

use russh::client;
use russh::keys::{HashAlg, PublicKey};
use tracing::{debug, info};

use super::config::SshConfig;
use super::error::SshError;
use super::session::SshSession;

/// SSH client for a single password-authenticated connection
pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Connect and authenticate, returning a live session.
    ///
    /// The configured timeout covers name resolution, the handshake and
    /// authentication together.
    pub async fn connect(self) -> Result<SshSession, SshError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let target = self.config.display_name();

        tokio::time::timeout(timeout, self.connect_inner())
            .await
            .map_err(|_| SshError::Timeout(format!("Connection to {} timed out", target)))?
    }

    async fn connect_inner(self) -> Result<SshSession, SshError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!("Connecting to SSH server at {}", addr);

        let socket_addr = tokio::net::lookup_host(&addr)
            .await
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let ssh_config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };

        let handler = ClientHandler::new(self.config.host.clone(), self.config.port);

        let mut handle = client::connect(Arc::new(ssh_config), socket_addr, handler)
            .await
            .map_err(|e| SshError::ConnectionFailed(e.to_string()))?;

        debug!("SSH handshake completed");

        let authenticated = handle
            .authenticate_password(&self.config.username, &self.config.password)
            .await
            .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?;

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful for {}", self.config.username);

        Ok(SshSession::new(handle, self.config.host))
    }
}

/// Client handler for russh callbacks
///
/// Unknown host keys are accepted and their fingerprint logged.
pub struct ClientHandler {
    host: String,
    port: u16,
}

impl ClientHandler {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        info!(
            "Accepting host key for {}:{} (fingerprint: {})",
            self.host,
            self.port,
            server_public_key.fingerprint(HashAlg::Sha256)
        );
        Ok(true)
    }
}
