//! SSH Session management

use russh::client::{Handle, Msg};
use russh::{Channel, Disconnect};
use tracing::{debug, info, warn};

use super::client::ClientHandler;
use super::error::SshError;

/// An authenticated SSH connection
///
/// Owns the russh handle. Channels opened from it (the SFTP subsystem)
/// stay valid until [`SshSession::disconnect`] is called or the session is
/// dropped.
pub struct SshSession {
    handle: Handle<ClientHandler>,
    host: String,
}

impl SshSession {
    pub(crate) fn new(handle: Handle<ClientHandler>, host: String) -> Self {
        Self { handle, host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Open a session channel and request `subsystem` on it
    pub async fn open_subsystem(&self, subsystem: &str) -> Result<Channel<Msg>, SshError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SshError::ChannelError(e.to_string()))?;

        channel
            .request_subsystem(true, subsystem)
            .await
            .map_err(|e| {
                SshError::ChannelError(format!("Failed to request {} subsystem: {}", subsystem, e))
            })?;

        debug!("Opened {} subsystem on {}", subsystem, self.host);
        Ok(channel)
    }

    /// Send a disconnect message. Errors are logged, not returned: the peer
    /// may already be gone.
    pub async fn disconnect(&self) {
        if self.handle.is_closed() {
            debug!("SSH connection to {} already closed", self.host);
            return;
        }
        match self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            Ok(()) => info!("Disconnected from {}", self.host),
            Err(e) => warn!("Disconnect from {} reported an error: {}", self.host, e),
        }
    }
}
