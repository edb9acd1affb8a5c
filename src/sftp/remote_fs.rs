//! Transport seam between the engine and the remote filesystem.
//!
//! The controller and the bulk executor only ever talk to a
//! `Box<dyn RemoteFs>`; [`SftpConnector`](super::SftpConnector) produces the
//! real SFTP-backed one.

use std::path::Path;

use async_trait::async_trait;

use super::error::SftpError;
use super::types::RemoteEntry;
use crate::ssh::SshConfig;

/// Operations the engine needs from a remote file session.
///
/// Implementations are single-operation-at-a-time; callers serialize access.
#[async_trait]
pub trait RemoteFs: Send {
    /// Bind the working directory. Fails with [`SftpError::PathNotFound`]
    /// when `path` does not exist or is not a directory. Returns the
    /// canonical path.
    async fn change_dir(&mut self, path: &str) -> Result<String, SftpError>;

    /// Entries of the working directory, in server order.
    async fn list(&mut self) -> Result<Vec<RemoteEntry>, SftpError>;

    /// Download `filename` from the working directory to `destination`.
    ///
    /// Bytes go to the `.part` sibling first and are renamed into place only
    /// after the last byte is written. On failure the `.part` file may be
    /// left behind. Returns the number of bytes written.
    async fn fetch(&mut self, filename: &str, destination: &Path) -> Result<u64, SftpError>;

    /// Remove `filename` from the working directory.
    async fn remove(&mut self, filename: &str) -> Result<(), SftpError>;

    /// Release the session. Idempotent.
    async fn close(&mut self);
}

/// Opens authenticated sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn RemoteFs>, SftpError>;
}
