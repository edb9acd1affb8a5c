//! SFTP Session management
//!
//! Provides SFTP file operations over an authenticated SSH connection.

use std::path::Path;

use async_trait::async_trait;
use russh_sftp::client::error::Error as SftpErrorInner;
use russh_sftp::client::SftpSession as RusshSftpSession;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::error::SftpError;
use super::path_utils::{is_absolute_remote_path, join_remote_path, partial_path};
use super::remote_fs::{Connector, RemoteFs};
use super::types::{constants, RemoteEntry};
use crate::ssh::{SshClient, SshConfig, SshSession};

/// SFTP Session wrapper
///
/// Owns both the SFTP channel and the SSH connection underneath it, so
/// closing one closes the other.
pub struct SftpSession {
    sftp: Option<RusshSftpSession>,
    ssh: Option<SshSession>,
    /// Current working directory
    cwd: String,
}

impl SftpSession {
    /// Open the SFTP subsystem on an authenticated connection
    pub async fn open(ssh: SshSession) -> Result<Self, SftpError> {
        info!("Opening SFTP subsystem on {}", ssh.host());

        let channel = ssh.open_subsystem(constants::SUBSYSTEM).await?;

        let sftp = RusshSftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SftpError::SubsystemNotAvailable(e.to_string()))?;

        let cwd = sftp
            .canonicalize(".")
            .await
            .map_err(|e| SftpError::ProtocolError(e.to_string()))?;

        info!("SFTP subsystem opened, initial cwd: {}", cwd);

        Ok(Self {
            sftp: Some(sftp),
            ssh: Some(ssh),
            cwd,
        })
    }

    fn sftp(&self) -> Result<&RusshSftpSession, SftpError> {
        self.sftp.as_ref().ok_or(SftpError::Closed)
    }

    fn resolve(&self, path: &str) -> String {
        if is_absolute_remote_path(path) {
            path.to_string()
        } else {
            join_remote_path(&self.cwd, path)
        }
    }

    /// Map SFTP errors to our error type
    fn map_sftp_error(&self, err: SftpErrorInner, path: &str) -> SftpError {
        let err_str = err.to_string();
        if err_str.contains("No such file") || err_str.contains("not found") {
            SftpError::FileNotFound(path.to_string())
        } else if err_str.contains("Permission denied") {
            SftpError::PermissionDenied(path.to_string())
        } else {
            SftpError::ProtocolError(err_str)
        }
    }

    async fn fetch_inner(
        &self,
        remote_path: &str,
        partial: &Path,
    ) -> Result<u64, SftpError> {
        let mut remote_file = self
            .sftp()?
            .open(remote_path)
            .await
            .map_err(|e| self.map_sftp_error(e, remote_path))?;

        let mut local_file = tokio::fs::File::create(partial).await?;

        let mut buffer = vec![0u8; constants::DOWNLOAD_CHUNK_SIZE];
        let mut transferred = 0u64;

        loop {
            let bytes_read = remote_file
                .read(&mut buffer)
                .await
                .map_err(|e| SftpError::ProtocolError(e.to_string()))?;

            if bytes_read == 0 {
                break;
            }

            local_file.write_all(&buffer[..bytes_read]).await?;
            transferred += bytes_read as u64;
        }

        local_file.flush().await?;
        local_file.sync_all().await?;

        Ok(transferred)
    }
}

#[async_trait]
impl RemoteFs for SftpSession {
    async fn change_dir(&mut self, path: &str) -> Result<String, SftpError> {
        let target = self.resolve(path);
        let sftp = self.sftp()?;

        let canonical = match sftp.canonicalize(&target).await {
            Ok(p) => p,
            Err(e) => {
                debug!("canonicalize({}) failed: {}", target, e);
                return Err(SftpError::PathNotFound(path.to_string()));
            }
        };

        let is_dir = match sftp.metadata(&canonical).await {
            Ok(metadata) => metadata.is_dir(),
            Err(e) => {
                debug!("stat({}) failed: {}", canonical, e);
                false
            }
        };
        if !is_dir {
            return Err(SftpError::PathNotFound(path.to_string()));
        }

        info!("Working directory set to {}", canonical);
        self.cwd = canonical.clone();
        Ok(canonical)
    }

    async fn list(&mut self) -> Result<Vec<RemoteEntry>, SftpError> {
        debug!("Listing directory: {}", self.cwd);

        let read_dir = self
            .sftp()?
            .read_dir(&self.cwd)
            .await
            .map_err(|e| self.map_sftp_error(e, &self.cwd))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let filename = entry.file_name();
            if filename == "." || filename == ".." {
                continue;
            }

            let metadata = entry.metadata();
            entries.push(RemoteEntry {
                filename,
                size: metadata.size.unwrap_or(0),
                modified: metadata.mtime.map(|t| t as i64).unwrap_or(0),
                is_dir: metadata.is_dir(),
            });
        }

        debug!("Listed {} entries in {}", entries.len(), self.cwd);
        Ok(entries)
    }

    async fn fetch(&mut self, filename: &str, destination: &Path) -> Result<u64, SftpError> {
        let remote_path = self.resolve(filename);
        let partial = partial_path(destination);
        debug!("Downloading {} to {}", remote_path, destination.display());

        let transfer_failed = |reason: String| SftpError::TransferFailed {
            path: remote_path.clone(),
            reason,
        };

        let transferred = self
            .fetch_inner(&remote_path, &partial)
            .await
            .map_err(|e| transfer_failed(e.to_string()))?;

        tokio::fs::rename(&partial, destination)
            .await
            .map_err(|e| transfer_failed(e.to_string()))?;

        info!("Download complete: {} ({} bytes)", remote_path, transferred);
        Ok(transferred)
    }

    async fn remove(&mut self, filename: &str) -> Result<(), SftpError> {
        let remote_path = self.resolve(filename);
        debug!("Deleting file: {}", remote_path);

        self.sftp()?
            .remove_file(&remote_path)
            .await
            .map_err(|e| SftpError::DeleteFailed {
                reason: self.map_sftp_error(e, &remote_path).to_string(),
                path: remote_path.clone(),
            })?;

        info!("Deleted {}", remote_path);
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(sftp) = self.sftp.take() {
            if let Err(e) = sftp.close().await {
                debug!("SFTP channel close reported: {}", e);
            }
        }
        if let Some(ssh) = self.ssh.take() {
            ssh.disconnect().await;
        }
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        if self.ssh.is_some() {
            warn!("SftpSession dropped without close(); connection to be torn down by russh");
        }
    }
}

/// Connector producing real SSH + SFTP sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct SftpConnector;

#[async_trait]
impl Connector for SftpConnector {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn RemoteFs>, SftpError> {
        let ssh = SshClient::new(config.clone()).connect().await?;
        let session = SftpSession::open(ssh).await?;
        Ok(Box::new(session))
    }
}
