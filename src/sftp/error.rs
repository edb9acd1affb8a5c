//! SFTP Error types

use thiserror::Error;

use crate::ssh::SshError;

#[derive(Error, Debug)]
pub enum SftpError {
    #[error("SSH error: {0}")]
    Ssh(#[from] SshError),

    #[error("SFTP subsystem not available: {0}")]
    SubsystemNotAvailable(String),

    #[error("Remote path not found: {0}")]
    PathNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transfer of {path} failed: {reason}")]
    TransferFailed { path: String, reason: String },

    #[error("Delete of {path} failed: {reason}")]
    DeleteFailed { path: String, reason: String },

    #[error("SFTP protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SFTP session is closed")]
    Closed,
}

impl From<russh_sftp::client::error::Error> for SftpError {
    fn from(err: russh_sftp::client::error::Error) -> Self {
        SftpError::ProtocolError(err.to_string())
    }
}

impl serde::Serialize for SftpError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
