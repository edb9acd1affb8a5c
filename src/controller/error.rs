//! Controller error types

use thiserror::Error;

use crate::sftp::SftpError;

#[derive(Error, Debug)]
pub enum ControllerError {
    /// Authentication, network or timeout failure while connecting
    #[error("Connection failed: {0}")]
    Connection(SftpError),

    /// The configured working directory does not exist on the server
    #[error("Remote path not found: {0}")]
    PathNotFound(String),

    /// Rejected because another operation owns the session
    #[error("Busy: {0}")]
    Busy(String),

    #[error("Not connected")]
    NotConnected,

    #[error("{0}")]
    Transfer(SftpError),

    #[error("{0}")]
    Delete(SftpError),

    #[error("Listing failed: {0}")]
    Listing(SftpError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ControllerError {
    pub(crate) fn session_in_use() -> Self {
        ControllerError::Busy("another operation is using the session".to_string())
    }
}

impl serde::Serialize for ControllerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
