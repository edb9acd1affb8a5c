//! SFTP data types

use serde::{Deserialize, Serialize};

/// A directory entry as returned by the remote server, unordered and
/// unfiltered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// File name (not full path)
    pub filename: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time (Unix timestamp, protocol-native)
    pub modified: i64,
    /// Directories never make it into a listing
    pub is_dir: bool,
}

impl RemoteEntry {
    pub fn file(filename: impl Into<String>, size: u64, modified: i64) -> Self {
        Self {
            filename: filename.into(),
            size,
            modified,
            is_dir: false,
        }
    }
}

/// Constants for SFTP operations
pub mod constants {
    /// Read buffer for streaming downloads (64 KB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

    /// Suffix of the in-progress download file next to the destination
    pub const PARTIAL_SUFFIX: &str = ".part";

    /// SFTP subsystem name
    pub const SUBSYSTEM: &str = "sftp";
}
