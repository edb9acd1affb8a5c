//! SFTP transport
//!
//! Remote directory listing, download and delete over an SSH connection.

pub mod error;
pub mod path_utils;
pub mod remote_fs;
pub mod session;
pub mod types;

pub use error::SftpError;
pub use remote_fs::{Connector, RemoteFs};
pub use session::{SftpConnector, SftpSession};
pub use types::*;
