//! Path helpers for remote SFTP paths and local download destinations
//!
//! Remote SFTP paths always use `/` as separator (per SFTP protocol), even
//! when the server runs on Windows.

use std::path::{Path, PathBuf};

use super::types::constants::PARTIAL_SUFFIX;

/// Check if a remote SFTP path is absolute.
pub fn is_absolute_remote_path(path: &str) -> bool {
    path.starts_with('/')
}

/// Join remote SFTP path components using `/` separator.
pub fn join_remote_path(base: &str, component: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, component)
    } else {
        format!("{}/{}", base, component)
    }
}

/// Local destination for `filename` inside `dir`.
///
/// Only the final path component of `filename` is used, so a remote name
/// can never escape the chosen directory. `None` when there is no final
/// component (`..`, `/`, empty).
pub fn local_destination(dir: &Path, filename: &str) -> Option<PathBuf> {
    Path::new(filename).file_name().map(|name| dir.join(name))
}

/// Sibling file that receives bytes while a download is in flight.
///
/// `clip.mp4` → `clip.mp4.part`
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
