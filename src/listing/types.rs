//! Listing data types

use chrono::NaiveDateTime;
use serde::Serialize;

use super::decode::{display_label, parse_captured_at};
use crate::sftp::RemoteEntry;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A media file in the remote directory.
///
/// Immutable once built; a refresh builds new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFile {
    /// Unique within a listing
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified time (Unix timestamp)
    pub modified: i64,
    /// Time decoded from the filename, when it follows the capture pattern
    pub captured_at: Option<NaiveDateTime>,
}

impl RemoteFile {
    pub fn from_entry(entry: RemoteEntry) -> Self {
        let captured_at = parse_captured_at(&entry.filename);
        Self {
            filename: entry.filename,
            size: entry.size,
            modified: entry.modified,
            captured_at,
        }
    }

    pub fn display_label(&self) -> String {
        display_label(&self.filename, self.captured_at.as_ref())
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MB
    }

    /// Size with two decimals, e.g. `12.50 MB`
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_mb())
    }
}

/// Ordered view of the remote media files, newest first.
///
/// Built only by [`build_listing`](super::build_listing), which guarantees
/// the order and filename uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileListing {
    files: Vec<RemoteFile>,
}

impl FileListing {
    pub(crate) fn from_sorted(files: Vec<RemoteFile>) -> Self {
        Self { files }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RemoteFile> {
        self.files.iter()
    }

    pub fn get(&self, filename: &str) -> Option<&RemoteFile> {
        self.files.iter().find(|f| f.filename == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    /// Filenames in display order, the usual snapshot for a bulk job
    pub fn filenames(&self) -> Vec<String> {
        self.files.iter().map(|f| f.filename.clone()).collect()
    }

    /// Copy of this listing without `filename`, or `None` if it is absent
    pub fn without(&self, filename: &str) -> Option<Self> {
        let idx = self.files.iter().position(|f| f.filename == filename)?;
        let mut files = self.files.clone();
        files.remove(idx);
        Some(Self { files })
    }
}

impl<'a> IntoIterator for &'a FileListing {
    type Item = &'a RemoteFile;
    type IntoIter = std::slice::Iter<'a, RemoteFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_label_two_decimals() {
        let file = RemoteFile::from_entry(RemoteEntry::file("a.mp4", 5 * 1024 * 1024 + 524_288, 0));
        assert_eq!(file.size_label(), "5.50 MB");

        let tiny = RemoteFile::from_entry(RemoteEntry::file("b.mp4", 1, 0));
        assert_eq!(tiny.size_label(), "0.00 MB");

        let rounded = RemoteFile::from_entry(RemoteEntry::file("c.mp4", 1_048_576 * 3 - 1, 0));
        assert_eq!(rounded.size_label(), "3.00 MB");
    }

    #[test]
    fn test_without_removes_single_entry() {
        let listing = FileListing::from_sorted(vec![
            RemoteFile::from_entry(RemoteEntry::file("a.mp4", 1, 2)),
            RemoteFile::from_entry(RemoteEntry::file("b.mp4", 1, 1)),
        ]);
        let next = listing.without("a.mp4").unwrap();
        assert_eq!(next.filenames(), vec!["b.mp4"]);
        assert_eq!(listing.len(), 2);
        assert!(listing.without("missing.mp4").is_none());
    }
}
