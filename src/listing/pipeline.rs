//! Raw directory entries → ordered, filtered [`FileListing`]

use std::collections::HashSet;

use super::types::{FileListing, RemoteFile};
use crate::sftp::RemoteEntry;

/// Extensions eligible for listing, matched case-insensitively
pub const MEDIA_EXTENSIONS: [&str; 5] = [".mp4", ".avi", ".mkv", ".h264", ".mov"];

/// Check if `filename` ends with one of [`MEDIA_EXTENSIONS`]
pub fn is_media_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Build a listing from unordered server entries.
///
/// 1. keep regular media files,
/// 2. sort by modification time, newest first, ties by filename,
/// 3. decode capture timestamps (never fails; bad names keep their raw label).
///
/// A filename seen twice keeps its first position in sorted order.
pub fn build_listing(entries: Vec<RemoteEntry>) -> FileListing {
    let mut kept: Vec<RemoteEntry> = entries
        .into_iter()
        .filter(|e| !e.is_dir && is_media_file(&e.filename))
        .collect();

    kept.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    let mut seen = HashSet::with_capacity(kept.len());
    kept.retain(|e| seen.insert(e.filename.clone()));

    FileListing::from_sorted(kept.into_iter().map(RemoteFile::from_entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, modified: i64) -> RemoteEntry {
        RemoteEntry::file(name, 1024, modified)
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert!(is_media_file("CLIP.MP4"));
        assert!(is_media_file("clip.H264"));
        assert!(is_media_file("a.Mov"));
        assert!(!is_media_file("clip.txt"));
        assert!(!is_media_file("clip.mp4.txt"));
        assert!(!is_media_file("mp4"));
    }

    #[test]
    fn test_filter_drops_non_media_and_directories() {
        let mut dir = entry("archive.mkv", 50);
        dir.is_dir = true;
        let listing = build_listing(vec![
            entry("CLIP.MP4", 10),
            entry("clip.txt", 20),
            entry("notes", 30),
            dir,
            entry("b.avi", 5),
        ]);
        assert_eq!(listing.filenames(), vec!["CLIP.MP4", "b.avi"]);
    }

    #[test]
    fn test_sorted_newest_first() {
        let listing = build_listing(vec![
            entry("old.mp4", 100),
            entry("newest.mov", 300),
            entry("mid.mkv", 200),
            entry("ancient.h264", -5),
        ]);
        assert_eq!(
            listing.filenames(),
            vec!["newest.mov", "mid.mkv", "old.mp4", "ancient.h264"]
        );
        for pair in listing.files().windows(2) {
            assert!(pair[0].modified >= pair[1].modified);
        }
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_name() {
        let forward = build_listing(vec![entry("b.mp4", 7), entry("a.mp4", 7), entry("c.mp4", 7)]);
        let reverse = build_listing(vec![entry("c.mp4", 7), entry("a.mp4", 7), entry("b.mp4", 7)]);
        assert_eq!(forward.filenames(), vec!["a.mp4", "b.mp4", "c.mp4"]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let listing = build_listing(vec![entry("a.mp4", 1), entry("a.mp4", 9)]);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.files()[0].modified, 9);
    }

    #[test]
    fn test_labels_decode_per_entry() {
        let listing = build_listing(vec![
            entry("2024-03-05_14-30-00.mp4", 2),
            entry("random.mp4", 1),
        ]);
        let labels: Vec<String> = listing.iter().map(|f| f.display_label()).collect();
        assert_eq!(labels, vec!["05 Mar 2024 at 02:30:00 PM", "random.mp4"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_listing(Vec::new()).is_empty());
    }
}
