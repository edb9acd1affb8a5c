//! Bulk job data types

use std::path::PathBuf;

use serde::Serialize;

/// What a bulk job does to each file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkKind {
    /// Download every file into `local_dir`, keeping remote filenames
    Download { local_dir: PathBuf },
    /// Delete every file from the remote directory
    Delete,
}

impl BulkKind {
    pub fn verb(&self) -> &'static str {
        match self {
            BulkKind::Download { .. } => "download",
            BulkKind::Delete => "delete",
        }
    }
}

/// A batch operation over a fixed snapshot of filenames
#[derive(Debug, Clone)]
pub struct BulkJob {
    pub id: String,
    pub kind: BulkKind,
    pub filenames: Vec<String>,
}

impl BulkJob {
    pub fn new(kind: BulkKind, filenames: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            filenames,
        }
    }

    pub fn download(filenames: Vec<String>, local_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            BulkKind::Download {
                local_dir: local_dir.into(),
            },
            filenames,
        )
    }

    pub fn delete(filenames: Vec<String>) -> Self {
        Self::new(BulkKind::Delete, filenames)
    }

    pub fn total(&self) -> usize {
        self.filenames.len()
    }
}

/// Result of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum ItemOutcome {
    Succeeded,
    Failed(String),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded)
    }
}

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub filename: String,
    pub error: String,
}

/// Final tally of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub job_id: String,
    /// Items in the job
    pub total: usize,
    /// Items an operation was issued for
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Stopped early by a cancellation request
    pub cancelled: bool,
    /// Failed filenames with their error, in processing order
    pub failures: Vec<FailedItem>,
}

impl BulkReport {
    pub(crate) fn new(job: &BulkJob) -> Self {
        Self {
            job_id: job.id.clone(),
            total: job.total(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
            cancelled: false,
            failures: Vec::new(),
        }
    }

    /// Items never attempted because of cancellation
    pub fn skipped(&self) -> usize {
        self.total - self.attempted
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }

    pub fn failed_filenames(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.filename.as_str()).collect()
    }
}

/// Events streamed to the caller, in the order operations run.
///
/// `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkEvent {
    /// About to process an item
    Started {
        index: usize,
        total: usize,
        filename: String,
    },
    /// An item finished
    Progress {
        index: usize,
        total: usize,
        filename: String,
        outcome: ItemOutcome,
    },
    /// The job is over; always the last event
    Completed(BulkReport),
}
