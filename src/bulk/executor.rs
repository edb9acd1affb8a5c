//! Sequential bulk executor
//!
//! Runs a [`BulkJob`] one item at a time against a single [`RemoteFs`].
//! One item's failure never stops the rest; failures are counted, logged and
//! listed in the final [`BulkReport`].

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::control::JobControl;
use super::types::{BulkEvent, BulkJob, BulkKind, BulkReport, FailedItem, ItemOutcome};
use crate::listing::ListingStore;
use crate::sftp::path_utils::{local_destination, partial_path};
use crate::sftp::{RemoteFs, SftpError};

/// Executes bulk jobs on a borrowed session
pub struct BulkExecutor<'a> {
    fs: &'a mut dyn RemoteFs,
    listing: Option<&'a ListingStore>,
    discard_partial: bool,
}

impl<'a> BulkExecutor<'a> {
    pub fn new(fs: &'a mut dyn RemoteFs) -> Self {
        Self {
            fs,
            listing: None,
            discard_partial: true,
        }
    }

    /// Remove successfully deleted files from `store` as the job goes
    pub fn with_listing(mut self, store: &'a ListingStore) -> Self {
        self.listing = Some(store);
        self
    }

    /// Whether a failed download's `.part` file is deleted (default: yes)
    pub fn discard_partial(mut self, discard: bool) -> Self {
        self.discard_partial = discard;
        self
    }

    /// Process every item in order, then emit [`BulkEvent::Completed`].
    ///
    /// `control` is checked before each item. Sending an event never waits
    /// on the reader, and a dropped receiver does not stop the job.
    pub async fn run(
        mut self,
        job: &BulkJob,
        control: &JobControl,
        events: &mpsc::UnboundedSender<BulkEvent>,
    ) -> BulkReport {
        let total = job.total();
        let verb = job.kind.verb();
        let mut report = BulkReport::new(job);

        info!("Starting bulk {} job {} ({} files)", verb, job.id, total);

        for (i, filename) in job.filenames.iter().enumerate() {
            if control.is_cancelled() {
                info!(
                    "Bulk {} job {} cancelled after {}/{} files",
                    verb, job.id, report.attempted, total
                );
                report.cancelled = true;
                break;
            }

            let index = i + 1;
            debug!("{} {}/{}: {}", verb, index, total, filename);
            emit(
                events,
                BulkEvent::Started {
                    index,
                    total,
                    filename: filename.clone(),
                },
            );

            report.attempted += 1;
            let outcome = match self.run_item(&job.kind, filename).await {
                Ok(()) => {
                    report.succeeded += 1;
                    ItemOutcome::Succeeded
                }
                Err(e) => {
                    warn!("Failed to {} {}: {}", verb, filename, e);
                    report.failed += 1;
                    report.failures.push(FailedItem {
                        filename: filename.clone(),
                        error: e.to_string(),
                    });
                    ItemOutcome::Failed(e.to_string())
                }
            };

            emit(
                events,
                BulkEvent::Progress {
                    index,
                    total,
                    filename: filename.clone(),
                    outcome,
                },
            );
        }

        info!(
            "Bulk {} job {} complete: {}/{} succeeded, {} failed",
            verb, job.id, report.succeeded, total, report.failed
        );
        emit(events, BulkEvent::Completed(report.clone()));
        report
    }

    async fn run_item(&mut self, kind: &BulkKind, filename: &str) -> Result<(), SftpError> {
        match kind {
            BulkKind::Download { local_dir } => {
                let destination = local_destination(local_dir, filename).ok_or_else(|| {
                    SftpError::TransferFailed {
                        path: filename.to_string(),
                        reason: "not a usable local file name".to_string(),
                    }
                })?;
                match self.fs.fetch(filename, &destination).await {
                    Ok(bytes) => {
                        debug!("Fetched {} ({} bytes)", filename, bytes);
                        Ok(())
                    }
                    Err(e) => {
                        if self.discard_partial {
                            discard_partial(&destination).await;
                        }
                        Err(e)
                    }
                }
            }
            BulkKind::Delete => {
                self.fs.remove(filename).await?;
                if let Some(store) = self.listing {
                    store.remove(filename);
                }
                Ok(())
            }
        }
    }
}

fn emit(events: &mpsc::UnboundedSender<BulkEvent>, event: BulkEvent) {
    if events.send(event).is_err() {
        debug!("Bulk event receiver dropped");
    }
}

/// Delete the `.part` file a failed download of `destination` left behind
pub(crate) async fn discard_partial(destination: &Path) {
    let partial = partial_path(destination);
    match tokio::fs::remove_file(&partial).await {
        Ok(()) => debug!("Discarded partial download {}", partial.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to discard {}: {}", partial.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::build_listing;
    use crate::test_support::{Call, MockFs};

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("clip{}.mp4", i)).collect()
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<BulkEvent>) -> Vec<BulkEvent> {
        let mut out = Vec::new();
        while let Some(ev) = rx.recv().await {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn test_failure_in_middle_does_not_abort() {
        let mut fs = MockFs::with_files(&names(5));
        fs.state().fail_fetch.insert("clip3.mp4".to_string());
        let dir = tempfile::tempdir().unwrap();

        let job = BulkJob::download(names(5), dir.path());
        let (tx, rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .run(&job, &JobControl::new(), &tx)
            .await;
        drop(tx);

        assert_eq!(report.total, 5);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.attempted, 5);
        assert!(!report.cancelled);
        assert_eq!(report.failed_filenames(), vec!["clip3.mp4"]);

        // Items after the failure were still attempted, in order
        let fetched: Vec<Call> = fs.state().calls.clone();
        assert_eq!(
            fetched,
            names(5).into_iter().map(Call::Fetch).collect::<Vec<_>>()
        );

        assert!(dir.path().join("clip5.mp4").exists());
        assert!(!dir.path().join("clip3.mp4").exists());
        assert!(!dir.path().join("clip3.mp4.part").exists());

        let events = collect(rx).await;
        assert_eq!(events.len(), 11);
        assert_eq!(events.last(), Some(&BulkEvent::Completed(report)));
    }

    #[tokio::test]
    async fn test_progress_events_in_operation_order() {
        let mut fs = MockFs::with_files(&names(3));
        fs.state().fail_remove.insert("clip2.mp4".to_string());
        let job = BulkJob::delete(names(3));
        let (tx, rx) = mpsc::unbounded_channel();
        BulkExecutor::new(&mut fs)
            .run(&job, &JobControl::new(), &tx)
            .await;
        drop(tx);

        let progress: Vec<(usize, usize, String, bool)> = collect(rx)
            .await
            .into_iter()
            .filter_map(|ev| match ev {
                BulkEvent::Progress {
                    index,
                    total,
                    filename,
                    outcome,
                } => Some((index, total, filename, outcome.is_success())),
                _ => None,
            })
            .collect();

        assert_eq!(
            progress,
            vec![
                (1, 3, "clip1.mp4".to_string(), true),
                (2, 3, "clip2.mp4".to_string(), false),
                (3, 3, "clip3.mp4".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancellation_between_items() {
        let mut fs = MockFs::with_files(&names(5));
        let control = std::sync::Arc::new(JobControl::new());
        {
            let control = control.clone();
            fs.state().after_op = Some(Box::new(move |count| {
                if count == 2 {
                    control.cancel();
                }
            }));
        }

        let job = BulkJob::delete(names(5));
        let (tx, rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs).run(&job, &control, &tx).await;
        drop(tx);

        assert!(report.cancelled);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total, 5);
        assert_eq!(report.skipped(), 3);
        assert_eq!(fs.state().calls.len(), 2);

        match collect(rx).await.last() {
            Some(BulkEvent::Completed(r)) => assert_eq!(r.attempted, 2),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_issues_nothing() {
        let mut fs = MockFs::with_files(&names(2));
        let control = JobControl::new();
        control.cancel();
        let (tx, _rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .run(&BulkJob::delete(names(2)), &control, &tx)
            .await;
        assert_eq!(report.attempted, 0);
        assert!(report.cancelled);
        assert!(fs.state().calls.is_empty());
    }

    #[tokio::test]
    async fn test_delete_updates_listing() {
        let mut fs = MockFs::with_files(&names(3));
        fs.state().fail_remove.insert("clip1.mp4".to_string());
        let store = ListingStore::new();
        store.publish(build_listing(fs.state().files.clone()));

        let (tx, _rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .with_listing(&store)
            .run(&BulkJob::delete(names(3)), &JobControl::new(), &tx)
            .await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(store.current().filenames(), vec!["clip1.mp4"]);
    }

    #[tokio::test]
    async fn test_keep_partial_when_asked() {
        let mut fs = MockFs::with_files(&names(1));
        fs.state().fail_fetch.insert("clip1.mp4".to_string());
        let dir = tempfile::tempdir().unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .discard_partial(false)
            .run(
                &BulkJob::download(names(1), dir.path()),
                &JobControl::new(),
                &tx,
            )
            .await;

        assert_eq!(report.failed, 1);
        assert!(dir.path().join("clip1.mp4.part").exists());
        assert!(!dir.path().join("clip1.mp4").exists());
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stop_job() {
        let mut fs = MockFs::with_files(&names(3));
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let report = BulkExecutor::new(&mut fs)
            .run(&BulkJob::delete(names(3)), &JobControl::new(), &tx)
            .await;
        assert_eq!(report.succeeded, 3);
    }

    #[tokio::test]
    async fn test_empty_job() {
        let mut fs = MockFs::with_files(&[]);
        let (tx, rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .run(&BulkJob::delete(Vec::new()), &JobControl::new(), &tx)
            .await;
        drop(tx);
        assert_eq!((report.succeeded, report.failed, report.total), (0, 0, 0));
        assert_eq!(collect(rx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_local_name_fails_that_item_only() {
        let files = vec!["..".to_string(), "clip1.mp4".to_string()];
        let mut fs = MockFs::with_files(&files);
        let dir = tempfile::tempdir().unwrap();
        let local_dir = dir.path().join("videos");
        std::fs::create_dir(&local_dir).unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .run(
                &BulkJob::download(files, &local_dir),
                &JobControl::new(),
                &tx,
            )
            .await;

        assert_eq!((report.succeeded, report.failed), (1, 1));
        assert_eq!(report.failed_filenames(), vec![".."]);
        // Nothing was fetched for the rejected name
        assert_eq!(fs.state().calls, vec![Call::Fetch("clip1.mp4".to_string())]);
        assert!(local_dir.join("clip1.mp4").exists());
    }

    #[tokio::test]
    async fn test_events_do_not_wait_for_reader() {
        let mut fs = MockFs::with_files(&names(100));
        let (tx, rx) = mpsc::unbounded_channel();
        let report = BulkExecutor::new(&mut fs)
            .run(&BulkJob::delete(names(100)), &JobControl::new(), &tx)
            .await;
        drop(tx);

        assert_eq!(report.succeeded, 100);
        assert_eq!(collect(rx).await.len(), 201);
    }
}
