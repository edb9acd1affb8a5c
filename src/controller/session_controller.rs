//! Session controller
//!
//! Owns at most one remote session and the published [`FileListing`].
//! Every operation claims the session with `try_lock`; a second caller gets
//! [`ControllerError::Busy`] instead of waiting behind the first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::ControllerError;
use super::state::{ControllerState, StateMachine};
use crate::bulk::executor::discard_partial;
use crate::bulk::{BulkEvent, BulkExecutor, BulkJob, BulkKind, BulkReport, JobControl};
use crate::config::ConnectionProfile;
use crate::listing::{build_listing, FileListing, ListingStore};
use crate::sftp::{Connector, RemoteFs, SftpConnector, SftpError};
use crate::ssh::{default_port, SshConfig};

type SharedSession = Arc<tokio::sync::Mutex<Option<Box<dyn RemoteFs>>>>;

const STATUS_CAPACITY: usize = 32;

/// Parameters for one connection attempt
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub ssh: SshConfig,
    /// Remote working directory, validated right after authentication
    pub path: String,
}

impl ConnectParams {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            ssh: SshConfig::with_password(host, default_port(), user, password),
            path: path.into(),
        }
    }
}

impl From<&ConnectionProfile> for ConnectParams {
    fn from(profile: &ConnectionProfile) -> Self {
        Self {
            ssh: profile.ssh_config(),
            path: profile.path.clone(),
        }
    }
}

/// Controller behaviour switches
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Delete the `.part` file a failed download leaves behind
    pub discard_partial: bool,
    /// Re-list the directory once a bulk delete finishes
    pub refresh_after_delete: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            discard_partial: true,
            refresh_after_delete: true,
        }
    }
}

/// A running bulk job
pub struct BulkHandle {
    pub job_id: String,
    pub total: usize,
    events: mpsc::UnboundedReceiver<BulkEvent>,
    control: Arc<JobControl>,
    task: JoinHandle<BulkReport>,
}

impl BulkHandle {
    /// Next progress event; `None` once the job has finished
    pub async fn next_event(&mut self) -> Option<BulkEvent> {
        self.events.recv().await
    }

    /// Stop before the next item. The item in flight still completes.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn control(&self) -> Arc<JobControl> {
        self.control.clone()
    }

    /// Wait for the final report, discarding events not yet read
    pub async fn wait(self) -> Result<BulkReport, ControllerError> {
        drop(self.events);
        self.task
            .await
            .map_err(|e| ControllerError::TaskFailed(e.to_string()))
    }
}

struct Inner {
    connector: Arc<dyn Connector>,
    state: Mutex<StateMachine>,
    session: SharedSession,
    listing: ListingStore,
    status_tx: broadcast::Sender<String>,
    active_job: Mutex<Option<(String, Arc<JobControl>)>>,
    options: ControllerOptions,
}

impl Inner {
    fn status(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("Status: {}", message);
        let _ = self.status_tx.send(message);
    }

    async fn list_and_publish(
        &self,
        fs: &mut dyn RemoteFs,
    ) -> Result<Arc<FileListing>, ControllerError> {
        let entries = fs.list().await.map_err(ControllerError::Listing)?;
        let raw = entries.len();
        let listing = build_listing(entries);
        info!("Listed {} entries, {} videos", raw, listing.len());
        self.status(format!("List refreshed. {} videos found.", listing.len()));
        Ok(self.listing.publish(listing))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let Some(session) = Arc::get_mut(&mut self.session) else {
            return;
        };
        let Some(mut fs) = session.get_mut().take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Closing session on controller drop");
                handle.spawn(async move { fs.close().await });
            }
            Err(_) => debug!("No runtime on controller drop; dropping session"),
        }
    }
}

/// Resets the state to `Disconnected` unless the attempt reached `Connected`
struct ConnectAttempt<'a> {
    state: &'a Mutex<StateMachine>,
    finished: bool,
}

impl<'a> ConnectAttempt<'a> {
    fn finish(mut self) {
        if let Err(e) = self.state.lock().transition(ControllerState::Connected) {
            warn!("{}", e);
        }
        self.finished = true;
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.lock().reset();
        }
    }
}

/// Handle to the remote video directory. Clones share one session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_options(connector, ControllerOptions::default())
    }

    pub fn with_options(connector: impl Connector + 'static, options: ControllerOptions) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                connector: Arc::new(connector),
                state: Mutex::new(StateMachine::new()),
                session: Arc::new(tokio::sync::Mutex::new(None)),
                listing: ListingStore::new(),
                status_tx,
                active_job: Mutex::new(None),
                options,
            }),
        }
    }

    /// Controller over real SSH/SFTP connections
    pub fn sftp() -> Self {
        Self::new(SftpConnector)
    }

    pub fn state(&self) -> ControllerState {
        self.inner.state.lock().state()
    }

    /// Latest published listing
    pub fn listing(&self) -> Arc<FileListing> {
        self.inner.listing.current()
    }

    /// Wakes on every listing change
    pub fn subscribe(&self) -> watch::Receiver<Arc<FileListing>> {
        self.inner.listing.subscribe()
    }

    /// Human-readable status lines
    pub fn subscribe_status(&self) -> broadcast::Receiver<String> {
        self.inner.status_tx.subscribe()
    }

    /// Connect, enter `params.path` and publish its listing.
    ///
    /// An existing session is closed first. If the listing fails after the
    /// directory was entered, the controller stays `Connected` and the
    /// listing error is returned.
    pub async fn connect(&self, params: ConnectParams) -> Result<Arc<FileListing>, ControllerError> {
        if self.state() == ControllerState::Connecting {
            return Err(ControllerError::Busy(
                "a connection attempt is already in progress".to_string(),
            ));
        }
        let mut session = self
            .inner
            .session
            .try_lock()
            .map_err(|_| ControllerError::session_in_use())?;

        self.inner
            .state
            .lock()
            .transition(ControllerState::Connecting)
            .map_err(|e| ControllerError::Busy(e.to_string()))?;
        let attempt = ConnectAttempt {
            state: &self.inner.state,
            finished: false,
        };

        if let Some(mut previous) = session.take() {
            info!("Closing previous session before reconnecting");
            previous.close().await;
        }

        info!("Connecting to {}", params.ssh.display_name());
        self.inner
            .status(format!("Connecting to {}...", params.ssh.host));

        let mut fs = match self.inner.connector.connect(&params.ssh).await {
            Ok(fs) => fs,
            Err(e) => {
                warn!("Connection to {} failed: {}", params.ssh.host, e);
                self.inner.listing.clear();
                self.inner.status("Connection failed.");
                return Err(ControllerError::Connection(e));
            }
        };

        if let Err(e) = fs.change_dir(&params.path).await {
            warn!("Cannot enter {}: {}", params.path, e);
            fs.close().await;
            self.inner.listing.clear();
            self.inner.status("Connection failed.");
            return Err(match e {
                SftpError::PathNotFound(path) => ControllerError::PathNotFound(path),
                other => ControllerError::Connection(other),
            });
        }

        info!("Connected to {}, working directory {}", params.ssh.host, params.path);
        self.inner.status("Connected. Retrieving file list...");
        let fs = session.insert(fs);
        attempt.finish();

        self.inner.list_and_publish(&mut **fs).await
    }

    /// Re-list the working directory
    pub async fn refresh(&self) -> Result<Arc<FileListing>, ControllerError> {
        let mut session = self.claim_session()?;
        let fs = session.as_deref_mut().ok_or(ControllerError::NotConnected)?;
        self.inner.list_and_publish(fs).await
    }

    /// Download one file to `destination`, returning the byte count
    pub async fn download_one(
        &self,
        filename: &str,
        destination: &Path,
    ) -> Result<u64, ControllerError> {
        let mut session = self.claim_session()?;
        let fs = session.as_deref_mut().ok_or(ControllerError::NotConnected)?;

        self.inner.status(format!("Downloading {}...", filename));
        match fs.fetch(filename, destination).await {
            Ok(bytes) => {
                info!("Downloaded {} ({} bytes)", filename, bytes);
                self.inner
                    .status(format!("Download complete: {}", destination.display()));
                Ok(bytes)
            }
            Err(e) => {
                warn!("Download of {} failed: {}", filename, e);
                if self.inner.options.discard_partial {
                    discard_partial(destination).await;
                }
                self.inner.status("Download failed.");
                Err(ControllerError::Transfer(e))
            }
        }
    }

    /// Delete one remote file and drop it from the listing
    pub async fn delete_one(&self, filename: &str) -> Result<(), ControllerError> {
        let mut session = self.claim_session()?;
        let fs = session.as_deref_mut().ok_or(ControllerError::NotConnected)?;

        match fs.remove(filename).await {
            Ok(()) => {
                info!("Deleted {}", filename);
                self.inner.listing.remove(filename);
                self.inner.status(format!("Deleted {}", filename));
                Ok(())
            }
            Err(e) => {
                warn!("Delete of {} failed: {}", filename, e);
                self.inner.status("Delete failed.");
                Err(ControllerError::Delete(e))
            }
        }
    }

    /// Download `filenames` into `local_dir` on a background task
    pub fn download_all(
        &self,
        filenames: Vec<String>,
        local_dir: impl Into<PathBuf>,
    ) -> Result<BulkHandle, ControllerError> {
        let guard = self.claim_owned_session()?;
        Ok(self.spawn_job(guard, BulkJob::download(filenames, local_dir)))
    }

    /// Delete `filenames` on a background task. Confirmation is the caller's job.
    pub fn delete_all(&self, filenames: Vec<String>) -> Result<BulkHandle, ControllerError> {
        let guard = self.claim_owned_session()?;
        Ok(self.spawn_job(guard, BulkJob::delete(filenames)))
    }

    /// Cancel the running bulk job, if any
    pub fn cancel_active_job(&self) -> bool {
        match self.inner.active_job.lock().as_ref() {
            Some((_, control)) => {
                control.cancel();
                true
            }
            None => false,
        }
    }

    /// Close the session. Safe to call repeatedly or before any connect.
    ///
    /// A running bulk job is cancelled and allowed to finish its current item.
    pub async fn close(&self) -> Result<(), ControllerError> {
        if self.cancel_active_job() {
            info!("Cancelling running job before close");
        }

        let mut session = self.inner.session.lock().await;
        if let Some(mut fs) = session.take() {
            fs.close().await;
            info!("Session closed");
            self.inner.status("Disconnected.");
        }
        self.inner.state.lock().reset();
        self.inner.listing.clear();
        Ok(())
    }

    fn claim_session(
        &self,
    ) -> Result<tokio::sync::MutexGuard<'_, Option<Box<dyn RemoteFs>>>, ControllerError> {
        if self.state() != ControllerState::Connected {
            return Err(ControllerError::NotConnected);
        }
        self.inner
            .session
            .try_lock()
            .map_err(|_| ControllerError::session_in_use())
    }

    fn claim_owned_session(
        &self,
    ) -> Result<OwnedMutexGuard<Option<Box<dyn RemoteFs>>>, ControllerError> {
        if self.state() != ControllerState::Connected {
            return Err(ControllerError::NotConnected);
        }
        let guard = self
            .inner
            .session
            .clone()
            .try_lock_owned()
            .map_err(|_| ControllerError::session_in_use())?;
        if guard.is_none() {
            return Err(ControllerError::NotConnected);
        }
        Ok(guard)
    }

    fn spawn_job(
        &self,
        mut guard: OwnedMutexGuard<Option<Box<dyn RemoteFs>>>,
        job: BulkJob,
    ) -> BulkHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let control = Arc::new(JobControl::new());
        let job_id = job.id.clone();
        let total = job.total();

        *self.inner.active_job.lock() = Some((job_id.clone(), control.clone()));

        let inner = self.inner.clone();
        let task_control = control.clone();
        let task = tokio::spawn(async move {
            let report = match guard.as_deref_mut() {
                Some(fs) => run_job(&inner, fs, &job, &task_control, &tx).await,
                None => BulkReport::new(&job),
            };
            drop(guard);

            let mut active = inner.active_job.lock();
            if active.as_ref().is_some_and(|(id, _)| *id == job.id) {
                *active = None;
            }
            report
        });

        BulkHandle {
            job_id,
            total,
            events: rx,
            control,
            task,
        }
    }
}

async fn run_job(
    inner: &Inner,
    fs: &mut dyn RemoteFs,
    job: &BulkJob,
    control: &JobControl,
    events: &mpsc::UnboundedSender<BulkEvent>,
) -> BulkReport {
    let report = match &job.kind {
        BulkKind::Download { local_dir } => {
            if let Err(e) = tokio::fs::create_dir_all(local_dir).await {
                warn!("Cannot create {}: {}", local_dir.display(), e);
            }
            inner.status(format!("Downloading {} files...", job.total()));
            BulkExecutor::new(&mut *fs)
                .discard_partial(inner.options.discard_partial)
                .run(job, control, events)
                .await
        }
        BulkKind::Delete => {
            inner.status(format!("Deleting {} files...", job.total()));
            BulkExecutor::new(&mut *fs)
                .with_listing(&inner.listing)
                .run(job, control, events)
                .await
        }
    };

    match job.kind {
        BulkKind::Download { .. } => inner.status(format!(
            "Bulk download complete. {}/{} files downloaded.",
            report.succeeded, report.total
        )),
        BulkKind::Delete => {
            inner.status(format!(
                "Bulk delete complete. {}/{} files deleted.",
                report.succeeded, report.total
            ));
            if inner.options.refresh_after_delete {
                if let Err(e) = inner.list_and_publish(fs).await {
                    warn!("Refresh after bulk delete failed: {}", e);
                }
            }
        }
    }
    report
}
