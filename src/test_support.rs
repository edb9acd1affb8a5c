//! Scripted in-memory transport for unit tests

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::sftp::path_utils::partial_path;
use crate::sftp::{Connector, RemoteEntry, RemoteFs, SftpError};
use crate::ssh::{SshConfig, SshError};

pub(crate) const VIDEO_DIR: &str = "/home/pi/motion_videos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ChangeDir(String),
    List,
    Fetch(String),
    Remove(String),
    Close,
}

pub(crate) struct MockState {
    /// Remote directory contents
    pub files: Vec<RemoteEntry>,
    /// Directories `change_dir` accepts
    pub dirs: Vec<String>,
    pub calls: Vec<Call>,
    pub fail_fetch: HashSet<String>,
    pub fail_remove: HashSet<String>,
    pub fail_list: bool,
    /// Next connect attempt fails with this message
    pub fail_connect: Option<String>,
    pub connects: usize,
    pub closes: usize,
    /// Count of fetch/remove operations so far
    pub ops: usize,
    /// Called after every fetch/remove with the running op count
    pub after_op: Option<Box<dyn Fn(usize) + Send>>,
    /// When set, fetch waits for a permit before doing anything
    pub fetch_gate: Option<Arc<Notify>>,
    /// When set, connect waits for a permit before doing anything
    pub connect_gate: Option<Arc<Notify>>,
}

impl MockState {
    fn new(files: &[String]) -> Self {
        Self {
            files: files
                .iter()
                .enumerate()
                .map(|(i, name)| RemoteEntry::file(name.clone(), 1024 * (i as u64 + 1), i as i64))
                .collect(),
            dirs: vec![VIDEO_DIR.to_string()],
            calls: Vec::new(),
            fail_fetch: HashSet::new(),
            fail_remove: HashSet::new(),
            fail_list: false,
            fail_connect: None,
            connects: 0,
            closes: 0,
            ops: 0,
            after_op: None,
            fetch_gate: None,
            connect_gate: None,
        }
    }

    fn has_file(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f.filename == filename)
    }
}

/// In-memory [`RemoteFs`]; clones share state
#[derive(Clone)]
pub(crate) struct MockFs {
    state: Arc<Mutex<MockState>>,
}

impl MockFs {
    pub fn with_files(files: &[String]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new(files))),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock()
    }

    fn after_op(&self) {
        let mut st = self.state();
        st.ops += 1;
        let count = st.ops;
        if let Some(hook) = st.after_op.as_ref() {
            hook(count);
        }
    }
}

#[async_trait]
impl RemoteFs for MockFs {
    async fn change_dir(&mut self, path: &str) -> Result<String, SftpError> {
        let mut st = self.state();
        st.calls.push(Call::ChangeDir(path.to_string()));
        if st.dirs.iter().any(|d| d == path) {
            Ok(path.to_string())
        } else {
            Err(SftpError::PathNotFound(path.to_string()))
        }
    }

    async fn list(&mut self) -> Result<Vec<RemoteEntry>, SftpError> {
        let mut st = self.state();
        st.calls.push(Call::List);
        if st.fail_list {
            return Err(SftpError::ProtocolError("listing refused".to_string()));
        }
        Ok(st.files.clone())
    }

    async fn fetch(&mut self, filename: &str, destination: &Path) -> Result<u64, SftpError> {
        let gate = self.state().fetch_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let (fail, exists) = {
            let mut st = self.state();
            st.calls.push(Call::Fetch(filename.to_string()));
            (st.fail_fetch.contains(filename), st.has_file(filename))
        };

        let result = if fail {
            tokio::fs::write(partial_path(destination), b"partial").await?;
            Err(SftpError::TransferFailed {
                path: filename.to_string(),
                reason: "connection reset".to_string(),
            })
        } else if !exists {
            Err(SftpError::TransferFailed {
                path: filename.to_string(),
                reason: "No such file".to_string(),
            })
        } else {
            let data = format!("video:{}", filename);
            tokio::fs::write(destination, data.as_bytes()).await?;
            Ok(data.len() as u64)
        };

        self.after_op();
        result
    }

    async fn remove(&mut self, filename: &str) -> Result<(), SftpError> {
        let result = {
            let mut st = self.state();
            st.calls.push(Call::Remove(filename.to_string()));
            if st.fail_remove.contains(filename) {
                Err(SftpError::DeleteFailed {
                    path: filename.to_string(),
                    reason: "Permission denied".to_string(),
                })
            } else if !st.has_file(filename) {
                Err(SftpError::DeleteFailed {
                    path: filename.to_string(),
                    reason: "No such file".to_string(),
                })
            } else {
                st.files.retain(|f| f.filename != filename);
                Ok(())
            }
        };
        self.after_op();
        result
    }

    async fn close(&mut self) {
        let mut st = self.state();
        st.calls.push(Call::Close);
        st.closes += 1;
    }
}

/// [`Connector`] handing out [`MockFs`] sessions over shared state
#[derive(Clone)]
pub(crate) struct MockConnector {
    pub fs: MockFs,
}

impl MockConnector {
    pub fn with_files(files: &[String]) -> Self {
        Self {
            fs: MockFs::with_files(files),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.fs.state()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn RemoteFs>, SftpError> {
        let gate = self.state().connect_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut st = self.state();
        st.connects += 1;
        if let Some(reason) = st.fail_connect.take() {
            return Err(SftpError::Ssh(SshError::AuthenticationFailed(format!(
                "{} ({})",
                reason, config.host
            ))));
        }
        Ok(Box::new(self.fs.clone()))
    }
}

pub(crate) fn clip_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("clip{}.mp4", i)).collect()
}
