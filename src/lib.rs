//! pimotion - remote manager for motion-capture recordings
//!
//! Connects to a capture device over SSH, lists the video files in its
//! recording directory, and downloads or deletes them one at a time or in
//! bulk.

pub mod bulk;
pub mod config;
pub mod controller;
pub mod listing;
pub mod sftp;
pub mod ssh;

#[cfg(test)]
mod test_support;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use bulk::{BulkEvent, BulkReport, ItemOutcome};
pub use config::{ConfigStorage, ConnectionProfile};
pub use controller::{
    BulkHandle, ConnectParams, ControllerError, ControllerOptions, ControllerState,
    SessionController,
};
pub use listing::{FileListing, RemoteFile};

/// Initialize logging. `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
