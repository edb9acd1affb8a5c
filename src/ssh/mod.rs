//! SSH module - password-authenticated connections using russh

mod client;
mod config;
mod error;
mod session;

pub use client::{ClientHandler, SshClient};
pub use config::SshConfig;
pub(crate) use config::{default_port, default_timeout};
pub use error::SshError;
pub use session::SshSession;
