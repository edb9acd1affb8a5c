//! Configuration Management Module
//!
//! Reads the optional connection profile. Nothing here is ever written back.

pub mod profile;
pub mod storage;

pub use profile::{ConnectionProfile, DEFAULT_HOST, DEFAULT_PATH, DEFAULT_USER};
pub use storage::{config_dir, default_config_path, ConfigStorage, StorageError, CONFIG_FILE_NAME};
