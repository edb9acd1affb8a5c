//! Bulk operations
//!
//! Download-all and delete-all as a sequence of independent per-file
//! operations with progress events and cooperative cancellation.

pub mod control;
pub mod executor;
pub mod types;

pub use control::JobControl;
pub use executor::BulkExecutor;
pub use types::{BulkEvent, BulkJob, BulkKind, BulkReport, FailedItem, ItemOutcome};
