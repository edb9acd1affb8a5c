//! Session controller
//!
//! Connection lifecycle, the published listing and every user-facing
//! operation on the remote video directory.

mod error;
mod session_controller;
mod state;

pub use error::ControllerError;
pub use session_controller::{BulkHandle, ConnectParams, ControllerOptions, SessionController};
pub use state::{ControllerState, InvalidTransition, StateMachine};
