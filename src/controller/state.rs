//! Connection lifecycle state machine
//!
//! ```text
//! Disconnected ──► Connecting ──► Connected ──► Disconnected
//!                      │  ▲            │
//!                      │  └────────────┘ (reconnect)
//!                      └──► Disconnected (attempt failed)
//! ```

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ControllerState {
    pub fn can_transition_to(self, next: ControllerState) -> bool {
        use ControllerState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Connecting)
                | (Connected, Disconnected)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ControllerState,
    pub to: ControllerState,
}

#[derive(Debug, Default)]
pub struct StateMachine {
    state: ControllerState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Move to `next`, returning the previous state
    pub fn transition(&mut self, next: ControllerState) -> Result<ControllerState, InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        let previous = self.state;
        self.state = next;
        tracing::debug!("Controller state {:?} -> {:?}", previous, next);
        Ok(previous)
    }

    /// Teardown path: always lands in `Disconnected`
    pub fn reset(&mut self) -> ControllerState {
        std::mem::replace(&mut self.state, ControllerState::Disconnected)
    }
}
