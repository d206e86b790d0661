//! Agent execution state.
//!
//! The state lives in a shared cell so the session layer can observe and
//! cancel an agent while the turn worker holds the runner mutably.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an agent instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Created, no input yet.
    Idle,
    /// Executing steps.
    Thinking,
    /// The agent signalled that the task is done.
    Finished,
    /// Cancelled by the client.
    Cancelled,
    /// A step failed.
    Error,
}

impl AgentState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Thinking => 1,
            Self::Finished => 2,
            Self::Cancelled => 3,
            Self::Error => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Thinking,
            2 => Self::Finished,
            3 => Self::Cancelled,
            4 => Self::Error,
            _ => Self::Idle,
        }
    }

    /// Whether no further steps may run in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Error)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Shared, cloneable handle to an agent's state.
///
/// Clones observe the same underlying value.
#[derive(Clone)]
pub struct AgentStatus {
    state: Arc<AtomicU8>,
}

impl AgentStatus {
    /// Create a status cell in the `Idle` state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(AgentState::Idle.as_u8())),
        }
    }

    /// Read the current state.
    pub fn get(&self) -> AgentState {
        AgentState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Overwrite the current state.
    pub fn set(&self, state: AgentState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Atomically move `Thinking` to `Cancelled`.
    ///
    /// Returns `false` (and changes nothing) when the agent is in any other state.
    pub fn try_cancel(&self) -> bool {
        self.state
            .compare_exchange(
                AgentState::Thinking.as_u8(),
                AgentState::Cancelled.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Move to `state` unless the agent was cancelled in the meantime.
    pub fn set_unless_cancelled(&self, state: AgentState) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if current == AgentState::Cancelled.as_u8() {
                    None
                } else {
                    Some(state.as_u8())
                }
            });
    }

    pub fn is_cancelled(&self) -> bool {
        self.get() == AgentState::Cancelled
    }
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AgentStatus").field(&self.get()).finish()
    }
}
