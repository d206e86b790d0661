//! Run errors.

use stepwise_protocols::AgentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// An observer could not deliver an event to the client.
    #[error("Event delivery failed: {0}")]
    Delivery(String),
}

impl RunError {
    /// Whether the client connection is gone.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }
}
