//! # Stepwise Protocols
//!
//! Interface definitions shared by the Stepwise crates. Contains only the
//! contracts between the session layer and the agents it drives.
//!
//! ## Core Traits
//!
//! - [`AgentRunner`] - A single-turn, step-driven agent instance
//! - [`AgentFactory`] - Builds a fresh [`AgentRunner`] for every conversation turn

pub mod agent;
pub mod error;
pub mod status;

pub use agent::{AgentFactory, AgentRunner, StepKind, StepOutput, ToolInfo};
pub use error::AgentError;
pub use status::{AgentState, AgentStatus};
