//! Agent protocol definitions.
//!
//! An [`AgentRunner`] is the opaque reasoning engine behind a conversation
//! turn. The session layer never inspects its planning; it only asks for one
//! step at a time and watches its [`AgentStatus`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::status::AgentStatus;

/// What a step's text represents, when the agent knows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// User-facing content.
    Content,
    /// A control signal such as task termination.
    Control,
    /// Not tagged by the agent.
    #[default]
    Unknown,
}

/// Result of one agent step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Raw step text.
    pub text: String,

    /// Source-provided classification.
    #[serde(default)]
    pub kind: StepKind,
}

impl StepOutput {
    /// An untagged step.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StepKind::Unknown,
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StepKind::Content,
        }
    }

    pub fn control(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StepKind::Control,
        }
    }

    /// Whether the text is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A tool the agent can invoke, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A single-turn agent instance driven one step at a time.
///
/// Implementations set their status to [`AgentState::Finished`] when the task
/// is complete; the driver stops stepping once the status is terminal.
///
/// [`AgentState::Finished`]: crate::status::AgentState::Finished
#[async_trait]
pub trait AgentRunner: Send {
    /// Human-readable agent name.
    fn name(&self) -> &str;

    /// Step budget for this instance.
    fn max_steps(&self) -> u32;

    /// Shared state cell for this instance.
    fn status(&self) -> &AgentStatus;

    /// Seed the agent with the user's input.
    async fn prepare(&mut self, input: &str) -> Result<(), AgentError>;

    /// Execute step `step` (1-based) and return its output.
    async fn step(&mut self, step: u32) -> Result<StepOutput, AgentError>;

    /// Release resources held by this instance.
    async fn cleanup(&mut self) {}
}

/// Builds agent instances.
pub trait AgentFactory: Send + Sync {
    /// Create a fresh agent with the given step budget.
    fn create(&self, max_steps: u32) -> Result<Box<dyn AgentRunner>, AgentError>;

    /// Tools the created agents can use.
    fn tools(&self) -> Vec<ToolInfo> {
        Vec::new()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
