//! JSON-lines messages exchanged with the child process.

use serde::{Deserialize, Serialize};
use stepwise_protocols::{StepKind, StepOutput};

/// A line written to the child's stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentCommand {
    Start { input: String, max_steps: u32 },
    Step { step: u32 },
}

/// A line read from the child's stdout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepReply {
    pub content: String,
    #[serde(default)]
    pub kind: StepKind,
    /// The agent considers the task done.
    #[serde(default)]
    pub finished: bool,
}

impl StepReply {
    pub fn into_output(self) -> StepOutput {
        StepOutput {
            text: self.content,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_command_serialization() {
        let cmd = AgentCommand::Start {
            input: "hi".to_string(),
            max_steps: 5,
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "start");
        assert_eq!(json["input"], "hi");
        assert_eq!(json["max_steps"], 5);
    }

    #[test]
    fn test_step_command_serialization() {
        let json = serde_json::to_string(&AgentCommand::Step { step: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"step","step":3}"#);
    }

    #[test]
    fn test_reply_defaults() {
        let reply: StepReply = serde_json::from_str(r#"{"content":"thinking"}"#).unwrap();
        assert_eq!(reply.kind, StepKind::Unknown);
        assert!(!reply.finished);
    }

    #[test]
    fn test_reply_with_kind() {
        let reply: StepReply =
            serde_json::from_str(r#"{"content":"done","kind":"control","finished":true}"#)
                .unwrap();
        assert!(reply.finished);
        assert_eq!(reply.into_output(), StepOutput::control("done"));
    }
}
