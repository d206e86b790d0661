//! WebSocket message types.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Message sent by the browser client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Start a new turn.
    Message { content: String },
    /// Cancel the active run.
    Cancel,
}

#[derive(Deserialize)]
struct RawClientMessage {
    #[serde(rename = "type", default = "default_message_type")]
    kind: String,
    #[serde(default)]
    content: serde_json::Value,
}

fn default_message_type() -> String {
    "message".to_string()
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, ApiError> {
        let raw: RawClientMessage = serde_json::from_str(text)
            .map_err(|_| ApiError::Protocol("message format error".to_string()))?;

        match raw.kind.as_str() {
            "cancel" => Ok(Self::Cancel),
            "message" => {
                let content = match raw.content {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    _ => {
                        return Err(ApiError::Protocol(
                            "message content must be a string".to_string(),
                        ));
                    }
                };
                if content.trim().is_empty() {
                    return Err(ApiError::Protocol("message content is empty".to_string()));
                }
                Ok(Self::Message { content })
            }
            other => Err(ApiError::Protocol(format!(
                "unknown message type: {}",
                other
            ))),
        }
    }
}

/// Event streamed to the browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A turn was received.
    Processing(String),
    ReasoningStart(String),
    /// One step, labelled `Step n: ...`.
    ReasoningStep(String),
    /// Percentage in 0..=100.
    Progress(u8),
    ReasoningEnd(String),
    /// The final answer.
    Result(String),
    Error(String),
    Cancelled(String),
}

impl ServerEvent {
    pub fn processing() -> Self {
        Self::Processing("processing...".to_string())
    }

    pub fn reasoning_start() -> Self {
        Self::ReasoningStart("reasoning started...".to_string())
    }

    pub fn reasoning_end() -> Self {
        Self::ReasoningEnd("reasoning complete".to_string())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// The `type` tag as sent on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Processing(_) => "processing",
            Self::ReasoningStart(_) => "reasoning_start",
            Self::ReasoningStep(_) => "reasoning_step",
            Self::Progress(_) => "progress",
            Self::ReasoningEnd(_) => "reasoning_end",
            Self::Result(_) => "result",
            Self::Error(_) => "error",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message() {
        let msg = ClientMessage::parse(r#"{"type":"message","content":"hello"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Message {
                content: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_parse_missing_type_defaults_to_message() {
        let msg = ClientMessage::parse(r#"{"content":"hi"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Message { .. }));
    }

    #[test]
    fn test_parse_cancel() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"cancel"}"#).unwrap(),
            ClientMessage::Cancel
        );
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = ClientMessage::parse("not json").unwrap_err();
        assert_eq!(err.to_string(), "message format error");

        let err = ClientMessage::parse("[1, 2]").unwrap_err();
        assert_eq!(err.to_string(), "message format error");
    }

    #[test]
    fn test_parse_unknown_type() {
        let err = ClientMessage::parse(r#"{"type":"dance"}"#).unwrap_err();
        assert!(err.to_string().contains("dance"));
    }

    #[test]
    fn test_parse_blank_content() {
        assert!(ClientMessage::parse(r#"{"type":"message","content":"   "}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type":"message"}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type":"message","content":42}"#).is_err());
    }

    #[test]
    fn test_server_event_wire_format() {
        let json = serde_json::to_string(&ServerEvent::Progress(42)).unwrap();
        assert_eq!(json, r#"{"type":"progress","content":42}"#);

        let json = serde_json::to_string(&ServerEvent::ReasoningStep("Step 1: x".to_string()))
            .unwrap();
        assert_eq!(json, r#"{"type":"reasoning_step","content":"Step 1: x"}"#);

        let json = serde_json::to_string(&ServerEvent::Cancelled("operation cancelled".to_string()))
            .unwrap();
        assert_eq!(json, r#"{"type":"cancelled","content":"operation cancelled"}"#);
    }

    #[test]
    fn test_server_event_kind_matches_tag() {
        let events = vec![
            ServerEvent::processing(),
            ServerEvent::reasoning_start(),
            ServerEvent::ReasoningStep("s".to_string()),
            ServerEvent::Progress(1),
            ServerEvent::reasoning_end(),
            ServerEvent::Result("r".to_string()),
            ServerEvent::error("e"),
            ServerEvent::Cancelled("c".to_string()),
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }
}
