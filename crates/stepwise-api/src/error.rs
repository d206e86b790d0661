//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A session with this id is already connected.
    #[error("Session already connected: {0}")]
    DuplicateSession(String),

    /// The agent factory could not build an agent.
    #[error("Agent creation failed: {0}")]
    AgentCreation(String),

    /// Malformed or unsupported client message.
    #[error("{0}")]
    Protocol(String),

    /// The client connection is gone or was replaced.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The agent failed while executing.
    #[error("Agent execution failed: {0}")]
    Agent(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateSession(_) => StatusCode::CONFLICT,
            Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::AgentCreation(_) | Self::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_is_bare_message() {
        let err = ApiError::Protocol("message format error".to_string());
        assert_eq!(err.to_string(), "message format error");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_duplicate_session_conflict() {
        let err = ApiError::DuplicateSession("client-1".to_string());
        assert!(err.to_string().contains("client-1"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_agent_errors_are_server_errors() {
        assert_eq!(
            ApiError::AgentCreation("no key".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Agent("tool crashed".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::Agent("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
