//! Agent errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent creation failed: {0}")]
    CreationFailed(String),

    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Step timed out after {0} seconds")]
    Timeout(u64),

    #[error("Agent was cancelled")]
    Cancelled,

    #[error("Agent protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_creation_failed() {
        let err = AgentError::CreationFailed("missing api key".to_string());
        assert!(err.to_string().contains("creation failed"));
        assert!(err.to_string().contains("missing api key"));
    }

    #[test]
    fn test_agent_error_execution_failed() {
        let err = AgentError::ExecutionFailed("Something went wrong".to_string());
        assert!(err.to_string().contains("execution failed"));
    }

    #[test]
    fn test_agent_error_timeout() {
        let err = AgentError::Timeout(300);
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("seconds"));
    }

    #[test]
    fn test_agent_error_cancelled() {
        let err = AgentError::Cancelled;
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_agent_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = AgentError::from(io_err);
        assert!(err.to_string().contains("pipe closed"));
    }
}
