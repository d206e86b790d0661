//! REST handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use stepwise_protocols::ToolInfo;
use stepwise_runtime::{Run, RunError, RunObserver, RunStatus};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::websocket::SessionInfo;

/// Request to run one non-streaming turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
}

/// Final answer of a non-streaming turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionInfo>,
}

/// Observer for runs nobody watches live.
struct SilentObserver;

#[async_trait]
impl RunObserver for SilentObserver {
    async fn on_start(&mut self, _run: &Run) -> Result<(), RunError> {
        Ok(())
    }

    async fn on_step(&mut self, _label: &str, _progress: u8) -> Result<(), RunError> {
        Ok(())
    }

    async fn on_end(&mut self, _run: &Run) -> Result<(), RunError> {
        Ok(())
    }
}

/// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::Protocol("message content is empty".to_string()));
    }

    let session_id = format!("http-{}", Uuid::new_v4());
    let mut agent = state.factory.create(state.max_steps).map_err(|e| {
        error!("Failed to create agent for {}: {}", session_id, e);
        ApiError::AgentCreation(e.to_string())
    })?;

    info!("Running HTTP chat turn {}", session_id);
    let token = CancellationToken::new();
    let run = state
        .driver
        .execute(
            &session_id,
            agent.as_mut(),
            &request.content,
            &token,
            &mut SilentObserver,
        )
        .await;

    match run.status {
        RunStatus::Failed => Err(ApiError::Agent(
            run.error.unwrap_or_else(|| "unknown error".to_string()),
        )),
        _ => Ok(Json(ChatResponse {
            role: "assistant".to_string(),
            content: run.answer.unwrap_or_default(),
        })),
    }
}

/// GET /api/tools
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.factory.tools(),
    })
}

/// GET /api/sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.registry.list(),
    })
}
