//! Health and version endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub uptime_seconds: u64,
}

/// Version response.
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.registry.len(),
        uptime_seconds: state.uptime().as_secs(),
    })
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: "stepwise",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}
