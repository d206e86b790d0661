//! # Stepwise API
//!
//! WebSocket and HTTP interface of the agent session server.
//!
//! - **WebSocket** (`/ws/chat/{client_id}`): one session per client id; every
//!   message runs a fresh agent whose steps, progress and final answer are
//!   streamed back. A `cancel` frame stops the active run.
//! - **HTTP**: browser client, health, version, tools, sessions and a
//!   non-streaming chat endpoint.

pub mod error;
pub mod http;
pub mod server;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
pub use websocket::{
    CancelOutcome, ClientMessage, ServerEvent, SessionHandle, SessionInfo, SessionRegistry,
    StreamPublisher,
};
