//! WebSocket interface module.
//!
//! One long-lived connection per client id at `/ws/chat/{client_id}`. Every
//! `message` frame starts a run on a fresh agent whose steps are streamed back
//! as they happen.

mod handler;
mod message;
mod publisher;
mod registry;

pub use handler::ws_handler;
pub use message::{ClientMessage, ServerEvent};
pub use publisher::StreamPublisher;
pub use registry::{CancelOutcome, EventSender, SessionHandle, SessionInfo, SessionRegistry};
