//! WebSocket connection handling.
//!
//! Each connection runs three tasks: the reader loop below, a writer task that
//! serialises [`ServerEvent`]s to text frames, and a turn worker that owns the
//! agent and executes queued turns one at a time. Keeping runs off the reader
//! lets a `cancel` frame arrive while a run is in flight.
//!
//! Only the worker emits turn events, so a turn's `processing` through
//! `result` is never split by another turn.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use stepwise_runtime::RunStatus;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::message::{ClientMessage, ServerEvent};
use super::publisher::StreamPublisher;
use super::registry::{CancelOutcome, EventSender, SessionHandle};

/// WebSocket upgrade handler for `/ws/chat/{client_id}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

/// Handle one client connection until it closes.
async fn handle_socket(socket: WebSocket, client_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.session.outbound_buffer);

    let handle = match state.registry.connect(&client_id, tx.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Refusing connection for {}: {}", client_id, e);
            if let Ok(json) = serde_json::to_string(&ServerEvent::error(e.to_string())) {
                let _ = sender.send(Message::Text(json.into())).await;
            }
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    info!("WebSocket connected: {}", client_id);

    // Spawn sender task
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize {} event: {}", event.kind(), e),
            }
        }
    });

    let (turn_tx, turn_rx) = mpsc::channel::<String>(state.session.turn_queue);
    let turns = TurnQueue {
        tx: turn_tx,
        rejected: Arc::new(AtomicUsize::new(0)),
    };
    let worker = tokio::spawn(run_turns(
        state.clone(),
        handle.clone(),
        tx.clone(),
        turn_rx,
        turns.rejected.clone(),
    ));

    loop {
        let frame = tokio::select! {
            _ = handle.evicted() => {
                info!("Connection for {} replaced by a newer one", client_id);
                break;
            }
            frame = receiver.next() => frame,
        };

        let Some(result) = frame else {
            break;
        };

        match result {
            Ok(Message::Text(text)) => {
                debug!("Received from {}: {}", client_id, text.as_str());
                if !handle_text(&state, &handle, &tx, &turns, text.as_str()).await {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: {}", client_id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error for {}: {}", client_id, e);
                break;
            }
        }
    }

    // Cleanup
    state.registry.disconnect(&handle);
    drop(turns);
    if let Err(e) = worker.await {
        error!("Turn worker for {} panicked: {}", client_id, e);
    }
    drop(tx);
    let _ = writer.await;
    info!("WebSocket disconnected: {}", client_id);
}

/// Inbound side of a session's turn queue.
struct TurnQueue {
    tx: mpsc::Sender<String>,
    /// Messages refused because the queue was full, not yet reported.
    rejected: Arc<AtomicUsize>,
}

/// Handle one text frame. Returns `false` when the connection should close.
async fn handle_text(
    state: &AppState,
    handle: &SessionHandle,
    tx: &EventSender,
    turns: &TurnQueue,
    text: &str,
) -> bool {
    let reply = match ClientMessage::parse(text) {
        Err(e) => {
            warn!("Bad message from {}: {}", handle.id(), e);
            ServerEvent::error(e.to_string())
        }
        Ok(ClientMessage::Cancel) => {
            let content = match state.registry.cancel(handle.id()) {
                CancelOutcome::Cancelled => "operation cancelled",
                CancelOutcome::NotThinking | CancelOutcome::NoActiveRun => {
                    "no active run to cancel"
                }
            };
            ServerEvent::Cancelled(content.to_string())
        }
        Ok(ClientMessage::Message { content }) => {
            return match turns.tx.try_send(content) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Reported by the worker once the running turn ends.
                    warn!("Turn queue full for {}", handle.id());
                    turns.rejected.fetch_add(1, Ordering::SeqCst);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            };
        }
    };

    tx.send(reply).await.is_ok()
}

/// Execute queued turns sequentially for one session.
async fn run_turns(
    state: Arc<AppState>,
    handle: SessionHandle,
    tx: EventSender,
    mut turns: mpsc::Receiver<String>,
    rejected: Arc<AtomicUsize>,
) {
    while let Some(input) = turns.recv().await {
        if !state.registry.is_current(&handle) {
            debug!("Dropping queued turn for stale session {}", handle.id());
            break;
        }
        if tx.send(ServerEvent::processing()).await.is_err() {
            break;
        }

        let mut agent = match state.registry.create_agent(&handle) {
            Ok(agent) => agent,
            Err(e) => {
                error!("Failed to create agent for {}: {}", handle.id(), e);
                if tx.send(ServerEvent::error(e.to_string())).await.is_err()
                    || !report_rejected(&tx, &rejected).await
                {
                    break;
                }
                continue;
            }
        };

        let token = state.registry.begin_run(&handle);
        let mut publisher = StreamPublisher::new(handle.id(), tx.clone());
        let run = state
            .driver
            .execute(handle.id(), agent.as_mut(), &input, &token, &mut publisher)
            .await;
        state.registry.finish_run(&handle);

        if run.status == RunStatus::Failed && tx.is_closed() {
            debug!("Connection for {} closed during run {}", handle.id(), run.id);
            break;
        }
        if !report_rejected(&tx, &rejected).await {
            break;
        }
    }
}

/// Tell the client about messages refused during the last turn.
/// Returns `false` when the connection is gone.
async fn report_rejected(tx: &EventSender, rejected: &AtomicUsize) -> bool {
    let count = rejected.swap(0, Ordering::SeqCst);
    if count == 0 {
        return true;
    }
    let message = if count == 1 {
        "too many pending messages, try again later".to_string()
    } else {
        format!("too many pending messages, {} dropped, try again later", count)
    };
    tx.send(ServerEvent::error(message)).await.is_ok()
}
