//! Session registry.
//!
//! Maps client ids to live connections. Each registration is stamped with an
//! epoch so that a connection replaced by a reconnect cannot tear down its
//! successor's state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use stepwise_config::DuplicatePolicy;
use stepwise_protocols::{AgentFactory, AgentRunner, AgentStatus};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::message::ServerEvent;
use crate::error::ApiError;

/// Outbound event queue of one connection.
pub type EventSender = mpsc::Sender<ServerEvent>;

/// Identifies one registration of a client id.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    epoch: u64,
    evicted: CancellationToken,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolves when a newer connection took over this client id.
    pub async fn evicted(&self) {
        self.evicted.cancelled().await
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The active run was cancelled.
    Cancelled,
    /// A run is active but its agent is not thinking.
    NotThinking,
    /// Nothing to cancel.
    NoActiveRun,
}

/// Public view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub connected_at: DateTime<Utc>,
    pub running: bool,
    pub has_agent: bool,
}

struct SessionEntry {
    epoch: u64,
    sender: EventSender,
    connected_at: DateTime<Utc>,
    evicted: CancellationToken,
    agent: Option<AgentStatus>,
    run: Option<CancellationToken>,
}

impl SessionEntry {
    /// Cancel the active run, if any.
    fn cancel_run(&self) {
        if let Some(status) = &self.agent {
            status.try_cancel();
        }
        if let Some(token) = &self.run {
            token.cancel();
        }
    }
}

/// Registry of connected sessions.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    next_epoch: AtomicU64,
    policy: DuplicatePolicy,
    factory: Arc<dyn AgentFactory>,
    max_steps: u32,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn AgentFactory>, max_steps: u32, policy: DuplicatePolicy) -> Self {
        Self {
            sessions: DashMap::new(),
            next_epoch: AtomicU64::new(0),
            policy,
            factory,
            max_steps,
        }
    }

    /// Register a connection for `id`.
    pub fn connect(&self, id: &str, sender: EventSender) -> Result<SessionHandle, ApiError> {
        let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let evicted = CancellationToken::new();
        let entry = SessionEntry {
            epoch,
            sender,
            connected_at: Utc::now(),
            evicted: evicted.clone(),
            agent: None,
            run: None,
        };

        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => match self.policy {
                DuplicatePolicy::Reject => {
                    warn!("Rejected duplicate connection for session {}", id);
                    return Err(ApiError::DuplicateSession(id.to_string()));
                }
                DuplicatePolicy::Replace => {
                    let previous = occupied.insert(entry);
                    previous.cancel_run();
                    let _ = previous.sender.try_send(ServerEvent::error(
                        "session taken over by a new connection",
                    ));
                    previous.evicted.cancel();
                    info!(
                        "Session {} reconnected, replaced epoch {} with {}",
                        id, previous.epoch, epoch
                    );
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                info!("Session {} connected (epoch {})", id, epoch);
            }
        }

        Ok(SessionHandle {
            id: id.to_string(),
            epoch,
            evicted,
        })
    }

    /// Unregister `handle`, cancelling its active run. Safe to call repeatedly.
    pub fn disconnect(&self, handle: &SessionHandle) {
        let removed = self
            .sessions
            .remove_if(&handle.id, |_, entry| entry.epoch == handle.epoch);

        match removed {
            Some((_, entry)) => {
                entry.cancel_run();
                info!("Session {} disconnected", handle.id);
            }
            None => debug!(
                "Session {} epoch {} already gone",
                handle.id, handle.epoch
            ),
        }
    }

    /// Whether `handle` is still the registered connection for its id.
    pub fn is_current(&self, handle: &SessionHandle) -> bool {
        self.sessions
            .get(&handle.id)
            .map(|entry| entry.epoch == handle.epoch)
            .unwrap_or(false)
    }

    /// Build a fresh agent for the next turn, replacing the previous one.
    pub fn create_agent(&self, handle: &SessionHandle) -> Result<Box<dyn AgentRunner>, ApiError> {
        let created = self.factory.create(self.max_steps);

        let mut entry = match self.sessions.get_mut(&handle.id) {
            Some(entry) if entry.epoch == handle.epoch => entry,
            _ => {
                return Err(ApiError::Connection(format!(
                    "session {} is no longer connected",
                    handle.id
                )));
            }
        };

        match created {
            Ok(agent) => {
                debug!("Created agent {} for session {}", agent.name(), handle.id);
                entry.agent = Some(agent.status().clone());
                Ok(agent)
            }
            Err(e) => {
                entry.agent = None;
                Err(ApiError::AgentCreation(e.to_string()))
            }
        }
    }

    /// Mark a run as active and return its cancellation token.
    ///
    /// A stale handle gets an already-cancelled token.
    pub fn begin_run(&self, handle: &SessionHandle) -> CancellationToken {
        let token = CancellationToken::new();
        match self.sessions.get_mut(&handle.id) {
            Some(mut entry) if entry.epoch == handle.epoch => {
                entry.run = Some(token.clone());
            }
            _ => token.cancel(),
        }
        token
    }

    /// Clear the active run.
    pub fn finish_run(&self, handle: &SessionHandle) {
        if let Some(mut entry) = self.sessions.get_mut(&handle.id) {
            if entry.epoch == handle.epoch {
                entry.run = None;
            }
        }
    }

    /// Cancel the active run of session `id` if its agent is thinking.
    pub fn cancel(&self, id: &str) -> CancelOutcome {
        let Some(entry) = self.sessions.get(id) else {
            return CancelOutcome::NoActiveRun;
        };
        let Some(token) = &entry.run else {
            return CancelOutcome::NoActiveRun;
        };

        match &entry.agent {
            Some(status) if status.try_cancel() => {
                token.cancel();
                info!("Cancelled active run of session {}", id);
                CancelOutcome::Cancelled
            }
            _ => CancelOutcome::NotThinking,
        }
    }

    pub fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|entry| SessionInfo {
                id: entry.key().clone(),
                connected_at: entry.connected_at,
                running: entry.run.is_some(),
                has_agent: entry.agent.is_some(),
            })
            .collect();
        sessions.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn has_agent(&self, id: &str) -> bool {
        self.sessions
            .get(id)
            .map(|entry| entry.agent.is_some())
            .unwrap_or(false)
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.sessions
            .get(id)
            .map(|entry| entry.run.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
