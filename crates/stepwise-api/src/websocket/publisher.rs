//! Streams run progress to a client connection.

use async_trait::async_trait;
use stepwise_runtime::{Run, RunError, RunObserver, RunStatus};
use tracing::{error, info};

use super::message::ServerEvent;
use super::registry::EventSender;

/// Publishes run lifecycle events on a connection's outbound queue.
pub struct StreamPublisher {
    session_id: String,
    tx: EventSender,
}

impl StreamPublisher {
    pub fn new(session_id: impl Into<String>, tx: EventSender) -> Self {
        Self {
            session_id: session_id.into(),
            tx,
        }
    }

    async fn send(&self, event: ServerEvent) -> Result<(), RunError> {
        self.tx.send(event).await.map_err(|e| {
            RunError::Delivery(format!(
                "connection for session {} closed while sending {}",
                self.session_id,
                e.0.kind()
            ))
        })
    }
}

#[async_trait]
impl RunObserver for StreamPublisher {
    async fn on_start(&mut self, _run: &Run) -> Result<(), RunError> {
        self.send(ServerEvent::reasoning_start()).await
    }

    async fn on_step(&mut self, label: &str, progress: u8) -> Result<(), RunError> {
        self.send(ServerEvent::ReasoningStep(label.to_string()))
            .await?;
        self.send(ServerEvent::Progress(progress)).await
    }

    async fn on_end(&mut self, run: &Run) -> Result<(), RunError> {
        if run.status == RunStatus::Failed {
            let message = run
                .error
                .clone()
                .unwrap_or_else(|| "agent execution failed".to_string());
            return self.send(ServerEvent::error(message)).await;
        }

        self.send(ServerEvent::reasoning_end()).await?;
        self.send(ServerEvent::Progress(100)).await?;

        let answer = run.answer.clone().unwrap_or_default();
        info!(
            "Sending result for session {} ({} chars)",
            self.session_id,
            answer.chars().count()
        );
        if let Err(e) = self.send(ServerEvent::Result(answer)).await {
            error!("Failed to send result: {}", e);
            if let Err(e2) = self
                .send(ServerEvent::error(format!("failed to send result: {}", e)))
                .await
            {
                error!("Failed to send error message: {}", e2);
            }
            return Err(e);
        }
        Ok(())
    }
}
