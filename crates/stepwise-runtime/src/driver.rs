//! Step-by-step run execution.
//!
//! [`RunDriver`] owns the agent loop for one conversation turn. Each step
//! result is appended to the [`Run`], fed to the answer extractor and handed
//! to a [`RunObserver`] before the next step starts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stepwise_protocols::{AgentError, AgentRunner, AgentState, AgentStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RunError;
use crate::extractor::{AnswerExtractor, ExtractorFactory};
use crate::run::{step_label, Run, RunStatus};
use crate::transcript::TranscriptRecorder;

/// Receives run lifecycle notifications in order.
#[async_trait]
pub trait RunObserver: Send {
    /// The run has started; no step has executed yet.
    async fn on_start(&mut self, run: &Run) -> Result<(), RunError>;

    /// A step finished. `label` is the client-facing text.
    async fn on_step(&mut self, label: &str, progress: u8) -> Result<(), RunError>;

    /// The run has terminated and its transcript has been written.
    async fn on_end(&mut self, run: &Run) -> Result<(), RunError>;
}

/// Configuration for the run driver.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Upper bound on a single step. `None` waits indefinitely.
    pub step_timeout: Option<Duration>,
}

impl RunConfig {
    /// Build from a timeout in seconds, where 0 disables the timeout.
    pub fn from_timeout_secs(secs: u64) -> Self {
        Self {
            step_timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }
}

/// Drives agents through runs.
pub struct RunDriver {
    config: RunConfig,
    extractors: Arc<dyn ExtractorFactory>,
    recorder: Option<TranscriptRecorder>,
}

impl RunDriver {
    pub fn new(config: RunConfig, extractors: Arc<dyn ExtractorFactory>) -> Self {
        Self {
            config,
            extractors,
            recorder: None,
        }
    }

    /// Record a transcript for every finished run.
    pub fn with_recorder(mut self, recorder: Option<TranscriptRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute one run of `agent` on `input`.
    ///
    /// Always returns the terminated run; failures are reported through its
    /// status and error text.
    pub async fn execute(
        &self,
        session_id: &str,
        agent: &mut dyn AgentRunner,
        input: &str,
        cancel: &CancellationToken,
        observer: &mut dyn RunObserver,
    ) -> Run {
        let status = agent.status().clone();
        let mut run = Run::new(session_id, input, agent.max_steps());
        let mut extractor = self.extractors.create();
        run.start();

        info!(
            "Run {} started for session {} with agent {} ({} steps max)",
            run.id,
            session_id,
            agent.name(),
            run.max_steps
        );

        let outcome = self
            .drive(&mut run, agent, &status, cancel, observer, extractor.as_mut())
            .await;

        let cancelled = cancel.is_cancelled() || status.is_cancelled();
        match outcome {
            Err(RunError::Agent(AgentError::Cancelled)) => {
                let answer = extractor.finish(&run.steps);
                run.finish(RunStatus::Cancelled, Some(answer), None);
            }
            Err(e) => {
                warn!("Run {} failed at step {}: {}", run.id, run.current_step, e);
                status.set_unless_cancelled(AgentState::Error);
                run.finish(RunStatus::Failed, None, Some(e.to_string()));
            }
            Ok(()) if cancelled => {
                let answer = extractor.finish(&run.steps);
                run.finish(RunStatus::Cancelled, Some(answer), None);
            }
            Ok(()) => {
                status.set_unless_cancelled(AgentState::Finished);
                let answer = extractor.finish(&run.steps);
                run.finish(RunStatus::Completed, Some(answer), None);
            }
        }

        agent.cleanup().await;

        info!(
            "Run {} {} after {} steps",
            run.id,
            run.status,
            run.steps.len()
        );

        if let Some(recorder) = &self.recorder {
            recorder.record(&run).await;
        }

        if let Err(e) = observer.on_end(&run).await {
            warn!("Failed to deliver end of run {}: {}", run.id, e);
        }

        run
    }

    async fn drive(
        &self,
        run: &mut Run,
        agent: &mut dyn AgentRunner,
        status: &AgentStatus,
        cancel: &CancellationToken,
        observer: &mut dyn RunObserver,
        extractor: &mut dyn AnswerExtractor,
    ) -> Result<(), RunError> {
        observer.on_start(run).await?;

        if cancel.is_cancelled() {
            return Ok(());
        }
        match self.bounded(cancel, agent.prepare(&run.input)).await {
            Some(res) if !cancel.is_cancelled() => res?,
            _ => {
                debug!("Run {} cancelled while preparing", run.id);
                return Ok(());
            }
        }
        status.set_unless_cancelled(AgentState::Thinking);

        loop {
            if cancel.is_cancelled() || status.is_cancelled() {
                debug!("Run {} cancelled before step {}", run.id, run.current_step + 1);
                return Ok(());
            }
            if status.get() == AgentState::Finished {
                return Ok(());
            }
            if run.budget_exhausted() {
                debug!("Run {} reached its step budget", run.id);
                return Ok(());
            }

            let step = run.current_step + 1;
            let result = self.bounded(cancel, agent.step(step)).await;

            // A step that completes after cancellation is dropped.
            let output = match result {
                Some(res) if !cancel.is_cancelled() => res?,
                _ => {
                    debug!("Run {} dropped in-flight step {}", run.id, step);
                    return Ok(());
                }
            };

            let label = step_label(step, &output);
            let progress = run.push_step(step, output);
            extractor.observe(&run.steps);
            observer.on_step(&label, progress).await?;
        }
    }

    /// Await an agent call under the step timeout, racing the token.
    ///
    /// Returns `None` once the token is cancelled.
    async fn bounded<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, AgentError>>,
    ) -> Option<Result<T, AgentError>> {
        let timeout = self.config.step_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = async {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, call)
                        .await
                        .unwrap_or(Err(AgentError::Timeout(limit.as_secs()))),
                    None => call.await,
                }
            } => Some(res),
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
