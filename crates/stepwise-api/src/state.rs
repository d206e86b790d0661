//! Application state.

use std::sync::Arc;
use std::time::Instant;

use stepwise_config::{Config, SessionConfig};
use stepwise_protocols::AgentFactory;
use stepwise_runtime::{RunConfig, RunDriver, TerminationMarkerFactory, TranscriptRecorder};

use crate::websocket::SessionRegistry;

/// Application state shared across handlers.
pub struct AppState {
    pub registry: SessionRegistry,
    pub driver: RunDriver,
    pub factory: Arc<dyn AgentFactory>,
    pub max_steps: u32,
    pub session: SessionConfig,
    start_time: Instant,
}

impl AppState {
    pub fn new(
        factory: Arc<dyn AgentFactory>,
        driver: RunDriver,
        max_steps: u32,
        session: SessionConfig,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(factory.clone(), max_steps, session.duplicate_policy),
            driver,
            factory,
            max_steps,
            session,
            start_time: Instant::now(),
        }
    }

    /// Wire the driver, extractor and transcript recorder from configuration.
    pub fn from_config(factory: Arc<dyn AgentFactory>, config: &Config) -> Self {
        let extractors = Arc::new(TerminationMarkerFactory::new(
            config.answer.termination_marker.clone(),
            config.answer.fallback.clone(),
        ));
        let recorder = config.transcript.enabled.then(|| {
            TranscriptRecorder::new(config.transcript.dir.clone(), config.transcript.prefix.clone())
        });
        let driver = RunDriver::new(
            RunConfig::from_timeout_secs(config.agent.step_timeout_seconds),
            extractors,
        )
        .with_recorder(recorder);

        Self::new(
            factory,
            driver,
            config.agent.max_steps,
            config.session.clone(),
        )
    }

    /// Get uptime.
    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
