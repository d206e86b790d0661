//! # Stepwise Runtime
//!
//! Drives an agent one step at a time, extracts a final answer from the step
//! stream and records a transcript of every finished run.

pub mod driver;
pub mod error;
pub mod extractor;
pub mod run;
pub mod scripted;
pub mod transcript;

pub use driver::{RunConfig, RunDriver, RunObserver};
pub use error::RunError;
pub use extractor::{
    AnswerExtractor, ExtractorFactory, TerminationMarkerExtractor, TerminationMarkerFactory,
};
pub use run::{progress, step_label, Run, RunStatus};
pub use scripted::{ScriptedAgent, ScriptedAgentFactory};
pub use transcript::{TranscriptDocument, TranscriptRecorder};
