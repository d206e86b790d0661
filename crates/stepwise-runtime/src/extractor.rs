//! Final-answer extraction.
//!
//! Agents do not return a structured answer; the final answer is inferred from
//! the step stream. The heuristic lives behind [`AnswerExtractor`] so it can be
//! replaced once agents tag their outputs.

use stepwise_protocols::{StepKind, StepOutput};

/// Chooses the user-visible answer for a run.
pub trait AnswerExtractor: Send {
    /// Called after every step with all steps so far.
    fn observe(&mut self, steps: &[StepOutput]);

    /// Produce the answer once the run has terminated. Never empty.
    fn finish(&mut self, steps: &[StepOutput]) -> String;
}

/// Builds one extractor per run.
pub trait ExtractorFactory: Send + Sync {
    fn create(&self) -> Box<dyn AnswerExtractor>;
}

/// Treats steps mentioning a termination marker as control signals and
/// answers with the content step that preceded them.
#[derive(Debug, Clone)]
pub struct TerminationMarkerExtractor {
    marker: String,
    fallback: String,
    candidate: Option<String>,
}

impl TerminationMarkerExtractor {
    pub fn new(marker: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            marker: marker.into().to_lowercase(),
            fallback: fallback.into(),
            candidate: None,
        }
    }

    fn is_control(&self, step: &StepOutput) -> bool {
        match step.kind {
            StepKind::Control => true,
            StepKind::Content => false,
            StepKind::Unknown => {
                !self.marker.is_empty() && step.text.to_lowercase().contains(&self.marker)
            }
        }
    }
}

impl Default for TerminationMarkerExtractor {
    fn default() -> Self {
        Self::new("terminate", "The agent finished without producing an answer.")
    }
}

impl AnswerExtractor for TerminationMarkerExtractor {
    fn observe(&mut self, steps: &[StepOutput]) {
        let Some(latest) = steps.last() else {
            return;
        };
        if latest.is_blank() {
            return;
        }

        if !self.is_control(latest) {
            self.candidate = Some(latest.text.clone());
            return;
        }

        if steps.len() >= 2 {
            let previous = &steps[steps.len() - 2];
            if !previous.is_blank() && !self.is_control(previous) {
                self.candidate = Some(previous.text.clone());
            }
        }
    }

    fn finish(&mut self, steps: &[StepOutput]) -> String {
        if let Some(candidate) = self.candidate.take() {
            if !candidate.trim().is_empty() {
                return candidate;
            }
        }

        steps
            .iter()
            .rev()
            .find(|s| !s.is_blank() && !self.is_control(s))
            .map(|s| s.text.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Factory for [`TerminationMarkerExtractor`].
#[derive(Debug, Clone)]
pub struct TerminationMarkerFactory {
    marker: String,
    fallback: String,
}

impl TerminationMarkerFactory {
    pub fn new(marker: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            fallback: fallback.into(),
        }
    }
}

impl Default for TerminationMarkerFactory {
    fn default() -> Self {
        Self::new("terminate", "The agent finished without producing an answer.")
    }
}

impl ExtractorFactory for TerminationMarkerFactory {
    fn create(&self) -> Box<dyn AnswerExtractor> {
        Box::new(TerminationMarkerExtractor::new(
            self.marker.clone(),
            self.fallback.clone(),
        ))
    }
}
