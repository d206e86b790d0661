//! The run model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stepwise_protocols::StepOutput;
use uuid::Uuid;

/// Run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Progress percentage after `step` of `max_steps` steps.
///
/// Capped at 99; only a terminated run reports 100.
pub fn progress(step: u32, max_steps: u32) -> u8 {
    if max_steps == 0 {
        return 0;
    }
    let pct = (u64::from(step) * 100) / u64::from(max_steps);
    pct.min(99) as u8
}

/// One execution of an agent for a single input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub session_id: String,
    pub input: String,
    /// Step results in execution order. Append-only.
    pub steps: Vec<StepOutput>,
    pub current_step: u32,
    pub max_steps: u32,
    pub answer: Option<String>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn new(session_id: impl Into<String>, input: impl Into<String>, max_steps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            input: input.into(),
            steps: Vec::new(),
            current_step: 0,
            max_steps,
            answer: None,
            status: RunStatus::Idle,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move from `Idle` to `Running`.
    pub fn start(&mut self) {
        if self.status == RunStatus::Idle {
            self.status = RunStatus::Running;
            self.started_at = Utc::now();
        }
    }

    /// Append the result of step `step` and return the progress it represents.
    pub fn push_step(&mut self, step: u32, output: StepOutput) -> u8 {
        self.current_step = step;
        self.steps.push(output);
        self.progress()
    }

    /// Current progress: below 100 until the run terminates.
    pub fn progress(&self) -> u8 {
        if self.status.is_terminal() {
            100
        } else {
            progress(self.current_step, self.max_steps)
        }
    }

    /// Whether the step budget is used up.
    pub fn budget_exhausted(&self) -> bool {
        self.current_step >= self.max_steps
    }

    /// Enter a terminal state. Later calls are ignored.
    pub fn finish(&mut self, status: RunStatus, answer: Option<String>, error: Option<String>) {
        if self.status.is_terminal() || !status.is_terminal() {
            return;
        }
        self.status = status;
        self.answer = answer;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }

    /// Raw step texts in order.
    pub fn step_texts(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.text.clone()).collect()
    }
}

/// Label under which a step is shown to the client.
pub fn step_label(step: u32, output: &StepOutput) -> String {
    format!("Step {}: {}", step, output.text)
}
