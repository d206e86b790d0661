//! Per-run transcript files.
//!
//! Every finished run is written once as a pretty-printed JSON document named
//! after the local time it finished. Transcripts are never read back.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::run::Run;

const MAX_SUFFIX: u32 = 1000;

/// On-disk transcript layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptDocument {
    /// Local time the run finished, `%Y%m%d_%H%M%S`.
    pub timestamp: String,
    pub input: String,
    pub output: Option<String>,
    pub steps: Vec<String>,
    pub session_id: String,
    pub run_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TranscriptDocument {
    pub fn from_run(run: &Run, timestamp: String) -> Self {
        Self {
            timestamp,
            input: run.input.clone(),
            output: run.answer.clone(),
            steps: run.step_texts(),
            session_id: run.session_id.clone(),
            run_id: run.id.to_string(),
            status: run.status.to_string(),
            error: run.error.clone(),
            started_at: run.started_at,
            finished_at: run.finished_at,
        }
    }
}

/// Writes transcript documents into a directory.
#[derive(Debug, Clone)]
pub struct TranscriptRecorder {
    dir: PathBuf,
    prefix: String,
}

impl TranscriptRecorder {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Persist `run`. Returns the written path, or `None` after logging the failure.
    pub async fn record(&self, run: &Run) -> Option<PathBuf> {
        match self.write(run).await {
            Ok(path) => {
                info!("Transcript saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!(
                    "Failed to save transcript for run {} in {}: {}",
                    run.id,
                    self.dir.display(),
                    e
                );
                None
            }
        }
    }

    async fn write(&self, run: &Run) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let document = TranscriptDocument::from_run(run, timestamp.clone());
        let json = serde_json::to_vec_pretty(&document)?;

        let mut suffix = 0;
        loop {
            let path = self.path_for(&timestamp, suffix);
            let opened = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match opened {
                Ok(mut file) => {
                    file.write_all(&json).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && suffix < MAX_SUFFIX => {
                    debug!("Transcript {} exists, trying next suffix", path.display());
                    suffix += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn path_for(&self, timestamp: &str, suffix: u32) -> PathBuf {
        let name = if suffix == 0 {
            format!("{}_{}.json", self.prefix, timestamp)
        } else {
            format!("{}_{}_{}.json", self.prefix, timestamp, suffix)
        };
        self.dir.join(name)
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
