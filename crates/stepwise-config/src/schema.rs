//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub transcript: TranscriptConfig,

    #[serde(default)]
    pub answer: AnswerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Which agent implementation serves conversation turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Replays `agent.script`; useful for demos.
    #[default]
    Scripted,
    /// Spawns `agent.command` per turn.
    Process,
}

/// Agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub kind: AgentKind,

    /// Step budget for every new agent instance.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Per-step timeout. Zero disables the timeout.
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,

    /// Executable for `kind = "process"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Steps replayed by the scripted agent.
    #[serde(default = "default_script")]
    pub script: Vec<String>,

    /// Tools advertised on `/api/tools`.
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            kind: AgentKind::default(),
            max_steps: default_max_steps(),
            step_timeout_seconds: default_step_timeout(),
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            script: default_script(),
            tools: Vec::new(),
        }
    }
}

fn default_max_steps() -> u32 {
    20
}

fn default_step_timeout() -> u64 {
    300
}

fn default_script() -> Vec<String> {
    vec![
        "Thinking about: {input}".to_string(),
        "Answer: {input}".to_string(),
        "Observed output of cmd `terminate` executed:\nThe interaction has been completed with status: success".to_string(),
    ]
}

/// An advertised tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// What happens when a client connects with an id that is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Evict the existing session and cancel its run.
    #[default]
    Replace,
    /// Refuse the new connection.
    Reject,
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Capacity of each connection's outbound event queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Turns that may wait behind the active run.
    #[serde(default = "default_turn_queue")]
    pub turn_queue: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            outbound_buffer: default_outbound_buffer(),
            turn_queue: default_turn_queue(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    100
}

fn default_turn_queue() -> usize {
    8
}

/// Transcript configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_transcript_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_transcript_prefix")]
    pub prefix: String,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_transcript_dir(),
            prefix: default_transcript_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_transcript_prefix() -> String {
    "conversation".to_string()
}

/// Final-answer extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Case-insensitive marker identifying the termination step.
    #[serde(default = "default_termination_marker")]
    pub termination_marker: String,

    /// Returned when no step qualifies as an answer.
    #[serde(default = "default_fallback_answer")]
    pub fallback: String,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            termination_marker: default_termination_marker(),
            fallback: default_fallback_answer(),
        }
    }
}

fn default_termination_marker() -> String {
    "terminate".to_string()
}

fn default_fallback_answer() -> String {
    "The agent finished without producing an answer.".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files. Defaults to `~/.stepwise/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            file: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Resolved log directory.
    pub fn log_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => dirs::home_dir()
                .map(|h| h.join(".stepwise").join("logs"))
                .unwrap_or_else(|| PathBuf::from(".stepwise/logs")),
        }
    }
}
