//! Child process agent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use stepwise_protocols::{
    AgentError, AgentFactory, AgentRunner, AgentState, AgentStatus, StepOutput, ToolInfo,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::wire::{AgentCommand, StepReply};

/// How to launch the child process.
#[derive(Debug, Clone, Default)]
struct Launch {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
}

struct Pipes {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// An agent whose steps are produced by an external program.
pub struct ProcessAgent {
    launch: Launch,
    max_steps: u32,
    status: AgentStatus,
    pipes: Option<Pipes>,
}

impl ProcessAgent {
    fn new(launch: Launch, max_steps: u32) -> Self {
        Self {
            launch,
            max_steps,
            status: AgentStatus::new(),
            pipes: None,
        }
    }

    fn spawn(&self) -> Result<Pipes, AgentError> {
        let mut cmd = Command::new(&self.launch.command);
        cmd.args(&self.launch.args)
            .envs(&self.launch.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.launch.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            AgentError::ExecutionFailed(format!(
                "failed to spawn '{}': {}",
                self.launch.command, e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Protocol("failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Protocol("failed to capture stdout".to_string()))?;

        Ok(Pipes {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    fn pipes(&mut self) -> Result<&mut Pipes, AgentError> {
        self.pipes
            .as_mut()
            .ok_or_else(|| AgentError::Protocol("agent process not started".to_string()))
    }

    async fn send(&mut self, command: &AgentCommand) -> Result<(), AgentError> {
        let mut line = serde_json::to_string(command)
            .map_err(|e| AgentError::Protocol(e.to_string()))?;
        line.push('\n');

        let pipes = self.pipes()?;
        pipes.stdin.write_all(line.as_bytes()).await?;
        pipes.stdin.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<StepReply, AgentError> {
        let pipes = self.pipes()?;
        loop {
            let line = pipes.stdout.next_line().await?.ok_or_else(|| {
                AgentError::Protocol("agent process closed its output".to_string())
            })?;
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line).map_err(|e| {
                AgentError::Protocol(format!("invalid step reply '{}': {}", line, e))
            });
        }
    }
}

#[async_trait]
impl AgentRunner for ProcessAgent {
    fn name(&self) -> &str {
        "process"
    }

    fn max_steps(&self) -> u32 {
        self.max_steps
    }

    fn status(&self) -> &AgentStatus {
        &self.status
    }

    async fn prepare(&mut self, input: &str) -> Result<(), AgentError> {
        let pipes = self.spawn()?;
        debug!(
            "Spawned agent process '{}' (pid {:?})",
            self.launch.command,
            pipes.child.id()
        );
        self.pipes = Some(pipes);

        self.send(&AgentCommand::Start {
            input: input.to_string(),
            max_steps: self.max_steps,
        })
        .await
    }

    async fn step(&mut self, step: u32) -> Result<StepOutput, AgentError> {
        self.send(&AgentCommand::Step { step }).await?;
        let reply = self.receive().await?;
        if reply.finished {
            self.status.set_unless_cancelled(AgentState::Finished);
        }
        Ok(reply.into_output())
    }

    async fn cleanup(&mut self) {
        if let Some(mut pipes) = self.pipes.take() {
            if let Err(e) = pipes.child.kill().await {
                warn!("Failed to kill agent process: {}", e);
            }
        }
    }
}

/// Builds a [`ProcessAgent`] per turn.
#[derive(Debug, Clone)]
pub struct ProcessAgentFactory {
    launch: Launch,
    tools: Vec<ToolInfo>,
}

impl ProcessAgentFactory {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            launch: Launch {
                command: command.into(),
                ..Launch::default()
            },
            tools: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.launch.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.launch.env = env;
        self
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.launch.working_dir = dir;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolInfo>) -> Self {
        self.tools = tools;
        self
    }

    pub fn command(&self) -> &str {
        &self.launch.command
    }
}

impl AgentFactory for ProcessAgentFactory {
    fn create(&self, max_steps: u32) -> Result<Box<dyn AgentRunner>, AgentError> {
        if self.launch.command.trim().is_empty() {
            return Err(AgentError::CreationFailed(
                "no agent command configured".to_string(),
            ));
        }
        if max_steps == 0 {
            return Err(AgentError::CreationFailed(
                "max_steps must be greater than 0".to_string(),
            ));
        }
        Ok(Box::new(ProcessAgent::new(self.launch.clone(), max_steps)))
    }

    fn tools(&self) -> Vec<ToolInfo> {
        self.tools.clone()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
