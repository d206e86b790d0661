//! An agent that replays a fixed list of step outputs.

use std::time::Duration;

use async_trait::async_trait;
use stepwise_protocols::{
    AgentError, AgentFactory, AgentRunner, AgentState, AgentStatus, StepOutput, ToolInfo,
};

/// Replays `script`, substituting `{input}` with the user's input.
///
/// Finishes after the last scripted step or when the budget runs out.
pub struct ScriptedAgent {
    script: Vec<String>,
    max_steps: u32,
    delay: Duration,
    input: String,
    status: AgentStatus,
}

impl ScriptedAgent {
    pub fn new(script: Vec<String>, max_steps: u32) -> Self {
        Self {
            script,
            max_steps,
            delay: Duration::ZERO,
            input: String::new(),
            status: AgentStatus::new(),
        }
    }

    /// Sleep this long before producing each step.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl AgentRunner for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn max_steps(&self) -> u32 {
        self.max_steps
    }

    fn status(&self) -> &AgentStatus {
        &self.status
    }

    async fn prepare(&mut self, input: &str) -> Result<(), AgentError> {
        self.input = input.to_string();
        Ok(())
    }

    async fn step(&mut self, step: u32) -> Result<StepOutput, AgentError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let index = step.saturating_sub(1) as usize;
        let line = self.script.get(index).ok_or_else(|| {
            AgentError::ExecutionFailed(format!("script has no step {}", step))
        })?;

        if index + 1 >= self.script.len() {
            self.status.set_unless_cancelled(AgentState::Finished);
        }
        Ok(StepOutput::text(line.replace("{input}", &self.input)))
    }
}

/// Builds [`ScriptedAgent`]s.
#[derive(Debug, Clone)]
pub struct ScriptedAgentFactory {
    script: Vec<String>,
    delay: Duration,
    tools: Vec<ToolInfo>,
}

impl ScriptedAgentFactory {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            tools: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolInfo>) -> Self {
        self.tools = tools;
        self
    }
}

impl AgentFactory for ScriptedAgentFactory {
    fn create(&self, max_steps: u32) -> Result<Box<dyn AgentRunner>, AgentError> {
        if max_steps == 0 {
            return Err(AgentError::CreationFailed(
                "max_steps must be greater than 0".to_string(),
            ));
        }
        Ok(Box::new(
            ScriptedAgent::new(self.script.clone(), max_steps).with_delay(self.delay),
        ))
    }

    fn tools(&self) -> Vec<ToolInfo> {
        self.tools.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_agent_substitutes_input() {
        let mut agent = ScriptedAgent::new(vec!["echo {input}".to_string()], 5);
        agent.prepare("hello").await.unwrap();
        agent.status().set(AgentState::Thinking);

        let out = agent.step(1).await.unwrap();
        assert_eq!(out.text, "echo hello");
        assert_eq!(agent.status().get(), AgentState::Finished);
    }

    #[tokio::test]
    async fn test_scripted_agent_runs_script_in_order() {
        let script = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let mut agent = ScriptedAgent::new(script, 10);
        agent.prepare("x").await.unwrap();
        agent.status().set(AgentState::Thinking);

        assert_eq!(agent.step(1).await.unwrap().text, "one");
        assert_eq!(agent.status().get(), AgentState::Thinking);
        assert_eq!(agent.step(2).await.unwrap().text, "two");
        assert_eq!(agent.step(3).await.unwrap().text, "three");
        assert_eq!(agent.status().get(), AgentState::Finished);
    }

    #[tokio::test]
    async fn test_scripted_agent_past_end_fails() {
        let mut agent = ScriptedAgent::new(Vec::new(), 3);
        let result = agent.step(1).await;
        assert!(matches!(result, Err(AgentError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_finish_does_not_override_cancel() {
        let mut agent = ScriptedAgent::new(vec!["only".to_string()], 3);
        agent.status().set(AgentState::Cancelled);
        agent.step(1).await.unwrap();
        assert_eq!(agent.status().get(), AgentState::Cancelled);
    }

    #[test]
    fn test_factory_rejects_zero_budget() {
        let factory = ScriptedAgentFactory::new(vec!["a".to_string()]);
        assert!(matches!(
            factory.create(0),
            Err(AgentError::CreationFailed(_))
        ));
        assert_eq!(factory.create(4).unwrap().max_steps(), 4);
    }

    #[test]
    fn test_factory_tools() {
        let factory = ScriptedAgentFactory::new(Vec::new())
            .with_tools(vec![ToolInfo::new("search", "Search the web")]);
        assert_eq!(factory.tools().len(), 1);
        assert_eq!(factory.tools()[0].name, "search");
    }
}
