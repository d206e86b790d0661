//! Agent factory selection for Stepwise.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use stepwise_agent_process::ProcessAgentFactory;
use stepwise_config::{AgentConfig, AgentKind};
use stepwise_protocols::{AgentFactory, ToolInfo};
use stepwise_runtime::ScriptedAgentFactory;

/// Build the factory that creates a fresh agent for every turn.
pub(crate) fn build_agent_factory(
    config: &AgentConfig,
) -> Result<Arc<dyn AgentFactory>, Box<dyn std::error::Error>> {
    let tools: Vec<ToolInfo> = config
        .tools
        .iter()
        .map(|t| ToolInfo::new(t.name.clone(), t.description.clone()))
        .collect();

    match config.kind {
        AgentKind::Scripted => {
            info!("Using scripted agent ({} steps)", config.script.len());
            Ok(Arc::new(
                ScriptedAgentFactory::new(config.script.clone()).with_tools(tools),
            ))
        }
        AgentKind::Process => {
            let command = config
                .command
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .ok_or("agent.command is required when agent.kind = \"process\"")?;
            info!("Using process agent: {} {:?}", command, config.args);
            Ok(Arc::new(
                ProcessAgentFactory::new(command)
                    .with_args(config.args.clone())
                    .with_env(config.env.clone())
                    .with_working_dir(config.working_dir.as_ref().map(PathBuf::from))
                    .with_tools(tools),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_config::ToolConfig;

    #[test]
    fn test_scripted_factory_with_tools() {
        let mut config = AgentConfig::default();
        config.tools.push(ToolConfig {
            name: "web_search".to_string(),
            description: "Search the web".to_string(),
        });
        let factory = build_agent_factory(&config).unwrap();
        assert_eq!(factory.tools()[0].name, "web_search");
        assert!(factory.create(config.max_steps).is_ok());
    }

    #[test]
    fn test_process_factory_requires_command() {
        let config = AgentConfig {
            kind: AgentKind::Process,
            ..AgentConfig::default()
        };
        assert!(build_agent_factory(&config).is_err());
    }

    #[test]
    fn test_process_factory() {
        let config = AgentConfig {
            kind: AgentKind::Process,
            command: Some("my-agent".to_string()),
            ..AgentConfig::default()
        };
        let factory = build_agent_factory(&config).unwrap();
        assert!(factory.create(5).is_ok());
    }
}
