//! Configuration validation.

use crate::schema::{AgentKind, Config};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_agent(config, &mut result);
        Self::validate_session(config, &mut result);
        Self::validate_transcript(config, &mut result);
        Self::validate_answer(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_agent(config: &Config, result: &mut ValidationResult) {
        let agent = &config.agent;

        if agent.max_steps == 0 {
            result.add_error(ValidationError::new(
                "agent.max_steps",
                "max_steps must be greater than 0",
            ));
        }

        if agent.max_steps > 1000 {
            result.add_warning(ValidationWarning::new(
                "agent.max_steps",
                "max_steps is very high (>1000), runs may take a long time",
            ));
        }

        if agent.step_timeout_seconds == 0 {
            result.add_warning(ValidationWarning::new(
                "agent.step_timeout_seconds",
                "step timeout disabled, a hung step will block its session until cancelled",
            ));
        }

        match agent.kind {
            AgentKind::Process => {
                let missing = agent
                    .command
                    .as_deref()
                    .map(|c| c.trim().is_empty())
                    .unwrap_or(true);
                if missing {
                    result.add_error(ValidationError::new(
                        "agent.command",
                        "command is required when kind = \"process\"",
                    ));
                }
            }
            AgentKind::Scripted => {
                if agent.script.is_empty() {
                    result.add_warning(ValidationWarning::new(
                        "agent.script",
                        "script is empty, every run will return the fallback answer",
                    ));
                }
            }
        }

        for (i, tool) in agent.tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("agent.tools[{}].name", i),
                    "tool name cannot be empty",
                ));
            }
        }
    }

    fn validate_session(config: &Config, result: &mut ValidationResult) {
        if config.session.outbound_buffer == 0 {
            result.add_error(ValidationError::new(
                "session.outbound_buffer",
                "outbound_buffer must be greater than 0",
            ));
        }

        if config.session.turn_queue == 0 {
            result.add_error(ValidationError::new(
                "session.turn_queue",
                "turn_queue must be greater than 0",
            ));
        }
    }

    fn validate_transcript(config: &Config, result: &mut ValidationResult) {
        if !config.transcript.enabled {
            return;
        }

        if config.transcript.prefix.trim().is_empty() {
            result.add_error(ValidationError::new(
                "transcript.prefix",
                "prefix cannot be empty",
            ));
        }

        if config.transcript.prefix.contains(['/', '\\']) {
            result.add_error(ValidationError::new(
                "transcript.prefix",
                "prefix cannot contain path separators",
            ));
        }
    }

    fn validate_answer(config: &Config, result: &mut ValidationResult) {
        if config.answer.termination_marker.trim().is_empty() {
            result.add_error(ValidationError::new(
                "answer.termination_marker",
                "termination_marker cannot be empty",
            ));
        }

        if config.answer.fallback.trim().is_empty() {
            result.add_error(ValidationError::new(
                "answer.fallback",
                "fallback cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
