use super::*;
use crate::schema::ToolConfig;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_port() {
    let mut config = Config::default();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "server.port"));
}

#[test]
fn test_validate_empty_host() {
    let mut config = Config::default();
    config.server.host = String::new();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "server.host"));
}

#[test]
fn test_validate_zero_max_steps() {
    let mut config = Config::default();
    config.agent.max_steps = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "agent.max_steps"));
}

#[test]
fn test_validate_high_max_steps_warning() {
    let mut config = Config::default();
    config.agent.max_steps = 5000;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "agent.max_steps"));
}

#[test]
fn test_validate_disabled_timeout_warning() {
    let mut config = Config::default();
    config.agent.step_timeout_seconds = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.path == "agent.step_timeout_seconds"));
}

#[test]
fn test_validate_process_requires_command() {
    let mut config = Config::default();
    config.agent.kind = AgentKind::Process;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "agent.command"));

    config.agent.command = Some("   ".to_string());
    assert!(!ConfigValidator::validate(&config).is_valid());

    config.agent.command = Some("python3".to_string());
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_validate_empty_script_warning() {
    let mut config = Config::default();
    config.agent.script.clear();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "agent.script"));
}

#[test]
fn test_validate_unnamed_tool() {
    let mut config = Config::default();
    config.agent.tools.push(ToolConfig {
        name: " ".to_string(),
        description: "nothing".to_string(),
    });

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "agent.tools[0].name"));
}

#[test]
fn test_validate_session_buffers() {
    let mut config = Config::default();
    config.session.outbound_buffer = 0;
    config.session.turn_queue = 0;

    let result = ConfigValidator::validate(&config);
    assert_eq!(result.errors.len(), 2);
}

#[test]
fn test_validate_transcript_prefix() {
    let mut config = Config::default();
    config.transcript.prefix = "../escape".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "transcript.prefix"));

    // Disabled transcripts are not checked.
    config.transcript.enabled = false;
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_validate_answer_settings() {
    let mut config = Config::default();
    config.answer.termination_marker = String::new();
    config.answer.fallback = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "answer.termination_marker"));
    assert!(result.errors.iter().any(|e| e.path == "answer.fallback"));
}

#[test]
fn test_shipped_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = crate::ConfigLoader::load(&path).unwrap();
    assert_eq!(config.agent.tools.len(), 3);
    assert_eq!(config.agent.script.len(), 3);

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
}
