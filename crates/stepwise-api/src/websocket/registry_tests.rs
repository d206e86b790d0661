use super::*;
use stepwise_protocols::{AgentError, AgentState};
use stepwise_runtime::ScriptedAgentFactory;

struct BrokenFactory;

impl AgentFactory for BrokenFactory {
    fn create(&self, _max_steps: u32) -> Result<Box<dyn AgentRunner>, AgentError> {
        Err(AgentError::CreationFailed("no model configured".to_string()))
    }
}

fn registry(policy: DuplicatePolicy) -> SessionRegistry {
    let factory = Arc::new(ScriptedAgentFactory::new(vec!["hello".to_string()]));
    SessionRegistry::new(factory, 5, policy)
}

fn sender() -> (EventSender, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(16)
}

#[test]
fn test_connect_and_disconnect() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();

    let handle = registry.connect("client-1", tx).unwrap();
    assert!(registry.contains("client-1"));
    assert_eq!(registry.len(), 1);
    assert!(registry.is_current(&handle));

    registry.disconnect(&handle);
    assert!(!registry.contains("client-1"));
    assert!(registry.is_empty());
}

#[test]
fn test_double_disconnect_is_safe() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();

    registry.disconnect(&handle);
    registry.disconnect(&handle);
    assert!(registry.is_empty());
}

#[test]
fn test_duplicate_rejected() {
    let registry = registry(DuplicatePolicy::Reject);
    let (tx1, _rx1) = sender();
    let (tx2, _rx2) = sender();

    let first = registry.connect("client-1", tx1).unwrap();
    let second = registry.connect("client-1", tx2);
    assert!(matches!(second, Err(ApiError::DuplicateSession(_))));
    assert!(registry.is_current(&first));
}

#[tokio::test]
async fn test_duplicate_replaces_and_evicts() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx1, mut rx1) = sender();
    let (tx2, _rx2) = sender();

    let first = registry.connect("client-1", tx1).unwrap();
    let _agent = registry.create_agent(&first).unwrap();
    let token = registry.begin_run(&first);

    let second = registry.connect("client-1", tx2).unwrap();
    assert!(first.is_evicted());
    assert!(!second.is_evicted());
    assert!(token.is_cancelled());
    assert!(!registry.is_current(&first));
    assert!(registry.is_current(&second));

    // The old connection is told why it is being closed.
    assert!(matches!(rx1.recv().await, Some(ServerEvent::Error(_))));
    first.evicted().await;
}

#[test]
fn test_stale_disconnect_keeps_replacement() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx1, _rx1) = sender();
    let (tx2, _rx2) = sender();

    let first = registry.connect("client-1", tx1).unwrap();
    let second = registry.connect("client-1", tx2).unwrap();

    registry.disconnect(&first);
    assert!(registry.contains("client-1"));
    assert!(registry.is_current(&second));

    registry.disconnect(&second);
    assert!(!registry.contains("client-1"));
}

#[test]
fn test_create_agent_registers_status() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();
    assert!(!registry.has_agent("client-1"));

    let agent = registry.create_agent(&handle).unwrap();
    assert_eq!(agent.max_steps(), 5);
    assert!(registry.has_agent("client-1"));
}

#[test]
fn test_create_agent_failure_leaves_session_agentless() {
    let registry = SessionRegistry::new(Arc::new(BrokenFactory), 5, DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();

    let result = registry.create_agent(&handle);
    assert!(matches!(result, Err(ApiError::AgentCreation(_))));
    assert!(!registry.has_agent("client-1"));
    assert!(registry.contains("client-1"));
}

#[test]
fn test_create_agent_for_stale_handle_fails() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();
    registry.disconnect(&handle);

    assert!(matches!(
        registry.create_agent(&handle),
        Err(ApiError::Connection(_))
    ));
    assert!(registry.begin_run(&handle).is_cancelled());
}

#[test]
fn test_cancel_without_run() {
    let registry = registry(DuplicatePolicy::Replace);
    assert_eq!(registry.cancel("nobody"), CancelOutcome::NoActiveRun);

    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();
    let _agent = registry.create_agent(&handle).unwrap();
    assert_eq!(registry.cancel("client-1"), CancelOutcome::NoActiveRun);
}

#[test]
fn test_cancel_when_not_thinking_is_noop() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();
    let agent = registry.create_agent(&handle).unwrap();
    let token = registry.begin_run(&handle);
    agent.status().set(AgentState::Finished);

    assert_eq!(registry.cancel("client-1"), CancelOutcome::NotThinking);
    assert!(!token.is_cancelled());
    assert_eq!(agent.status().get(), AgentState::Finished);
}

#[test]
fn test_cancel_thinking_run() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();
    let agent = registry.create_agent(&handle).unwrap();
    let token = registry.begin_run(&handle);
    agent.status().set(AgentState::Thinking);
    assert!(registry.is_running("client-1"));

    assert_eq!(registry.cancel("client-1"), CancelOutcome::Cancelled);
    assert!(token.is_cancelled());
    assert_eq!(agent.status().get(), AgentState::Cancelled);

    registry.finish_run(&handle);
    assert!(!registry.is_running("client-1"));
    assert_eq!(registry.cancel("client-1"), CancelOutcome::NoActiveRun);
}

#[test]
fn test_disconnect_cancels_active_run() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx, _rx) = sender();
    let handle = registry.connect("client-1", tx).unwrap();
    let agent = registry.create_agent(&handle).unwrap();
    let token = registry.begin_run(&handle);
    agent.status().set(AgentState::Thinking);

    registry.disconnect(&handle);
    assert!(token.is_cancelled());
    assert_eq!(agent.status().get(), AgentState::Cancelled);
    assert!(!registry.contains("client-1"));
}

#[test]
fn test_list_sessions() {
    let registry = registry(DuplicatePolicy::Replace);
    let (tx1, _rx1) = sender();
    let (tx2, _rx2) = sender();
    let first = registry.connect("a", tx1).unwrap();
    registry.connect("b", tx2).unwrap();
    registry.begin_run(&first);

    let sessions = registry.list();
    assert_eq!(sessions.len(), 2);
    let a = sessions.iter().find(|s| s.id == "a").unwrap();
    assert!(a.running);
    let b = sessions.iter().find(|s| s.id == "b").unwrap();
    assert!(!b.running);
}
