//! Process-backed agent for Stepwise.
//!
//! Every turn spawns the configured command and talks to it over JSON lines:
//!
//! ```text
//! stdin  <- {"type":"start","input":"...","max_steps":20}
//! stdin  <- {"type":"step","step":1}
//! stdout -> {"content":"...","kind":"content","finished":false}
//! ```
//!
//! `kind` and `finished` are optional. The child is killed when the turn ends.

mod agent;
mod wire;

pub use agent::{ProcessAgent, ProcessAgentFactory};
pub use wire::{AgentCommand, StepReply};
