//! Agent module - the core control loop.
//!
//! One turn alternates between two phases:
//! 1. Model consultation: send the full history, parse tool directives out of
//!    the response
//! 2. Tool execution: resolve every pending tool call in order, append the
//!    results as tool messages
//!
//! A continuation policy then decides whether to loop again or finalize the
//! turn. The iteration ceiling is the only bound on total work per turn.

mod agent_loop;
mod directive;
mod prompt;
mod state;

pub use agent_loop::Agent;
pub use directive::{extract_directives, Directive};
pub use prompt::build_system_prompt;
pub use state::{AgentState, Message, MessageRole, ToolCall};
