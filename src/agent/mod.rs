//! Agent module - the core agent logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Start the conversation with the user's prompt
//! 2. Call the model with the available tools
//! 3. If the model requests tool calls, run them in order and feed the results back
//! 4. Repeat until the model answers in plain text or the iteration cap is reached

mod agent_loop;
mod conversation;
mod prompt;

pub use agent_loop::{Agent, AgentError, RunOutcome, DEFAULT_MAX_ITERATIONS};
pub use conversation::Conversation;
pub use prompt::build_system_prompt;
