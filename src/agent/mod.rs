//! Agent module - the research agent and its reasoning loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with the system prompt and the user's question
//! 2. Call the LLM with the web tools attached
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM produces a final answer or max iterations is reached

mod agent_loop;
mod error;
mod prompt;

pub use agent_loop::ResearchAgent;
pub use error::AgentError;
pub use prompt::{format_date, SystemPrompt};

#[cfg(test)]
pub(crate) use agent_loop::testing;
