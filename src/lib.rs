//! # Research Agent
//!
//! A small web service that answers research questions with an LLM agent
//! backed by hosted web search, crawl and extract tools.
//!
//! This library provides:
//! - An HTTP front end (HTML form and JSON endpoint) for submitting questions
//! - A tool-calling agent loop over any OpenAI-compatible chat endpoint
//! - Tavily-backed search, crawl and extract tools
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a question via the API
//! 2. Build context with the system prompt and the available tools
//! 3. Call the LLM, execute any tool calls it requests
//! 4. Feed results back to the LLM, repeat until it produces an answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use research_agent::agent::ResearchAgent;
//!
//! let agent = ResearchAgent::from_env()?;
//! let answer = agent.run("What changed in the latest Rust release?").await;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod search;
pub mod tools;

pub use agent::ResearchAgent;
pub use config::{AgentConfig, ServerConfig};
