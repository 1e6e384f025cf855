use thiserror::Error;

use crate::config::ConfigError;
use crate::search::SearchError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build client: {0}")]
    Client(String),

    #[error("Prompt template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("LLM error: {0:#}")]
    Llm(anyhow::Error),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("Max iterations ({0}) reached without a final answer")]
    MaxIterations(usize),
}

impl From<SearchError> for AgentError {
    fn from(e: SearchError) -> Self {
        Self::Client(e.to_string())
    }
}
