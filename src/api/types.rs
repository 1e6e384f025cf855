//! API request and response types.

use serde::{Deserialize, Serialize};

/// Form body of `POST /ask`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskForm {
    /// The research question
    #[serde(default)]
    pub prompt: String,
}

/// JSON body of `POST /ask_async`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Successful `POST /ask_async` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// The agent's final answer
    pub result: String,

    /// Always false; responses are never cached
    pub cached: bool,
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `healthy` when the agent initialized, else `unhealthy`
    pub status: String,
}
