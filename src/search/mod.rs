//! Hosted web search, crawl and extract.
//!
//! The agent's tools only see the `SearchProvider` trait; `TavilyClient` is
//! the production implementation.

mod tavily;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use tavily::TavilyClient;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    Decode(String),
}

/// Parameters of one web search.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: u32) -> Self {
        Self {
            query: query.into(),
            max_results,
            topic: None,
            time_range: None,
        }
    }
}

/// Parameters of a site crawl starting at `url`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Parameters of a content extraction over known URLs.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExtractRequest {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_depth: Option<String>,
}

/// A hosted search/crawl/extract API.
///
/// Responses are passed through as opaque JSON; the agent only ever renders
/// them as text for the model.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, req: &SearchRequest) -> Result<Value, SearchError>;

    async fn crawl(&self, req: &CrawlRequest) -> Result<Value, SearchError>;

    async fn extract(&self, req: &ExtractRequest) -> Result<Value, SearchError>;
}
