//! Tools the agent can call.
//!
//! A tool is a named operation with a JSON input schema and an async function
//! from arguments to text. The registry is a fixed, ordered list assembled
//! once when the agent is built.

mod web;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ToolsetMode;
use crate::llm::ToolDefinition;
use crate::search::SearchProvider;

pub use web::{crawl_website, extract_content, split_urls, CrawlWebsite, ExtractContent, WebSearch};

/// A tool exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// The research toolset: web search, site crawl and page extraction.
    pub fn research(
        provider: Arc<dyn SearchProvider>,
        mode: ToolsetMode,
        search_max_results: u32,
    ) -> Self {
        Self::new(vec![
            Arc::new(WebSearch::new(provider.clone(), mode, search_max_results)),
            Arc::new(CrawlWebsite::new(provider.clone(), mode)),
            Arc::new(ExtractContent::new(provider, mode)),
        ])
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters_schema()))
            .collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<String> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        tool.execute(args).await
    }
}

/// In-memory search provider for tests across the crate.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::search::{
        CrawlRequest, ExtractRequest, SearchError, SearchProvider, SearchRequest,
    };

    /// Records every request and answers with canned JSON, or fails every
    /// call when built with `failing`.
    #[derive(Default)]
    pub struct RecordingProvider {
        pub fail_with: Option<String>,
        pub searches: Mutex<Vec<SearchRequest>>,
        pub crawls: Mutex<Vec<CrawlRequest>>,
        pub extracts: Mutex<Vec<ExtractRequest>>,
    }

    impl RecordingProvider {
        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Default::default()
            }
        }

        fn outcome(&self, value: Value) -> Result<Value, SearchError> {
            match &self.fail_with {
                Some(msg) => Err(SearchError::Http(msg.clone())),
                None => Ok(value),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search(&self, req: &SearchRequest) -> Result<Value, SearchError> {
            self.searches.lock().unwrap().push(req.clone());
            self.outcome(json!({"query": req.query, "results": [{"url": "https://example.com", "title": "Example"}]}))
        }

        async fn crawl(&self, req: &CrawlRequest) -> Result<Value, SearchError> {
            self.crawls.lock().unwrap().push(req.clone());
            self.outcome(json!({"base_url": req.url, "results": []}))
        }

        async fn extract(&self, req: &ExtractRequest) -> Result<Value, SearchError> {
            self.extracts.lock().unwrap().push(req.clone());
            self.outcome(json!({"results": req.urls, "failed_results": []}))
        }
    }
}
