//! Web access tools: search, crawl and extract through the hosted provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::config::ToolsetMode;
use crate::search::{CrawlRequest, ExtractRequest, SearchProvider, SearchRequest};

/// Crawl a site and return the provider's response as text.
///
/// Never fails: a provider error comes back as
/// `"Crawl failed for {url}: {error}"`.
pub async fn crawl_website(provider: &dyn SearchProvider, req: &CrawlRequest) -> String {
    match provider.crawl(req).await {
        Ok(value) => render(&value),
        Err(e) => {
            tracing::warn!(url = %req.url, "Crawl failed: {}", e);
            format!("Crawl failed for {}: {}", req.url, e)
        }
    }
}

/// Extract the content of one URL or a comma-separated list of URLs.
///
/// Never fails: a provider error comes back as
/// `"Extract failed for {urls}: {error}"` with `urls` exactly as given.
pub async fn extract_content(
    provider: &dyn SearchProvider,
    urls: &str,
    extract_depth: Option<&str>,
) -> String {
    let req = ExtractRequest {
        urls: split_urls(urls),
        extract_depth: extract_depth.map(str::to_string),
    };
    match provider.extract(&req).await {
        Ok(value) => render(&value),
        Err(e) => {
            tracing::warn!(urls = %urls, "Extract failed: {}", e);
            format!("Extract failed for {}: {}", urls, e)
        }
    }
}

/// Split a comma-separated URL list, trimming entries and dropping empty ones.
pub fn split_urls(urls: &str) -> Vec<String> {
    urls.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

fn optional_u32(args: &Value, key: &str) -> Option<u32> {
    args[key].as_u64().and_then(|n| u32::try_from(n).ok())
}

/// Search the web through the provider.
pub struct WebSearch {
    provider: Arc<dyn SearchProvider>,
    mode: ToolsetMode,
    max_results: u32,
}

impl WebSearch {
    pub fn new(provider: Arc<dyn SearchProvider>, mode: ToolsetMode, max_results: u32) -> Self {
        Self {
            provider,
            mode,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for relevant pages. Returns semantically ranked results with titles, URLs and content snippets. Use for finding sources and current information."
    }

    fn parameters_schema(&self) -> Value {
        match self.mode {
            ToolsetMode::Direct => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
            ToolsetMode::Native => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "time_range": {
                        "type": "string",
                        "enum": ["day", "week", "month", "year"],
                        "description": "Only return results published within this range"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = required_str(&args, "query")?;

        let mut req = SearchRequest::new(query, self.max_results);
        if self.mode == ToolsetMode::Native {
            req.topic = Some("general".to_string());
            req.time_range = args["time_range"].as_str().map(str::to_string);
        }

        let value = self
            .provider
            .search(&req)
            .await
            .map_err(|e| anyhow::anyhow!("Search failed for {}: {}", query, e))?;
        Ok(render(&value))
    }
}

/// Crawl a website starting from a base URL.
pub struct CrawlWebsite {
    provider: Arc<dyn SearchProvider>,
    mode: ToolsetMode,
}

impl CrawlWebsite {
    pub fn new(provider: Arc<dyn SearchProvider>, mode: ToolsetMode) -> Self {
        Self { provider, mode }
    }
}

#[async_trait]
impl Tool for CrawlWebsite {
    fn name(&self) -> &str {
        "crawl_website"
    }

    fn description(&self) -> &str {
        match self.mode {
            ToolsetMode::Direct => "Crawl a website comprehensively. Provide just the URL.",
            ToolsetMode::Native => {
                "Explore a website's structure and gather content from linked pages. Start shallow and raise max_depth only when needed."
            }
        }
    }

    fn parameters_schema(&self) -> Value {
        match self.mode {
            ToolsetMode::Direct => json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The base URL to crawl"
                    }
                },
                "required": ["url"]
            }),
            ToolsetMode::Native => json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The base URL to crawl"
                    },
                    "max_depth": {
                        "type": "integer",
                        "description": "How many links deep to follow from the base URL"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of pages to return"
                    },
                    "instructions": {
                        "type": "string",
                        "description": "Natural-language guidance on which pages to focus on"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let mut req = CrawlRequest::new(required_str(&args, "url")?);
        if self.mode == ToolsetMode::Native {
            req.max_depth = optional_u32(&args, "max_depth");
            req.limit = optional_u32(&args, "limit");
            req.instructions = args["instructions"].as_str().map(str::to_string);
        }
        Ok(crawl_website(self.provider.as_ref(), &req).await)
    }
}

/// Extract full page content from known URLs.
pub struct ExtractContent {
    provider: Arc<dyn SearchProvider>,
    mode: ToolsetMode,
}

impl ExtractContent {
    pub fn new(provider: Arc<dyn SearchProvider>, mode: ToolsetMode) -> Self {
        Self { provider, mode }
    }
}

#[async_trait]
impl Tool for ExtractContent {
    fn name(&self) -> &str {
        "extract_content"
    }

    fn description(&self) -> &str {
        "Extract content from specific web pages. Provide URL or comma-separated URLs."
    }

    fn parameters_schema(&self) -> Value {
        match self.mode {
            ToolsetMode::Direct => json!({
                "type": "object",
                "properties": {
                    "urls": {
                        "type": "string",
                        "description": "A URL, or several URLs separated by commas"
                    }
                },
                "required": ["urls"]
            }),
            ToolsetMode::Native => json!({
                "type": "object",
                "properties": {
                    "urls": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "The URLs to extract"
                    }
                },
                "required": ["urls"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        // Models do not always honour the schema: accept a list or a string in both modes.
        let urls = match &args["urls"] {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(","),
            _ => required_str(&args, "urls")?.to_string(),
        };
        if split_urls(&urls).is_empty() {
            anyhow::bail!("Missing 'urls' argument");
        }

        let depth = match self.mode {
            ToolsetMode::Direct => None,
            ToolsetMode::Native => Some("advanced"),
        };
        Ok(extract_content(self.provider.as_ref(), &urls, depth).await)
    }
}
