//! Tavily REST client.
//!
//! Every endpoint is a JSON `POST` with bearer auth. Non-2xx replies are
//! reported with the provider's own error detail when it sends one.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{CrawlRequest, ExtractRequest, SearchError, SearchProvider, SearchRequest};

/// Tavily REST client (`/search`, `/crawl`, `/extract`).
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl TavilyClient {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("research-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, SearchError> {
        let resp = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: provider_error_detail(&body),
            });
        }

        resp.json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))
    }
}

/// Pull the human-readable message out of a provider error body.
fn provider_error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/detail/error")
                .or_else(|| v.get("detail"))
                .or_else(|| v.get("error"))
                .and_then(|d| d.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().chars().take(300).collect())
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, req: &SearchRequest) -> Result<Value, SearchError> {
        tracing::debug!(query = %req.query, max_results = req.max_results, "tavily search");
        self.post("search", req).await
    }

    async fn crawl(&self, req: &CrawlRequest) -> Result<Value, SearchError> {
        tracing::debug!(url = %req.url, "tavily crawl");
        self.post("crawl", req).await
    }

    async fn extract(&self, req: &ExtractRequest) -> Result<Value, SearchError> {
        tracing::debug!(urls = ?req.urls, "tavily extract");
        self.post("extract", req).await
    }
}
