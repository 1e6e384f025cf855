//! OpenAI-compatible `/chat/completions` client.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ChatMessage, ChatResponse, LlmClient, ToolCall, ToolDefinition, Usage};

/// Client for any endpoint speaking the OpenAI chat-completions protocol
/// (vLLM, OpenShift AI model serving, OpenAI itself, ...).
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatClient {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("research-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the model endpoint")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint_chat_completions(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse> {
        let tools = tools.filter(|t| !t.is_empty());
        let req = ChatCompletionsRequest {
            model: &self.model,
            messages,
            tool_choice: tools.map(|_| "auto"),
            tools,
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(self.endpoint_chat_completions())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat.completions request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "chat.completions HTTP {}: {}",
                status,
                truncate(&body, 500)
            );
        }

        let parsed: ChatCompletionsResponse = resp
            .json()
            .await
            .context("Invalid chat.completions response body")?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("chat.completions returned no choices"))?;

        Ok(ChatResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
            finish_reason: choice.finish_reason,
            usage: parsed.usage,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut idx = max;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    &s[..idx]
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}
