//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::llm::{ChatMessage, LlmClient, OpenAiCompatClient, Role, ToolCall};
use crate::search::{SearchProvider, TavilyClient};
use crate::tools::ToolRegistry;

use super::error::AgentError;
use super::prompt::SystemPrompt;

/// The research agent.
///
/// Built once at process start and shared by every request. Nothing in it
/// is mutated after construction, so concurrent runs need no locking.
pub struct ResearchAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    prompt: SystemPrompt,
    max_iterations: usize,
}

impl ResearchAgent {
    /// Build the agent from environment configuration.
    pub fn from_env() -> Result<Self, AgentError> {
        let config = AgentConfig::from_env()?;
        Self::new(&config)
    }

    /// Build the agent: model client, then the toolset, then the prompt.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        tracing::info!(
            "Connecting to model '{}' at endpoint: {}",
            config.model_name,
            config.llm_api_base_url
        );
        let llm = OpenAiCompatClient::new(
            config.llm_api_base_url.clone(),
            config.llm_api_key.clone(),
            config.model_name.clone(),
            config.http_timeout,
        )
        .map_err(|e| AgentError::Client(e.to_string()))?
        .with_temperature(config.temperature);

        let search = TavilyClient::new(
            config.tavily_base_url.clone(),
            config.tavily_api_key.clone(),
            config.http_timeout,
        )?;

        Self::with_clients(config, Arc::new(llm), Arc::new(search))
    }

    /// Build the agent around caller-supplied clients.
    pub fn with_clients(
        config: &AgentConfig,
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
    ) -> Result<Self, AgentError> {
        let tools =
            ToolRegistry::research(search.clone(), config.toolset, config.search_max_results);
        let prompt = SystemPrompt::new(config.toolset)?;

        let tool_names: Vec<String> = tools.list_tools().into_iter().map(|t| t.name).collect();
        tracing::info!(
            provider = search.name(),
            toolset = ?config.toolset,
            tools = ?tool_names,
            "Research agent ready"
        );

        Ok(Self {
            llm,
            tools,
            prompt,
            max_iterations: config.max_iterations,
        })
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Answer a query. Always returns text: failures come back as
    /// `"Error: {reason}"`.
    pub async fn run(&self, query: &str) -> String {
        match self.try_run(query).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("An error occurred while running the agent: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    /// Answer a query, reporting failures to the caller.
    pub async fn try_run(&self, query: &str) -> Result<String, AgentError> {
        tracing::info!("Running agent with query: {}", truncate_for_log(query, 200));

        let today = chrono::Local::now().date_naive();
        let system_prompt = self.prompt.render(today, &self.tools)?;
        let mut messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(query)];

        let tool_schemas = self.tools.get_tool_schemas();

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let response = self
                .llm
                .chat_completion(&messages, Some(tool_schemas.as_slice()))
                .await
                .map_err(AgentError::Llm)?;

            if let Some(usage) = &response.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                    "LLM usage"
                );
            }

            if let Some(tool_calls) = response.tool_calls.filter(|calls| !calls.is_empty()) {
                if let Some(thought) = response.content.as_deref().filter(|c| !c.trim().is_empty()) {
                    tracing::info!("Thought: {}", truncate_for_log(thought, 1000));
                }

                messages.push(ChatMessage {
                    role: Role::Assistant,
                    content: response.content,
                    tool_calls: Some(tool_calls.clone()),
                    tool_call_id: None,
                });

                for tool_call in &tool_calls {
                    tracing::info!(
                        "Calling tool: {} with args: {}",
                        tool_call.function.name,
                        tool_call.function.arguments
                    );

                    let result_str = match self.execute_tool_call(tool_call).await {
                        Ok(output) => output,
                        Err(e) => format!("Error: {}", e),
                    };

                    tracing::info!(
                        "Observation from {}: {}",
                        tool_call.function.name,
                        truncate_for_log(&result_str, 1000)
                    );

                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result_str));
                }

                continue;
            }

            // No tool calls - this is the final response
            return match response.content.filter(|c| !c.trim().is_empty()) {
                Some(content) => {
                    tracing::info!("Final answer: {}", truncate_for_log(&content, 2000));
                    Ok(content)
                }
                None => Err(AgentError::EmptyResponse),
            };
        }

        Err(AgentError::MaxIterations(self.max_iterations))
    }

    /// Execute a single tool call.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> anyhow::Result<String> {
        let args: serde_json::Value = serde_json::from_str(&tool_call.function.arguments)
            .unwrap_or_else(|_| serde_json::json!({}));

        self.tools.execute(&tool_call.function.name, args).await
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut idx = max_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    format!("{}... [truncated]", &s[..idx])
}


#[cfg(test)]
mod tests {
    use super::testing::{answer, call_tool, ScriptedLlm};
    use super::*;
    use crate::config::AgentConfig;
    use crate::tools::testing::RecordingProvider;

    fn config(max_iterations: usize) -> AgentConfig {
        let mut config = AgentConfig::from_lookup(|key| match key {
            "LLM_API_BASE_URL" => Some("http://localhost:8000/v1".to_string()),
            "MODEL_NAME" => Some("scripted".to_string()),
            "LLM_API_KEY" => Some("sk-test".to_string()),
            "TAVILY_API_KEY" => Some("tvly-test".to_string()),
            _ => None,
        })
        .unwrap();
        config.max_iterations = max_iterations;
        config
    }

    fn agent(llm: Arc<ScriptedLlm>, search: Arc<RecordingProvider>) -> ResearchAgent {
        ResearchAgent::with_clients(&config(4), llm, search).unwrap()
    }

    #[tokio::test]
    async fn single_turn_answer() {
        let llm = Arc::new(ScriptedLlm::answering("Rust 1.0 shipped in 2015."));
        let agent = agent(llm.clone(), Arc::new(RecordingProvider::default()));

        let out = agent.run("When did Rust 1.0 ship?").await;
        assert_eq!(out, "Rust 1.0 shipped in 2015.");

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].role, Role::System);
        assert!(calls[0][0].content.as_deref().unwrap().contains("Today's Date"));
        assert_eq!(calls[0][1].role, Role::User);
        assert_eq!(calls[0][1].content.as_deref(), Some("When did Rust 1.0 ship?"));
    }

    #[tokio::test]
    async fn tool_call_then_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(call_tool("call_1", "extract_content", r#"{"urls":"a.com,b.com"}"#)),
            Ok(answer("Both pages agree [a.com].")),
        ]));
        let search = Arc::new(RecordingProvider::default());
        let agent = agent(llm.clone(), search.clone());

        let out = agent.try_run("compare a and b").await.unwrap();
        assert_eq!(out, "Both pages agree [a.com].");
        assert_eq!(search.extracts.lock().unwrap()[0].urls, vec!["a.com", "b.com"]);

        let calls = llm.calls.lock().unwrap();
        let second = &calls[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn tool_failures_are_observations_not_errors() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(call_tool("call_1", "crawl_website", r#"{"url":"https://a.com"}"#)),
            Ok(call_tool("call_2", "delete_files", "{}")),
            Ok(call_tool("call_3", "web_search", "not json")),
            Ok(answer("Could not reach the site.")),
        ]));
        let agent = agent(llm.clone(), Arc::new(RecordingProvider::failing("timed out")));

        let out = agent.try_run("what is on a.com?").await.unwrap();
        assert_eq!(out, "Could not reach the site.");

        let calls = llm.calls.lock().unwrap();
        let observation = |i: usize| calls[3][i].content.clone().unwrap();
        assert!(observation(3).starts_with("Crawl failed for https://a.com"));
        assert_eq!(observation(5), "Error: Unknown tool: delete_files");
        assert_eq!(observation(7), "Error: Missing 'query' argument");
    }

    #[tokio::test]
    async fn llm_failure_is_reported_as_text_by_run() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(anyhow::anyhow!("connection refused"))]));
        let agent = agent(llm, Arc::new(RecordingProvider::default()));
        assert_eq!(
            agent.run("anything").await,
            "Error: LLM error: connection refused"
        );
    }

    #[tokio::test]
    async fn empty_final_message_is_an_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(answer("   "))]));
        let agent = agent(llm, Arc::new(RecordingProvider::default()));
        assert!(matches!(
            agent.try_run("anything").await,
            Err(AgentError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn stops_after_max_iterations() {
        let looping = (0..10)
            .map(|i| Ok(call_tool(&format!("call_{}", i), "web_search", r#"{"query":"again"}"#)))
            .collect();
        let llm = Arc::new(ScriptedLlm::new(looping));
        let search = Arc::new(RecordingProvider::default());
        let agent = agent(llm.clone(), search.clone());

        let err = agent.try_run("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(4)));
        assert_eq!(llm.calls.lock().unwrap().len(), 4);
        assert_eq!(search.searches.lock().unwrap().len(), 4);
    }

    #[test]
    fn truncate_for_log_marks_cut() {
        assert_eq!(truncate_for_log("abcdef", 3), "abc... [truncated]");
        assert_eq!(truncate_for_log("abc", 3), "abc");
    }
}
