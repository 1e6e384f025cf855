//! Configuration management for the research agent.
//!
//! Values come from the process environment, with a local `.env` file loaded
//! first (real environment variables win over the file).
//!
//! Required by the agent:
//! - `LLM_API_BASE_URL` - Base URL of an OpenAI-compatible chat endpoint.
//! - `MODEL_NAME` - Model identifier sent with every completion request.
//! - `LLM_API_KEY` - Bearer key for the model endpoint.
//! - `TAVILY_API_KEY` - Key for the hosted search/crawl/extract API.
//!
//! Optional:
//! - `HOST` / `PORT` - Bind address. Defaults to `0.0.0.0:8080`.
//! - `MAX_ITERATIONS` - Think/act/observe rounds per run. Defaults to `15`.
//! - `LLM_TEMPERATURE` - Sampling temperature. Defaults to `0`.
//! - `AGENT_TOOLSET` - `direct` (default) or `native`.
//! - `SEARCH_MAX_RESULTS` - Results per web search. Defaults to `5` (`10` for `native`).
//! - `HTTP_TIMEOUT_SECS` - Timeout for outbound HTTP calls. Defaults to `120`.
//! - `TAVILY_BASE_URL` - Search provider endpoint. Defaults to `https://api.tavily.com`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Names of the variables the agent cannot start without.
pub const REQUIRED_VARS: [&str; 4] = [
    "LLM_API_BASE_URL",
    "MODEL_NAME",
    "LLM_API_KEY",
    "TAVILY_API_KEY",
];

pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable(s): {}", .0.join(", "))]
    MissingEnvVar(Vec<String>),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to read {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Which flavour of crawl/extract tools the agent exposes to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolsetMode {
    /// Single-parameter tools routed through string-returning adapters.
    #[default]
    Direct,
    /// Richer schemas mirroring the provider's own tool options.
    Native,
}

impl FromStr for ToolsetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "native" | "provider" => Ok(Self::Native),
            other => Err(format!("expected 'direct' or 'native', got: {}", other)),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = non_empty(&lookup, "HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        Ok(Self { host, port })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Agent configuration: model endpoint, credentials and loop tuning.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the OpenAI-compatible endpoint
    pub llm_api_base_url: Url,

    /// Model identifier
    pub model_name: String,

    /// Model endpoint key
    pub llm_api_key: String,

    /// Search provider key
    pub tavily_api_key: String,

    /// Search provider endpoint
    pub tavily_base_url: Url,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Sampling temperature sent with every completion request
    pub temperature: f32,

    pub toolset: ToolsetMode,

    /// Results returned by one web search
    pub search_max_results: u32,

    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` listing every required variable
    /// that is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|key| non_empty(&lookup, key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVar(missing));
        }

        let required = |key: &str| non_empty(&lookup, key).unwrap_or_default();

        let llm_api_base_url = parse_url("LLM_API_BASE_URL", &required("LLM_API_BASE_URL"))?;
        let tavily_base_url = parse_url(
            "TAVILY_BASE_URL",
            &non_empty(&lookup, "TAVILY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TAVILY_BASE_URL.to_string()),
        )?;

        let toolset = non_empty(&lookup, "AGENT_TOOLSET")
            .map(|v| {
                v.parse::<ToolsetMode>()
                    .map_err(|e| ConfigError::InvalidValue("AGENT_TOOLSET".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let default_results = match toolset {
            ToolsetMode::Direct => 5,
            ToolsetMode::Native => 10,
        };

        let max_iterations = parse_or(&lookup, "MAX_ITERATIONS", 15usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let temperature = parse_or(&lookup, "LLM_TEMPERATURE", 0.0f32)?;

        Ok(Self {
            llm_api_base_url,
            model_name: required("MODEL_NAME"),
            llm_api_key: required("LLM_API_KEY"),
            tavily_api_key: required("TAVILY_API_KEY"),
            tavily_base_url,
            max_iterations,
            temperature,
            toolset,
            search_max_results: parse_or(&lookup, "SEARCH_MAX_RESULTS", default_results)?,
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 120u64)?),
        })
    }
}

/// Load `.env` from the working directory into the process environment.
///
/// Returns the path that was loaded, if any. A missing file is not an error.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    load_dotenv_from(Path::new(".env"))
}

/// Load a dotenv file into the process environment. Variables that are
/// already set keep their values.
pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        Some(v) => v
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
