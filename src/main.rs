//! Research Agent - HTTP Server Entry Point
//!
//! Builds the agent once and starts the HTTP server. If the agent cannot be
//! built the server still starts and reports itself unhealthy.

use research_agent::{api, config, ResearchAgent, ServerConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment, including RUST_LOG
    let dotenv_path = config::load_dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv_path {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring .env: {}", e),
    }

    let server = ServerConfig::from_env()?;

    info!("Initializing AI Research Agent...");
    let agent = match ResearchAgent::from_env() {
        Ok(agent) => {
            info!("Agent initialized successfully: model={}", agent.model());
            Some(agent)
        }
        Err(e) => {
            error!("Failed to initialize agent: {}", e);
            None
        }
    };

    info!("Starting server on {}", server.addr());
    api::serve(server, agent).await?;

    Ok(())
}
