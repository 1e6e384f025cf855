//! Router, shared state and server startup.

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::page::PageRenderer;
use super::research;
use crate::agent::ResearchAgent;
use crate::config::ServerConfig;

/// State shared by all handlers.
///
/// `agent` is `None` when construction failed at startup; every handler then
/// reports the agent as unavailable instead of failing the process.
pub struct AppState {
    pub agent: Option<Arc<ResearchAgent>>,
    pub pages: PageRenderer,
}

impl AppState {
    pub fn new(agent: Option<Arc<ResearchAgent>>) -> anyhow::Result<Self> {
        Ok(Self {
            agent,
            pages: PageRenderer::new()?,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(research::home))
        .route("/ask", post(research::ask))
        .route("/ask_async", post(research::ask_async))
        .route("/health", get(research::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C / SIGTERM.
pub async fn serve(config: ServerConfig, agent: Option<ResearchAgent>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(agent.map(Arc::new))?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use crate::agent::testing::ScriptedLlm;
    use crate::config::AgentConfig;
    use crate::tools::testing::RecordingProvider;

    fn app_with(llm: Arc<ScriptedLlm>) -> Router {
        let config = AgentConfig::from_lookup(|key| match key {
            "LLM_API_BASE_URL" => Some("http://localhost:8000/v1".to_string()),
            "MODEL_NAME" => Some("scripted".to_string()),
            "LLM_API_KEY" => Some("sk-test".to_string()),
            "TAVILY_API_KEY" => Some("tvly-test".to_string()),
            _ => None,
        })
        .unwrap();
        let agent =
            ResearchAgent::with_clients(&config, llm, Arc::new(RecordingProvider::default()))
                .unwrap();
        router(Arc::new(AppState::new(Some(Arc::new(agent))).unwrap()))
    }

    fn degraded_app() -> Router {
        router(Arc::new(AppState::new(None).unwrap()))
    }

    fn post(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn is_json(response: &Response) -> bool {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"))
    }

    #[tokio::test]
    async fn home_page_is_served() {
        let response = degraded_app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"action="/ask""#));
    }

    #[tokio::test]
    async fn form_post_without_prompt_asks_for_one() {
        let llm = Arc::new(ScriptedLlm::answering("unused"));
        let response = app_with(llm.clone())
            .oneshot(post("/ask", Some("application/x-www-form-urlencoded"), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response)
            .await
            .contains("Please enter a research question."));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn form_post_renders_answer() {
        let response = app_with(Arc::new(ScriptedLlm::answering("Fusion record set.")))
            .oneshot(post(
                "/ask",
                Some("application/x-www-form-urlencoded"),
                "prompt=fusion+news",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("fusion news"));
        assert!(page.contains("Fusion record set."));
    }

    #[tokio::test]
    async fn json_post_returns_result() {
        let response = app_with(Arc::new(ScriptedLlm::answering("42")))
            .oneshot(post(
                "/ask_async",
                Some("application/json"),
                r#"{"prompt":"test"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(is_json(&response));
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, serde_json::json!({"result": "42", "cached": false}));
    }

    #[tokio::test]
    async fn unreadable_json_bodies_get_json_400() {
        let cases = [
            (Some("application/json"), r#"{"prompt":5}"#),
            (Some("application/json"), "not json"),
            (None, r#"{"prompt":"test"}"#),
            (Some("application/json"), r#"{"prompt":""}"#),
        ];

        for (content_type, body) in cases {
            let llm = Arc::new(ScriptedLlm::answering("unused"));
            let response = app_with(llm.clone())
                .oneshot(post("/ask_async", content_type, body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            assert!(is_json(&response), "body: {}", body);
            let value: serde_json::Value =
                serde_json::from_str(&body_text(response).await).unwrap();
            assert_eq!(value["error"], "Please provide a valid prompt");
            assert!(llm.calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn health_tracks_agent_state() {
        let response = app_with(Arc::new(ScriptedLlm::new(vec![])))
            .oneshot(get("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#""status":"healthy""#));

        let response = degraded_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_text(response).await.contains(r#""status":"unhealthy""#));
    }

    #[tokio::test]
    async fn routes_reject_wrong_methods() {
        let response = degraded_app().oneshot(get("/ask")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = degraded_app().oneshot(get("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
