//! Research endpoints: the form page, form submission, JSON submission and
//! health check.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use super::routes::AppState;
use super::types::{AskForm, AskRequest, AskResponse, ErrorResponse, HealthResponse};

const EMPTY_PROMPT_MESSAGE: &str = "Please enter a research question.";
const AGENT_UNAVAILABLE_MESSAGE: &str = "Error: Agent not available. Check your API keys.";
const INVALID_PROMPT_MESSAGE: &str = "Please provide a valid prompt";

/// GET / - The form page.
pub async fn home(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    state.pages.index(None, None)
}

/// POST /ask - Run the agent on a form-submitted prompt and render the page.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AskForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let prompt = form.prompt.trim();

    if prompt.is_empty() {
        return state.pages.index(Some(prompt), Some(EMPTY_PROMPT_MESSAGE));
    }

    let Some(agent) = state.agent.as_ref() else {
        return state.pages.index(Some(prompt), Some(AGENT_UNAVAILABLE_MESSAGE));
    };

    let span = tracing::info_span!("ask", request_id = %Uuid::new_v4());
    let result = async {
        tracing::info!("Processing query: {}...", preview(prompt, 50));
        let result = agent.run(prompt).await;
        tracing::info!("Query completed");
        result
    }
    .instrument(span)
    .await;

    state.pages.index(Some(prompt), Some(result.as_str()))
}

/// POST /ask_async - Run the agent on a JSON prompt and return JSON.
///
/// Unreadable bodies get the same 400 as a blank prompt.
pub async fn ask_async(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!("Rejected /ask_async body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, INVALID_PROMPT_MESSAGE);
        }
    };
    let prompt = req.prompt.as_deref().unwrap_or_default().trim();

    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, INVALID_PROMPT_MESSAGE);
    }

    let Some(agent) = state.agent.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Agent not available");
    };

    let span = tracing::info_span!("ask_async", request_id = %Uuid::new_v4());
    match agent.try_run(prompt).instrument(span).await {
        Ok(result) => Json(AskResponse {
            result,
            cached: false,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Error processing query: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// GET /health - 200 when the agent initialized, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = if state.agent.is_some() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
        }),
    )
}

fn error_response(code: StatusCode, message: &str) -> Response {
    (
        code,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
