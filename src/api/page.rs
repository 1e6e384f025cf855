//! HTML rendering for the form page.

use axum::http::StatusCode;
use axum::response::Html;
use minijinja::{context, Environment};

const INDEX_TEMPLATE: &str = "index.html";
const INDEX_SOURCE: &str = include_str!("../../templates/index.html");

/// Renders the form page. The `.html` template name turns on auto-escaping,
/// so prompts and answers are always inserted as text.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, INDEX_SOURCE)?;
        Ok(Self { env })
    }

    /// Render the page, optionally with a submitted prompt and its result.
    pub fn index(
        &self,
        prompt: Option<&str>,
        result: Option<&str>,
    ) -> Result<Html<String>, (StatusCode, String)> {
        self.env
            .get_template(INDEX_TEMPLATE)
            .and_then(|t| {
                t.render(context! {
                    prompt => prompt.unwrap_or_default(),
                    result => result,
                })
            })
            .map(Html)
            .map_err(|e| {
                tracing::error!("Failed to render page: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render page: {}", e),
                )
            })
    }
}
