//! HTTP API: the form page, form and JSON submission, and health check.

mod page;
mod research;
mod routes;
pub mod types;

pub use page::PageRenderer;
pub use routes::{router, serve, AppState};
