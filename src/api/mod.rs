mod handlers;
mod models;

use std::sync::Arc;

use axum::{routing::post, Router};

use crate::AppState;

pub use handlers::{ask_groq, NO_QUESTION};
pub use models::{AskRequest, AskResponse, ErrorResponse};

/// Chatbot routes, nested under `/api/groq`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask-groq/", post(ask_groq))
        .with_state(state)
}
