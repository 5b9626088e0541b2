//! The gateway's route table.
//!
//! | prefix         | target                          |
//! |----------------|---------------------------------|
//! | `/admin/`      | admin sub-application           |
//! | `/api/`        | auth sub-application            |
//! | `/api/insect/` | insect model sub-application    |
//! | `/api/plant/`  | plant disease sub-application   |
//! | `/api/groq/`   | chatbot (served here)           |
//!
//! Static segments take precedence over the `/api/` catch-all, so the more
//! specific prefixes always win.

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::forward::{forward, SubApp};
use crate::AppState;

pub fn build_app(state: Arc<AppState>) -> Router {
    let http = state.forward_http.clone();
    let upstreams = state.upstreams.clone();

    Router::new()
        .route("/health", get(health))
        .nest("/api/groq", api::router(state))
        .merge(mount("/admin", SubApp::new("admin", upstreams.admin, http.clone())))
        .merge(mount("/api", SubApp::new("auth", upstreams.auth, http.clone())))
        .merge(mount("/api/insect", SubApp::new("insect", upstreams.insect, http.clone())))
        .merge(mount("/api/plant", SubApp::new("plant", upstreams.plant, http)))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
}

/// Routes `prefix`, `prefix/` and everything below it to `app`.
fn mount(prefix: &str, app: SubApp) -> Router {
    let handler = any(forward);
    Router::new()
        .route(prefix, handler.clone())
        .route(&format!("{prefix}/"), handler.clone())
        .route(&format!("{prefix}/{{*rest}}"), handler)
        .with_state(Arc::new(app))
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
