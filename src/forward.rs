//! Delegation of sub-application prefixes to the services that implement them.
//!
//! The gateway does not know anything about admin, auth, insect or plant
//! endpoints. Requests under those prefixes are relayed as-is, full path and
//! query included, to the configured upstream base URL.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use reqwest::{redirect::Policy, Client};
use tracing::{debug, error};

use crate::error::ApiError;

/// Largest request body relayed to a sub-application.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn should_forward_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    !HOP_BY_HOP_HEADERS.contains(&lower.as_str())
}

fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| should_forward_header(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Client for sub-application traffic. Redirects are handed back to the
/// caller untouched so `Location` and `Set-Cookie` reach the browser.
pub fn client() -> reqwest::Result<Client> {
    Client::builder().redirect(Policy::none()).build()
}

/// An externally served sub-application mounted under a path prefix.
#[derive(Debug, Clone)]
pub struct SubApp {
    pub name: &'static str,
    pub upstream: Option<String>,
    pub http: Client,
}

impl SubApp {
    pub fn new(name: &'static str, upstream: Option<String>, http: Client) -> Self {
        Self {
            name,
            upstream: upstream.map(|url| url.trim_end_matches('/').to_string()),
            http,
        }
    }
}

pub async fn forward(State(app): State<Arc<SubApp>>, request: Request) -> Response {
    match relay(&app, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn relay(app: &SubApp, request: Request) -> Result<Response, ApiError> {
    let Some(upstream) = app.upstream.as_deref() else {
        return Err(ApiError::Unavailable(format!(
            "{} sub-application is not configured",
            app.name
        )));
    };

    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
    let url = format!("{upstream}{path}");

    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            ApiError::PayloadTooLarge(format!(
                "Request body exceeds {MAX_BODY_BYTES} bytes"
            ))
        } else {
            ApiError::BadRequest(format!("Failed to read request body: {inner}"))
        }
    })?;

    debug!(sub_app = app.name, method = %parts.method, %url, "forwarding request");

    let upstream_response = app
        .http
        .request(parts.method, &url)
        .headers(filter_headers(&parts.headers))
        .body(body)
        .send()
        .await
        .map_err(|e| {
            error!(sub_app = app.name, %url, error = %e, "sub-application unreachable");
            ApiError::BadGateway(format!("{} sub-application unreachable: {e}", app.name))
        })?;

    let status = upstream_response.status();
    let headers = filter_headers(upstream_response.headers());
    let bytes = upstream_response.bytes().await.map_err(|e| {
        ApiError::BadGateway(format!(
            "Failed to read {} sub-application response: {e}",
            app.name
        ))
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
