use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::groq::{GroqClient, GroqError};
use crate::AppState;

use super::models::{AskRequest, AskResponse};

pub const NO_QUESTION: &str = "No question provided";

/// `POST /api/groq/ask-groq/`
///
/// Only a missing question is a client error. Every other failure, an
/// unparseable body included, is a 500 carrying the error text.
pub async fn ask_groq(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AskResponse>, ApiError> {
    let request = if is_form(&headers) {
        parse_form(&body)
    } else {
        parse_json(&body)?
    };
    let Some(question) = question_text(request.question)? else {
        return Err(ApiError::BadRequest(NO_QUESTION.to_string()));
    };

    let api_key = state
        .groq
        .resolve_api_key()
        .ok_or_else(|| GroqError::MissingApiKey(state.groq.api_key_var.clone()))
        .inspect_err(|err| warn!(error = %err, "chat relay not configured"))?;

    let client = GroqClient::new(&state.http, &state.groq.base_url, api_key);
    let response = client
        .chat_completion(&question)
        .await
        .inspect_err(|err| warn!(error = %err, "groq chat completion failed"))?;

    info!(
        question_len = question.len(),
        response_len = response.len(),
        "groq chat completion relayed"
    );

    Ok(Json(AskResponse { response }))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Repeated keys resolve to the last value.
fn parse_form(body: &[u8]) -> AskRequest {
    let question = form_urlencoded::parse(body)
        .filter(|(key, _)| key == "question")
        .last()
        .map(|(_, value)| Value::String(value.into_owned()));
    AskRequest { question }
}

fn parse_json(body: &[u8]) -> Result<AskRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AskRequest::default());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Internal(format!("JSON parse error - {e}")))?;
    match value {
        Value::Object(mut fields) => Ok(AskRequest {
            question: fields.remove("question"),
        }),
        other => Err(ApiError::Internal(format!(
            "JSON body must be an object, got {}",
            kind(&other)
        ))),
    }
}

/// Falsy values (`null`, `false`, `0`, `""`, `[]`, `{}`) count as missing.
fn question_text(question: Option<Value>) -> Result<Option<String>, ApiError> {
    match question {
        None | Some(Value::Null | Value::Bool(false)) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text).filter(|text| !text.is_empty())),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(Value::Object(fields)) if fields.is_empty() => Ok(None),
        Some(other) => Err(ApiError::Internal(format!(
            "question must be a string, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
