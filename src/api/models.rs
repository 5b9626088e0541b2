use serde::Serialize;
use serde_json::Value;

/// Body of `POST /api/groq/ask-groq/`. The question is kept loosely typed:
/// any falsy value counts as missing, anything else must be a string.
#[derive(Debug, Default)]
pub struct AskRequest {
    pub question: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
