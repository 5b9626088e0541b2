//! Minimal client for Groq's OpenAI-compatible chat-completions endpoint.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const MODEL: &str = "llama-3.3-70b-versatile";
const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

#[derive(Debug, Error)]
pub enum GroqError {
    #[error("the Groq API key is not set: export {0} or pin a key in the configuration")]
    MissingApiKey(String),
    #[error("failed to reach Groq: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Error code: {code} - {message}", code = .status.as_u16())]
    Status { status: StatusCode, message: String },
    #[error("failed to decode Groq response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Groq returned no completion choices")]
    NoChoices,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct GroqClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    api_key: String,
}

impl<'a> GroqClient<'a> {
    pub fn new(http: &'a Client, base_url: &'a str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Sends `question` as a single user message and returns the text of the
    /// first choice. A `null` content comes back as an empty string.
    pub async fn chat_completion(&self, question: &str) -> Result<String, GroqError> {
        let url = format!("{}{COMPLETIONS_PATH}", self.base_url.trim_end_matches('/'));
        let payload = CompletionRequest {
            model: MODEL,
            messages: [Message {
                role: "user",
                content: question,
            }],
        };

        debug!(%url, model = MODEL, "sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(GroqError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(GroqError::Transport)?;

        if !status.is_success() {
            return Err(GroqError::Status {
                status,
                message: error_message(&body),
            });
        }

        first_choice(&body)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn first_choice(body: &str) -> Result<String, GroqError> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(GroqError::Decode)?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(GroqError::NoChoices)
}
