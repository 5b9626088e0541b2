use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agro_gateway::{build_app, AppState, GroqConfig, Upstreams};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode as AxumStatus},
    routing::post,
    Json, Router,
};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const UNSET_KEY_VAR: &str = "AGRO_GATEWAY_TEST_UNSET_GROQ_KEY";

#[derive(Clone, Default)]
struct MockGroq {
    hits: Arc<AtomicUsize>,
}

async fn mock_completion(
    State(mock): State<MockGroq>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (AxumStatus, Json<Value>) {
    mock.hits.fetch_add(1, Ordering::SeqCst);

    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer gsk_test") {
        return (
            AxumStatus::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid API Key", "type": "invalid_request_error"}})),
        );
    }

    let question = body["messages"][0]["content"].as_str().unwrap_or_default();
    if question == "explode" {
        return (
            AxumStatus::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"message": "over capacity"}})),
        );
    }

    (
        AxumStatus::OK,
        Json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": body["model"],
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": format!("{} says {question}", body["model"].as_str().unwrap_or_default())},
                "finish_reason": "stop"
            }]
        })),
    )
}

async fn spawn_mock_groq_server() -> (String, MockGroq) {
    let mock = MockGroq::default();
    let app = Router::new()
        .route("/openai/v1/chat/completions", post(mock_completion))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), mock)
}

fn build_test_app(base_url: &str, api_key: Option<&str>) -> Router {
    let groq = GroqConfig {
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        api_key_var: UNSET_KEY_VAR.to_string(),
    };
    build_app(Arc::new(
        AppState::from_parts(groq, Upstreams::default()).unwrap(),
    ))
}

fn ask_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/groq/ask-groq/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn e2e_question_is_relayed_to_groq() {
    let (base_url, mock) = spawn_mock_groq_server().await;
    let app = build_test_app(&base_url, Some("gsk_test"));

    let response = app.oneshot(ask_request(r#"{"question":"hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"response": "llama-3.3-70b-versatile says hello"})
    );
    assert_eq!(mock.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn e2e_missing_question_is_400_without_provider_call() {
    let (base_url, mock) = spawn_mock_groq_server().await;

    for body in [
        "{}",
        "",
        r#"{"question":""}"#,
        r#"{"question":null}"#,
        r#"{"question":0}"#,
        r#"{"question":false}"#,
        r#"{"question":[]}"#,
    ] {
        let app = build_test_app(&base_url, Some("gsk_test"));
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
        assert_eq!(
            json_body(response).await,
            json!({"error": "No question provided"})
        );
    }

    assert_eq!(mock.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn e2e_malformed_body_is_500_with_parser_message() {
    let (base_url, mock) = spawn_mock_groq_server().await;

    let cases = [
        ("{question", "JSON parse error - "),
        (r#"["hello"]"#, "JSON body must be an object"),
        (r#"{"question":42}"#, "question must be a string"),
    ];
    for (body, prefix) in cases {
        let app = build_test_app(&base_url, Some("gsk_test"));
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "body: {body:?}");
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with(prefix), "{body}");
    }

    assert_eq!(mock.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn e2e_form_encoded_question_is_relayed() {
    let (base_url, mock) = spawn_mock_groq_server().await;
    let app = build_test_app(&base_url, Some("gsk_test"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/groq/ask-groq/")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("question=hello+there"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"response": "llama-3.3-70b-versatile says hello there"})
    );
    assert_eq!(mock.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn e2e_provider_error_is_500_with_message() {
    let (base_url, _mock) = spawn_mock_groq_server().await;
    let app = build_test_app(&base_url, Some("gsk_test"));

    let response = app.oneshot(ask_request(r#"{"question":"explode"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Error code: 503 - over capacity"})
    );
}

#[tokio::test]
async fn e2e_rejected_key_is_500() {
    let (base_url, _mock) = spawn_mock_groq_server().await;
    let app = build_test_app(&base_url, Some("gsk_wrong"));

    let response = app.oneshot(ask_request(r#"{"question":"hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Error code: 401 - Invalid API Key"})
    );
}

#[tokio::test]
async fn e2e_missing_credential_is_500_without_provider_call() {
    let (base_url, mock) = spawn_mock_groq_server().await;
    let app = build_test_app(&base_url, None);

    let response = app.oneshot(ask_request(r#"{"question":"hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains(UNSET_KEY_VAR));
    assert_eq!(mock.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn e2e_unreachable_provider_is_500() {
    let app = build_test_app("http://127.0.0.1:1", Some("gsk_test"));

    let response = app.oneshot(ask_request(r#"{"question":"hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("failed to reach Groq"));
}
