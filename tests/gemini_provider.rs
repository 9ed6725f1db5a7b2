//! Tests for the Gemini client against a local stand-in for the Gemini API.
//!
//! A small axum app plays the provider on an ephemeral port, records what it
//! received, and answers with a canned status and body.
//!
//! Run with: cargo test --test gemini_provider

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use http::{header, HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use story_relay::config::{AppConfig, ApiKey, ProviderConfig};
use story_relay::prompt::PromptBuilder;
use story_relay::provider::{GeminiProvider, GenerationParams, ProviderError, TextProvider};
use story_relay::{create_router, AppState};

#[derive(Debug, Clone)]
struct Received {
    call: String,
    api_key: Option<String>,
    user_agent: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockGemini {
    status: StatusCode,
    reply: Value,
    received: Arc<Mutex<Vec<Received>>>,
}

async fn generate_content(
    State(mock): State<MockGemini>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    mock.received.lock().unwrap().push(Received {
        call,
        api_key: header_str("x-goog-api-key"),
        user_agent: header_str("user-agent"),
        body,
    });
    (mock.status, Json(mock.reply.clone()))
}

/// Start the stand-in and return its base URL plus the request log
async fn spawn_mock(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Received>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let mock = MockGemini {
        status,
        reply,
        received: received.clone(),
    };
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate_content))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1beta", addr), received)
}

fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        base_url: base_url.to_string(),
        api_key: ApiKey::new("test-key"),
        request_timeout_seconds: Some(5),
        ..ProviderConfig::default()
    }
}

fn success_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn invalid_key_reply() -> Value {
    json!({
        "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT"
        }
    })
}

#[tokio::test]
async fn sends_prompt_and_parameters() {
    let (base_url, received) = spawn_mock(StatusCode::OK, success_reply("## Epic 1: Login")).await;
    let provider = GeminiProvider::new(&provider_config(&base_url)).unwrap();

    let text = provider
        .generate("Write stories for Login", &GenerationParams::user_story())
        .await
        .unwrap();
    assert_eq!(text, "## Epic 1: Login");

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(request.call, "gemini-1.5-flash:generateContent");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));
    assert!(request
        .user_agent
        .as_deref()
        .unwrap()
        .starts_with("story-relay/"));
    assert_eq!(
        request.body,
        json!({
            "contents": [{"role": "user", "parts": [{"text": "Write stories for Login"}]}],
            "generationConfig": {"temperature": 1.0, "topP": 0.95}
        })
    );
}

#[tokio::test]
async fn api_error_carries_provider_message() {
    let (base_url, _) = spawn_mock(StatusCode::BAD_REQUEST, invalid_key_reply()).await;
    let provider = GeminiProvider::new(&provider_config(&base_url)).unwrap();

    let err = provider
        .generate("prompt", &GenerationParams::user_story())
        .await
        .unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid. Please pass a valid API key.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn blocked_prompt_is_an_error() {
    let (base_url, _) = spawn_mock(
        StatusCode::OK,
        json!({"promptFeedback": {"blockReason": "SAFETY"}}),
    )
    .await;
    let provider = GeminiProvider::new(&provider_config(&base_url)).unwrap();

    let err = provider
        .generate("prompt", &GenerationParams::user_story())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Blocked(_)));
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    // Reserve a port, then free it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base_url = format!("http://127.0.0.1:{}/v1beta", port);
    let provider = GeminiProvider::new(&provider_config(&base_url)).unwrap();

    let err = provider
        .generate("prompt", &GenerationParams::user_story())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)));
}

/// Serve one error response whose body is cut short, then close the connection
async fn spawn_truncated_error() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        stream
            .write_all(
                b"HTTP/1.1 503 Service Unavailable\r\n\
                  content-type: application/json\r\n\
                  content-length: 64\r\n\r\n{\"error\"",
            )
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
    });
    format!("http://{}/v1beta", addr)
}

/// Consume request headers and body so closing the socket does not reset it
async fn read_request(stream: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

#[tokio::test]
async fn unreadable_error_body_is_reported() {
    let base_url = spawn_truncated_error().await;
    let provider = GeminiProvider::new(&provider_config(&base_url)).unwrap();

    let err = provider
        .generate("prompt", &GenerationParams::user_story())
        .await
        .unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 503);
            assert!(
                message.starts_with("failed to read error body"),
                "message: {message}"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

async fn post_story(app: Router, feature: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user-story")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "feature": feature }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn relay_app(base_url: &str) -> Router {
    let mut config = AppConfig::default();
    config.provider = provider_config(base_url);
    let provider = GeminiProvider::new(&config.provider).unwrap();
    let state = AppState::new(config, PromptBuilder::new().unwrap(), Arc::new(provider));
    create_router(state).unwrap()
}

#[tokio::test]
async fn relay_returns_generated_story() {
    let (base_url, received) =
        spawn_mock(StatusCode::OK, success_reply("## Epic 1: Login\n**User Story 1:** ...")).await;

    let (status, body) = post_story(relay_app(&base_url), "Login").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userStory"], "## Epic 1: Login\n**User Story 1:** ...");

    let received = received.lock().unwrap();
    let prompt = received[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.contains("`Login`"));
}

#[tokio::test]
async fn relay_reports_invalid_api_key_as_500() {
    let (base_url, _) = spawn_mock(StatusCode::BAD_REQUEST, invalid_key_reply()).await;

    let (status, body) = post_story(relay_app(&base_url), "Login").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("API key not valid"));
}
