mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use slack_mcp::telemetry;
use slack_mcp::transport::sse::{self, SseState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{COOKIE_TOKEN, WEB_TOKEN, server};

/// Minimal SSE frame reader over a streaming reqwest response.
struct EventReader {
    response: reqwest::Response,
    buffer: String,
}

impl EventReader {
    async fn next_event(&mut self) -> (String, String) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::new();
                let mut data = String::new();
                for line in frame.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        event = v.trim().to_string();
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data.push_str(v.trim_start());
                    }
                }
                // Keep-alive comments carry neither
                if event.is_empty() && data.is_empty() {
                    continue;
                }
                return (event, data);
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.response.chunk())
                .await
                .expect("timed out waiting for SSE data")
                .unwrap()
                .expect("SSE stream ended");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    async fn next_message(&mut self) -> Value {
        let (event, data) = self.next_event().await;
        assert_eq!(event, "message");
        serde_json::from_str(&data).unwrap()
    }
}

async fn start(mock: &MockServer) -> (String, Arc<SseState>) {
    let state = Arc::new(SseState::new(server(mock), None));
    (spawn_server(state.clone()).await, state)
}

async fn spawn_server(state: Arc<SseState>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(sse::serve(listener, state));
    base
}

async fn open(base: &str, with_tokens: bool) -> (EventReader, String) {
    let mut request = reqwest::Client::new().get(format!("{}/sse", base));
    if with_tokens {
        request = request
            .header("X-Slack-Web-Token", WEB_TOKEN)
            .header("X-Slack-Cookie-Token", COOKIE_TOKEN);
    }
    let response = request.send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let mut reader = EventReader {
        response,
        buffer: String::new(),
    };
    let (event, endpoint) = reader.next_event().await;
    assert_eq!(event, "endpoint");
    assert!(endpoint.starts_with("/messages/?session_id="));
    (reader, format!("{}{}", base, endpoint))
}

async fn post(endpoint: &str, message: Value, tokens: Option<(&str, &str)>) -> reqwest::StatusCode {
    let mut request = reqwest::Client::new()
        .post(endpoint)
        .header("content-type", "application/json")
        .body(message.to_string());
    if let Some((web, cookie)) = tokens {
        request = request
            .header("X-Slack-Web-Token", web)
            .header("X-Slack-Cookie-Token", cookie);
    }
    request.send().await.unwrap().status()
}

async fn handshake(reader: &mut EventReader, endpoint: &str) {
    let status = post(
        endpoint,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
               "params": {"protocolVersion": "2025-06-18", "capabilities": {}}}),
        None,
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);
    let initialized = reader.next_message().await;
    assert_eq!(initialized["result"]["protocolVersion"], "2025-06-18");

    let status = post(
        endpoint,
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        None,
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_tool_call_with_tokens_from_stream_headers() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth.test"))
        .and(header("authorization", format!("Bearer {}", WEB_TOKEN).as_str()))
        .and(header("cookie", format!("d={}", COOKIE_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "user": "ada", "user_id": "U1"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let (base, state) = start(&mock).await;
    let (mut reader, endpoint) = open(&base, true).await;
    assert_eq!(state.session_count().await, 1);

    handshake(&mut reader, &endpoint).await;

    post(
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
               "params": {"name": "whoami", "arguments": {}}}),
        None,
    )
    .await;
    let response = reader.next_message().await;
    assert_eq!(response["id"], 2);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("\"user\": \"ada\""));
}

#[tokio::test]
async fn test_request_headers_override_stream_headers() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth.test"))
        .and(header("authorization", "Bearer xoxc-other"))
        .and(header("cookie", "d=xoxd-other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "user": "grace", "user_id": "U2"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let (base, _state) = start(&mock).await;
    let (mut reader, endpoint) = open(&base, true).await;
    handshake(&mut reader, &endpoint).await;

    post(
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
               "params": {"name": "whoami"}}),
        Some(("xoxc-other", "xoxd-other")),
    )
    .await;
    let response = reader.next_message().await;
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("grace"));
}

#[tokio::test]
async fn test_tool_call_without_any_tokens_fails() {
    let mock = MockServer::start().await;
    let (base, _state) = start(&mock).await;
    let (mut reader, endpoint) = open(&base, false).await;
    handshake(&mut reader, &endpoint).await;

    post(
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
               "params": {"name": "get_channel_history", "arguments": {"channel_id": "C1"}}}),
        None,
    )
    .await;
    let response = reader.next_message().await;
    assert_eq!(response["error"]["code"], -32602);
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_session_removed_after_client_disconnects() {
    let mock = MockServer::start().await;
    let state = Arc::new(
        SseState::new(server(&mock), None).with_keep_alive(Duration::from_millis(50)),
    );
    let base = spawn_server(state.clone()).await;

    let (reader, endpoint) = open(&base, true).await;
    assert_eq!(state.session_count().await, 1);

    drop(reader);

    let deadline = Instant::now() + Duration::from_secs(5);
    while state.session_count().await > 0 {
        assert!(
            Instant::now() < deadline,
            "session still registered after the client went away"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let status = post(
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        None,
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_and_missing_session() {
    let mock = MockServer::start().await;
    let app = sse::router(Arc::new(SseState::new(server(&mock), None)));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/messages/?session_id=deadbeef")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/messages")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_token_headers_rejected() {
    let mock = MockServer::start().await;
    let app = sse::router(Arc::new(SseState::new(server(&mock), None)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/sse")
                .header("X-Slack-Web-Token", WEB_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_metrics_routes() {
    let mock = MockServer::start().await;

    let app = sse::router(Arc::new(SseState::new(server(&mock), None)));
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health, json!({"status": "ok", "sessions": 0}));

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let recorder = telemetry::build_recorder().unwrap();
    let app = sse::router(Arc::new(SseState::new(
        server(&mock),
        Some(recorder.handle()),
    )));
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; version=0.0.4"
    );
}
