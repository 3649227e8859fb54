//! MCP over Server-Sent Events.
//!
//! A client opens `GET /sse` and receives an `endpoint` event naming the URL
//! it must POST its JSON-RPC messages to. Replies travel back on the event
//! stream as `message` events. Slack credentials come from the
//! `X-Slack-Web-Token` and `X-Slack-Cookie-Token` headers of each POST, or
//! from the headers sent when the stream was opened.

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::mcp::types::{JsonRpcError, JsonRpcResponse};
use crate::mcp::{McpServer, McpSession};
use crate::slack::SessionCredentials;

pub const WEB_TOKEN_HEADER: &str = "x-slack-web-token";
pub const COOKIE_TOKEN_HEADER: &str = "x-slack-cookie-token";

const MESSAGES_PATH: &str = "/messages/";
const SESSION_BUFFER: usize = 64;
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Shared state of the SSE transport.
pub struct SseState {
    server: Arc<McpServer>,
    sessions: RwLock<HashMap<String, Arc<SseSession>>>,
    metrics: Option<PrometheusHandle>,
    keep_alive: Duration,
}

struct SseSession {
    mcp: McpSession,
    /// Credentials from the headers of `GET /sse`, if any.
    credentials: Option<SessionCredentials>,
    tx: mpsc::Sender<Event>,
}

impl SseState {
    pub fn new(server: Arc<McpServer>, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            server,
            sessions: RwLock::new(HashMap::new()),
            metrics,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Interval of keep-alive comments. A dropped client is only noticed on
    /// the next write, so this also bounds how long its session lingers.
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Missing session_id query parameter")]
    MissingSessionId,

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Metrics are not enabled")]
    MetricsDisabled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSessionId | Self::Credentials(_) => StatusCode::BAD_REQUEST,
            Self::UnknownSession(_) | Self::MetricsDisabled => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingSessionId => "missing_session_id",
            Self::UnknownSession(_) => "unknown_session",
            Self::Credentials(_) => "invalid_credentials",
            Self::MetricsDisabled => "metrics_disabled",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        (self.status_code(), Json(body)).into_response()
    }
}

pub fn router(state: Arc<SseState>) -> Router {
    Router::new()
        .route("/sse", get(open_stream))
        .route("/messages", post(post_message))
        .route(MESSAGES_PATH, post(post_message))
        .route("/metrics", get(render_metrics))
        .route("/health", get(health))
        .with_state(state)
}

/// Accept connections until the listener fails or the future is dropped.
pub async fn serve(listener: TcpListener, state: Arc<SseState>) -> Result<()> {
    info!(
        "Serving MCP over SSE on http://{}/sse",
        listener.local_addr()?
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn run(state: Arc<SseState>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Read the credential pair from request headers. Both or neither must be set.
pub fn credentials_from_headers(
    headers: &HeaderMap,
) -> Result<Option<SessionCredentials>, TransportError> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    match (read(WEB_TOKEN_HEADER), read(COOKIE_TOKEN_HEADER)) {
        (Some(web), Some(cookie)) => SessionCredentials::new(web, cookie)
            .map(Some)
            .map_err(|e| TransportError::Credentials(e.to_string())),
        (None, None) => Ok(None),
        _ => Err(TransportError::Credentials(
            "both X-Slack-Web-Token and X-Slack-Cookie-Token are required".to_string(),
        )),
    }
}

async fn open_stream(
    State(state): State<Arc<SseState>>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, TransportError> {
    let credentials = credentials_from_headers(&headers)?;
    let session_id = Uuid::new_v4().simple().to_string();
    let (tx, rx) = mpsc::channel(SESSION_BUFFER);

    // Fresh channel, cannot be full
    let _ = tx.try_send(
        Event::default()
            .event("endpoint")
            .data(format!("{}?session_id={}", MESSAGES_PATH, session_id)),
    );

    let session = Arc::new(SseSession {
        mcp: McpSession::new(),
        credentials,
        tx: tx.clone(),
    });
    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), session);
    info!(session_id = %session_id, "SSE session opened");

    // The receiver lives in the response body; once the client disconnects it is dropped
    tokio::spawn({
        let state = state.clone();
        let session_id = session_id.clone();
        async move {
            tx.closed().await;
            state.sessions.write().await.remove(&session_id);
            info!(session_id = %session_id, "SSE session closed");
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<Event, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

async fn post_message(
    State(state): State<Arc<SseState>>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, TransportError> {
    let session_id = query.session_id.ok_or(TransportError::MissingSessionId)?;
    let session = state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or_else(|| TransportError::UnknownSession(session_id.clone()))?;

    let request_credentials = credentials_from_headers(&headers)?;
    let credentials = request_credentials.as_ref().or(session.credentials.as_ref());

    // Processed inline so messages of one session keep their order
    let response = match state
        .server
        .process_request(&session.mcp, credentials, &body)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Error processing request: {}", e);
            Some(JsonRpcResponse::error(
                None,
                JsonRpcError::internal_error(e.to_string()),
            ))
        }
    };

    if let Some(response) = response {
        let data = serde_json::to_string(&response)
            .map_err(|e| TransportError::Internal(e.to_string()))?;

        if session
            .tx
            .send(Event::default().event("message").data(data))
            .await
            .is_err()
        {
            debug!(session_id = %session_id, "SSE client went away before the reply");
            state.sessions.write().await.remove(&session_id);
            return Err(TransportError::UnknownSession(session_id));
        }
    }

    Ok(StatusCode::ACCEPTED)
}

async fn render_metrics(State(state): State<Arc<SseState>>) -> Result<Response, TransportError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or(TransportError::MetricsDisabled)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

async fn health(State(state): State<Arc<SseState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.session_count().await,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_credentials_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(credentials_from_headers(&headers).unwrap().is_none());

        headers.insert("X-Slack-Web-Token", HeaderValue::from_static("xoxc-web"));
        assert!(matches!(
            credentials_from_headers(&headers),
            Err(TransportError::Credentials(_))
        ));

        headers.insert("X-Slack-Cookie-Token", HeaderValue::from_static("xoxd-cookie"));
        let creds = credentials_from_headers(&headers).unwrap().unwrap();
        assert_eq!(creds.web_token(), "xoxc-web");
        assert_eq!(creds.cookie_token(), "xoxd-cookie");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            TransportError::MissingSessionId.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TransportError::UnknownSession("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
