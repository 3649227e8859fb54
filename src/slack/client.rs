use reqwest::StatusCode;
use reqwest::header::{COOKIE, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use super::credentials::SessionCredentials;
use super::types::{AuthIdentity, HistoryQuery, HistoryResponse, JoinResponse, PostMessageResponse};
use crate::config::ConnectionConfig;
use crate::error::{McpError, McpResult};

/// Thin Slack Web API client authenticating with a session credential pair.
///
/// Credentials are passed per call so one client (and one connection pool)
/// serves every caller, whether tokens came from the environment or from
/// request headers.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
}

enum Body<'a> {
    Empty,
    Json(&'a Value),
    Form(&'a [(&'a str, String)]),
}

impl SlackClient {
    pub fn new(connection: &ConnectionConfig, base_url: &str) -> McpResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(connection.timeout_seconds))
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(connection.pool_idle_timeout_seconds))
            .user_agent(concat!("slack-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST a JSON payload to a Web API method.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        credentials: &SessionCredentials,
        payload: &Value,
    ) -> McpResult<T> {
        self.send(method, credentials, Body::Json(payload)).await
    }

    /// POST form-encoded parameters to a Web API method.
    pub async fn call_form<T: DeserializeOwned>(
        &self,
        method: &str,
        credentials: &SessionCredentials,
        params: &[(&str, String)],
    ) -> McpResult<T> {
        let body = if params.is_empty() {
            Body::Empty
        } else {
            Body::Form(params)
        };
        self.send(method, credentials, body).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        credentials: &SessionCredentials,
        body: Body<'_>,
    ) -> McpResult<T> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method, "Calling Slack API");

        let request = self
            .http
            .post(&url)
            .bearer_auth(credentials.web_token())
            .header(COOKIE, credentials.cookie_header());

        let request = match body {
            Body::Empty => request,
            Body::Json(payload) => request.json(payload),
            Body::Form(params) => request.form(params),
        };

        let response = request.send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            warn!(method, ?retry_after, "Slack rate limit hit");
            return Err(McpError::RateLimited { retry_after });
        }

        let value: Value = response.error_for_status()?.json().await?;
        Self::check_ok(method, value)
    }

    fn check_ok<T: DeserializeOwned>(method: &str, value: Value) -> McpResult<T> {
        if value.get("ok").and_then(Value::as_bool) != Some(true) {
            let error = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            debug!(method, %error, "Slack API returned an error");
            return Err(McpError::Slack {
                method: method.to_string(),
                error,
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    pub async fn conversation_history(
        &self,
        credentials: &SessionCredentials,
        channel: &str,
        query: &HistoryQuery,
    ) -> McpResult<HistoryResponse> {
        let mut params = vec![("channel", channel.to_string())];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &query.cursor {
            params.push(("cursor", cursor.clone()));
        }
        if let Some(oldest) = &query.oldest {
            params.push(("oldest", oldest.clone()));
        }
        if let Some(latest) = &query.latest {
            params.push(("latest", latest.clone()));
        }

        self.call_form("conversations.history", credentials, &params)
            .await
    }

    pub async fn post_message(
        &self,
        credentials: &SessionCredentials,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> McpResult<PostMessageResponse> {
        let mut payload = json!({
            "channel": channel,
            "text": text,
        });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = json!(ts);
        }

        self.call_json("chat.postMessage", credentials, &payload)
            .await
    }

    pub async fn add_reaction(
        &self,
        credentials: &SessionCredentials,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> McpResult<()> {
        let payload = json!({
            "channel": channel,
            "name": name,
            "timestamp": timestamp,
        });

        let _: Value = self
            .call_json("reactions.add", credentials, &payload)
            .await?;
        Ok(())
    }

    pub async fn join_conversation(
        &self,
        credentials: &SessionCredentials,
        channel: &str,
    ) -> McpResult<JoinResponse> {
        self.call_json("conversations.join", credentials, &json!({ "channel": channel }))
            .await
    }

    pub async fn auth_test(&self, credentials: &SessionCredentials) -> McpResult<AuthIdentity> {
        self.call_form("auth.test", credentials, &[]).await
    }
}
