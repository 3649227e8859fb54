#![allow(dead_code)]

use std::sync::Arc;

use slack_mcp::config::ConnectionConfig;
use slack_mcp::mcp::{McpServer, RequestHandler};
use slack_mcp::slack::{ActivityLog, SessionCredentials, SlackClient};
use wiremock::MockServer;

pub const WEB_TOKEN: &str = "xoxc-test-web";
pub const COOKIE_TOKEN: &str = "xoxd-test-cookie";

pub fn credentials() -> SessionCredentials {
    SessionCredentials::new(WEB_TOKEN, COOKIE_TOKEN).unwrap()
}

pub fn slack_client(mock: &MockServer) -> Arc<SlackClient> {
    let connection = ConnectionConfig {
        timeout_seconds: 5,
        max_idle_per_host: 2,
        pool_idle_timeout_seconds: 5,
    };
    Arc::new(SlackClient::new(&connection, &mock.uri()).unwrap())
}

pub fn handler(mock: &MockServer, logs_channel: Option<&str>) -> RequestHandler {
    let client = slack_client(mock);
    let activity = Arc::new(ActivityLog::new(
        client.clone(),
        logs_channel.map(str::to_string),
    ));
    RequestHandler::new(client, activity)
}

pub fn server(mock: &MockServer) -> Arc<McpServer> {
    Arc::new(McpServer::new(handler(mock, None)))
}
