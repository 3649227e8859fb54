use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{McpError, McpResult};
use crate::slack::SessionCredentials;

// Default configuration constants
const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const DEFAULT_TRANSPORT: &str = "stdio";
const DEFAULT_PORT: u64 = 8000;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_IDLE_PER_HOST: u64 = 10;
const DEFAULT_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;

const LOCAL_HOST: &str = "127.0.0.1";
const ANY_HOST: &str = "0.0.0.0";

// Environment variables, in lookup order where aliases exist
const XOXC_TOKEN_VARS: &[&str] = &["SLACK_MCP_XOXC_TOKEN", "SLACK_XOXC_TOKEN"];
const XOXD_TOKEN_VARS: &[&str] = &["SLACK_MCP_XOXD_TOKEN", "SLACK_XOXD_TOKEN"];
const TRANSPORT_VAR: &str = "MCP_TRANSPORT";
const HOST_VAR: &str = "MCP_HOST";
const PORT_VAR: &str = "MCP_PORT";
const LOGS_CHANNEL_VAR: &str = "LOGS_CHANNEL_ID";
const API_BASE_VAR: &str = "SLACK_API_BASE_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub slack: SlackConfig,
    pub transport: TransportConfig,
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub xoxc_token: Option<SecretString>,
    #[serde(default)]
    pub xoxd_token: Option<SecretString>,
}

/// How MCP messages reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TransportMode {
    Stdio,
    Sse,
}

impl From<&str> for TransportMode {
    /// `stdio` (or nothing at all) selects stdio; any other value selects SSE.
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("stdio") {
            TransportMode::Stdio
        } else {
            TransportMode::Sse
        }
    }
}

impl From<String> for TransportMode {
    fn from(value: String) -> Self {
        TransportMode::from(value.as_str())
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Stdio => write!(f, "stdio"),
            TransportMode::Sse => write!(f, "sse"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    pub mode: TransportMode,
    #[serde(default)]
    pub host: Option<String>,
    pub port: u16,
}

impl TransportConfig {
    /// Explicit host, else loopback for stdio and all interfaces for SSE.
    pub fn bind_host(&self) -> &str {
        match (&self.host, self.mode) {
            (Some(host), _) if !host.trim().is_empty() => host,
            (_, TransportMode::Stdio) => LOCAL_HOST,
            (_, TransportMode::Sse) => ANY_HOST,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host(), self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub timeout_seconds: u64,
    pub max_idle_per_host: usize,
    pub pool_idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsConfig {
    /// Channel that mirrors every tool invocation.
    #[serde(default)]
    pub channel_id: Option<String>,
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(config_path, &env)
    }

    pub fn load_from(config_path: Option<&str>, env: &HashMap<String, String>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Default values
        settings = settings
            .set_default("slack.api_base_url", DEFAULT_SLACK_API_BASE)?
            .set_default("transport.mode", DEFAULT_TRANSPORT)?
            .set_default("transport.port", DEFAULT_PORT)?
            .set_default("connection.timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .set_default("connection.max_idle_per_host", DEFAULT_MAX_IDLE_PER_HOST)?
            .set_default(
                "connection.pool_idle_timeout_seconds",
                DEFAULT_POOL_IDLE_TIMEOUT_SECONDS,
            )?;

        // Load from config file if provided
        if let Some(path) = config_path
            && Path::new(path).exists()
        {
            settings = settings.add_source(config::File::with_name(path));
        }

        // Override with prefixed environment variables (SLACK_MCP_CONNECTION__TIMEOUT_SECONDS)
        let source: config::Map<String, String> =
            env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        settings = settings.add_source(
            config::Environment::with_prefix("SLACK_MCP")
                .prefix_separator("_")
                .separator("__")
                .source(Some(source)),
        );

        // Well-known variables win over everything else
        if let Some(token) = lookup_first(env, XOXC_TOKEN_VARS) {
            settings = settings.set_override("slack.xoxc_token", token)?;
        }
        if let Some(token) = lookup_first(env, XOXD_TOKEN_VARS) {
            settings = settings.set_override("slack.xoxd_token", token)?;
        }
        if let Some(mode) = lookup_first(env, &[TRANSPORT_VAR]) {
            settings = settings.set_override("transport.mode", mode)?;
        }
        if let Some(host) = lookup_first(env, &[HOST_VAR]) {
            settings = settings.set_override("transport.host", host)?;
        }
        if let Some(port) = lookup_first(env, &[PORT_VAR]) {
            settings = settings.set_override("transport.port", port)?;
        }
        if let Some(channel) = lookup_first(env, &[LOGS_CHANNEL_VAR]) {
            settings = settings.set_override("logs.channel_id", channel)?;
        }
        if let Some(base) = lookup_first(env, &[API_BASE_VAR]) {
            settings = settings.set_override("slack.api_base_url", base)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// The session credential pair configured for this process.
    pub fn credentials(&self) -> McpResult<SessionCredentials> {
        let web = self.slack.xoxc_token.as_ref().ok_or_else(|| {
            McpError::MissingCredentials(format!("set {}", XOXC_TOKEN_VARS.join(" or ")))
        })?;
        let cookie = self.slack.xoxd_token.as_ref().ok_or_else(|| {
            McpError::MissingCredentials(format!("set {}", XOXD_TOKEN_VARS.join(" or ")))
        })?;

        SessionCredentials::new(web.expose_secret().clone(), cookie.expose_secret().clone())
    }

    pub fn logs_channel(&self) -> Option<&str> {
        self.logs
            .channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

fn lookup_first(env: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env.get(*key))
        .find(|value| !value.trim().is_empty())
        .cloned()
}
