use clap::Parser;

use crate::config::{Config, TransportMode};

/// MCP server exposing Slack session-token operations
#[derive(Debug, Parser)]
#[command(name = "slack-mcp", version, about)]
pub struct Cli {
    /// Path to a configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "SLACK_MCP_CONFIG")]
    pub config: Option<String>,

    /// Transport to serve: `stdio`, or anything else for SSE (overrides MCP_TRANSPORT)
    #[arg(short, long)]
    pub transport: Option<String>,

    /// Address to bind the SSE server to (overrides MCP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the SSE server to (overrides MCP_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Command-line flags win over file and environment settings.
    pub fn apply(&self, config: &mut Config) {
        if let Some(transport) = &self.transport {
            config.transport.mode = TransportMode::from(transport.as_str());
        }
        if let Some(host) = &self.host {
            config.transport.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.transport.port = port;
        }
    }
}
