use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use slack_mcp::cli::Cli;
use slack_mcp::config::{Config, TransportMode};
use slack_mcp::mcp::{McpServer, RequestHandler};
use slack_mcp::slack::{ActivityLog, SlackClient};
use slack_mcp::telemetry;
use slack_mcp::transport::{sse, stdio};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    slack_mcp::logging::init()?;

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // stdio runs with one credential pair for the whole process; fail fast without it
    let stdio_credentials = match config.transport.mode {
        TransportMode::Stdio => Some(config.credentials()?),
        TransportMode::Sse => None,
    };

    let slack_client = Arc::new(SlackClient::new(
        &config.connection,
        &config.slack.api_base_url,
    )?);
    let activity = Arc::new(ActivityLog::new(
        slack_client.clone(),
        config.logs_channel().map(str::to_string),
    ));
    let server = Arc::new(McpServer::new(RequestHandler::new(slack_client, activity)));

    info!(transport = %config.transport.mode, "Starting Slack MCP server");

    let run = async {
        match stdio_credentials {
            Some(credentials) => stdio::run(server, credentials).await,
            None => {
                let metrics = telemetry::install_recorder()?;
                let state = Arc::new(sse::SseState::new(server, Some(metrics)));
                sse::run(state, &config.transport.bind_addr()).await
            }
        }
    };

    tokio::select! {
        result = run => {
            if let Err(e) = result {
                error!("MCP server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
