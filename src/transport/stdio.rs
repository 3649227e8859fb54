use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

use crate::mcp::types::{JsonRpcError, JsonRpcResponse};
use crate::mcp::{McpServer, McpSession};
use crate::slack::SessionCredentials;

/// Serve newline-delimited JSON-RPC on the process's stdin/stdout.
pub async fn run(server: Arc<McpServer>, credentials: SessionCredentials) -> Result<()> {
    info!("Serving MCP over stdio");
    let reader = BufReader::new(tokio::io::stdin());
    serve(server, credentials, reader, tokio::io::stdout()).await
}

/// Request loop over any line-oriented reader/writer pair. Returns on EOF.
pub async fn serve<R, W>(
    server: Arc<McpServer>,
    credentials: SessionCredentials,
    mut reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session = McpSession::new();
    let mut buffer = Vec::new();

    loop {
        buffer.clear();

        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let response = match std::str::from_utf8(&buffer) {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }

                        match server
                            .process_request(&session, Some(&credentials), trimmed)
                            .await
                        {
                            Ok(Some(response)) => response,
                            // Notification, no response needed
                            Ok(None) => continue,
                            Err(e) => {
                                error!("Error processing request: {}", e);
                                JsonRpcResponse::error(
                                    None,
                                    JsonRpcError::internal_error(e.to_string()),
                                )
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Received a line that is not valid UTF-8: {}", e);
                        JsonRpcResponse::error(None, JsonRpcError::parse_error())
                    }
                };

                let response_str = serde_json::to_string(&response)?;
                writer.write_all(response_str.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Err(e) => {
                error!("Error reading from stdin: {}", e);
                break;
            }
        }
    }

    Ok(())
}
