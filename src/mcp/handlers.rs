use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::McpError;
use crate::slack::{ActivityLog, SessionCredentials, SlackClient};
use crate::telemetry;
use crate::tools::{Tool, channels, identity, messages, reactions};

use super::types::{CallToolResult, Tool as McpTool};

pub struct RequestHandler {
    tools: BTreeMap<String, Box<dyn Tool + Send + Sync>>,
}

macro_rules! register_tool {
    ($tools:expr, $name:expr, $tool:expr) => {
        $tools.insert($name.to_string(), Box::new($tool));
    };
}

impl RequestHandler {
    pub fn new(slack_client: Arc<SlackClient>, activity: Arc<ActivityLog>) -> Self {
        let mut tools: BTreeMap<String, Box<dyn Tool + Send + Sync>> = BTreeMap::new();

        register_tool!(
            tools,
            "get_channel_history",
            messages::GetChannelHistoryTool::new(slack_client.clone(), activity.clone())
        );
        register_tool!(
            tools,
            "post_message",
            messages::PostMessageTool::new(slack_client.clone(), activity.clone())
        );
        register_tool!(
            tools,
            "add_reaction",
            reactions::AddReactionTool::new(slack_client.clone(), activity.clone())
        );
        register_tool!(
            tools,
            "join_channel",
            channels::JoinChannelTool::new(slack_client.clone(), activity.clone())
        );
        register_tool!(
            tools,
            "whoami",
            identity::WhoAmITool::new(slack_client, activity.clone())
        );

        if activity.is_enabled() {
            info!("Activity log channel enabled");
        }

        Self { tools }
    }

    pub fn list_tools(&self) -> Vec<McpTool> {
        self.tools
            .iter()
            .map(|(name, tool)| McpTool {
                name: name.clone(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    pub async fn call_tool(
        &self,
        name: &str,
        credentials: &SessionCredentials,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| McpError::NotFound(format!("Tool not found: {}", name)))?;

        let started = Instant::now();
        let result = tool.execute(credentials, arguments).await;
        telemetry::record_tool_call(name, started.elapsed());

        match result {
            Ok(value) => {
                debug!(tool = name, "Tool call succeeded");
                let text = match value.as_str() {
                    Some(text) => text.to_string(),
                    None => serde_json::to_string_pretty(&value)?,
                };
                Ok(CallToolResult::text(text))
            }
            // Slack's own rejections go back to the model as tool output
            Err(e @ (McpError::Slack { .. } | McpError::RateLimited { .. })) => {
                warn!(tool = name, "Slack rejected tool call: {}", e);
                Ok(CallToolResult::error(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
