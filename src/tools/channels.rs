use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{Tool, ToolResponse};
use crate::error::McpResult;
use crate::mcp::types::{Property, ToolInputSchema};
use crate::slack::{ActivityLog, SessionCredentials, SlackClient};
use crate::utils::{parse_params, require_non_empty};

pub struct JoinChannelTool {
    slack_client: Arc<SlackClient>,
    activity: Arc<ActivityLog>,
}

impl JoinChannelTool {
    pub fn new(slack_client: Arc<SlackClient>, activity: Arc<ActivityLog>) -> Self {
        Self {
            slack_client,
            activity,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JoinChannelParams {
    channel_id: String,
}

#[async_trait]
impl Tool for JoinChannelTool {
    fn description(&self) -> &str {
        "Join a public channel"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(
            vec![("channel_id", Property::string("Channel ID to join"))],
            &["channel_id"],
        )
    }

    async fn execute(&self, credentials: &SessionCredentials, params: Value) -> McpResult<Value> {
        let params: JoinChannelParams = parse_params(params)?;
        let channel_id = require_non_empty(&params.channel_id, "channel_id")?;

        self.activity
            .record(credentials, &format!("Joining channel {}", channel_id))
            .await;

        let joined = self
            .slack_client
            .join_conversation(credentials, channel_id)
            .await?;

        Ok(ToolResponse::data(json!({
            "ok": true,
            "channel": {
                "id": joined.channel.id,
                "name": joined.channel.name,
            },
            "already_in_channel": joined.already_in_channel(),
        }))
        .into_json())
    }
}
