use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{Tool, ToolResponse};
use crate::error::McpResult;
use crate::mcp::types::{Property, ToolInputSchema};
use crate::slack::{ActivityLog, SessionCredentials, SlackClient};
use crate::utils::{normalize_reaction, parse_params, require_non_empty};

pub struct AddReactionTool {
    slack_client: Arc<SlackClient>,
    activity: Arc<ActivityLog>,
}

impl AddReactionTool {
    pub fn new(slack_client: Arc<SlackClient>, activity: Arc<ActivityLog>) -> Self {
        Self {
            slack_client,
            activity,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddReactionParams {
    channel_id: String,
    message_ts: String,
    reaction: String,
}

#[async_trait]
impl Tool for AddReactionTool {
    fn description(&self) -> &str {
        "Add a reaction to a message"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(
            vec![
                (
                    "channel_id",
                    Property::string("Channel ID containing the message"),
                ),
                (
                    "message_ts",
                    Property::string("Timestamp of the message to react to"),
                ),
                (
                    "reaction",
                    Property::string("Emoji name, with or without colons (e.g. thumbsup)"),
                ),
            ],
            &["channel_id", "message_ts", "reaction"],
        )
    }

    async fn execute(&self, credentials: &SessionCredentials, params: Value) -> McpResult<Value> {
        let params: AddReactionParams = parse_params(params)?;
        let channel_id = require_non_empty(&params.channel_id, "channel_id")?;
        let message_ts = require_non_empty(&params.message_ts, "message_ts")?;
        let reaction = normalize_reaction(&params.reaction)?;

        self.activity
            .record(
                credentials,
                &format!(
                    "Adding reaction {} to message {} in channel {}: :{}:",
                    reaction, message_ts, channel_id, reaction
                ),
            )
            .await;

        self.slack_client
            .add_reaction(credentials, channel_id, message_ts, &reaction)
            .await?;

        Ok(ToolResponse::data(json!({ "ok": true })).into_json())
    }
}
