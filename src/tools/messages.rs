use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{Tool, ToolResponse};
use crate::error::{McpError, McpResult};
use crate::mcp::types::{Property, ToolInputSchema};
use crate::slack::types::HistoryQuery;
use crate::slack::{ActivityLog, SessionCredentials, SlackClient};
use crate::utils::{non_empty, parse_params, require_non_empty};

const MAX_HISTORY_LIMIT: usize = 1000;

pub struct GetChannelHistoryTool {
    slack_client: Arc<SlackClient>,
    activity: Arc<ActivityLog>,
}

pub struct PostMessageTool {
    slack_client: Arc<SlackClient>,
    activity: Arc<ActivityLog>,
}

impl GetChannelHistoryTool {
    pub fn new(slack_client: Arc<SlackClient>, activity: Arc<ActivityLog>) -> Self {
        Self {
            slack_client,
            activity,
        }
    }
}

impl PostMessageTool {
    pub fn new(slack_client: Arc<SlackClient>, activity: Arc<ActivityLog>) -> Self {
        Self {
            slack_client,
            activity,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetChannelHistoryParams {
    channel_id: String,
    #[serde(default = "history_default_limit")]
    limit: usize,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    oldest: Option<String>,
    #[serde(default)]
    latest: Option<String>,
}

fn history_default_limit() -> usize {
    100 // Slack's own page size for conversations.history
}

#[derive(Debug, Deserialize)]
struct PostMessageParams {
    channel_id: String,
    message: String,
    #[serde(default)]
    thread_ts: Option<String>,
}

#[async_trait]
impl Tool for GetChannelHistoryTool {
    fn description(&self) -> &str {
        "Get the history of a channel"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(
            vec![
                (
                    "channel_id",
                    Property::string("Channel ID (C..., G..., D...)"),
                ),
                (
                    "limit",
                    Property::number("Maximum number of messages (default: 100)", 100),
                ),
                ("cursor", Property::string("Pagination cursor (optional)")),
                (
                    "oldest",
                    Property::string("Only messages after this timestamp (optional)"),
                ),
                (
                    "latest",
                    Property::string("Only messages before this timestamp (optional)"),
                ),
            ],
            &["channel_id"],
        )
    }

    async fn execute(&self, credentials: &SessionCredentials, params: Value) -> McpResult<Value> {
        let params: GetChannelHistoryParams = parse_params(params)?;
        let channel_id = require_non_empty(&params.channel_id, "channel_id")?;

        if params.limit == 0 || params.limit > MAX_HISTORY_LIMIT {
            return Err(McpError::InvalidParameter(format!(
                "'limit' must be between 1 and {}",
                MAX_HISTORY_LIMIT
            )));
        }

        self.activity
            .record(
                credentials,
                &format!("Getting history of channel {}", channel_id),
            )
            .await;

        let query = HistoryQuery {
            limit: Some(params.limit),
            cursor: non_empty(params.cursor),
            oldest: non_empty(params.oldest),
            latest: non_empty(params.latest),
        };

        let page = self
            .slack_client
            .conversation_history(credentials, channel_id, &query)
            .await?;

        let next_cursor = page.next_cursor();
        Ok(ToolResponse::paginated(
            json!({ "messages": page.messages }),
            page.has_more,
            next_cursor,
        )
        .into_json())
    }
}

#[async_trait]
impl Tool for PostMessageTool {
    fn description(&self) -> &str {
        "Post a message to a channel"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(
            vec![
                (
                    "channel_id",
                    Property::string("Channel ID to post the message to"),
                ),
                ("message", Property::string("Message text to send")),
                (
                    "thread_ts",
                    Property::string("Thread timestamp to reply to (optional)"),
                ),
            ],
            &["channel_id", "message"],
        )
    }

    async fn execute(&self, credentials: &SessionCredentials, params: Value) -> McpResult<Value> {
        let params: PostMessageParams = parse_params(params)?;
        let channel_id = require_non_empty(&params.channel_id, "channel_id")?;
        require_non_empty(&params.message, "message")?;
        let thread_ts = non_empty(params.thread_ts);

        self.activity
            .record(
                credentials,
                &format!("Posting message to channel {}: {}", channel_id, params.message),
            )
            .await;

        let posted = self
            .slack_client
            .post_message(
                credentials,
                channel_id,
                &params.message,
                thread_ts.as_deref(),
            )
            .await?;

        Ok(ToolResponse::data(json!({
            "ok": true,
            "channel": posted.channel,
            "ts": posted.ts,
        }))
        .into_json())
    }
}
