use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{Tool, ToolResponse};
use crate::error::McpResult;
use crate::mcp::types::ToolInputSchema;
use crate::slack::{ActivityLog, SessionCredentials, SlackClient};

pub struct WhoAmITool {
    slack_client: Arc<SlackClient>,
    activity: Arc<ActivityLog>,
}

impl WhoAmITool {
    pub fn new(slack_client: Arc<SlackClient>, activity: Arc<ActivityLog>) -> Self {
        Self {
            slack_client,
            activity,
        }
    }
}

#[async_trait]
impl Tool for WhoAmITool {
    fn description(&self) -> &str {
        "Check authentication and report the signed-in identity"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![], &[])
    }

    async fn execute(&self, credentials: &SessionCredentials, _params: Value) -> McpResult<Value> {
        self.activity
            .record(credentials, "Checking authentication & identity")
            .await;

        let identity = self.slack_client.auth_test(credentials).await?;

        Ok(ToolResponse::data(json!({
            "user": identity.user,
            "user_id": identity.user_id,
            "team": identity.team,
            "team_id": identity.team_id,
            "url": identity.url,
        }))
        .into_json())
    }
}
