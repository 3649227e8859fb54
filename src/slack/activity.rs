use std::sync::Arc;
use tracing::warn;

use super::client::SlackClient;
use super::credentials::SessionCredentials;

/// Mirrors tool activity into a Slack channel when one is configured.
///
/// Entries are posted with the caller's own credentials. A failed post is
/// logged and otherwise ignored; it never fails the tool call it describes.
pub struct ActivityLog {
    slack_client: Arc<SlackClient>,
    channel_id: Option<String>,
}

impl ActivityLog {
    pub fn new(slack_client: Arc<SlackClient>, channel_id: Option<String>) -> Self {
        Self {
            slack_client,
            channel_id,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel_id.is_some()
    }

    pub async fn record(&self, credentials: &SessionCredentials, message: &str) {
        let Some(channel_id) = &self.channel_id else {
            return;
        };

        if let Err(e) = self
            .slack_client
            .post_message(credentials, channel_id, message, None)
            .await
        {
            warn!("Failed to write activity log entry: {}", e);
        }
    }
}
