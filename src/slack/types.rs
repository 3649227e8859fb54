use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// `conversations.history` response. Messages are kept as Slack sent them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    pub response_metadata: Option<ResponseMetadata>,
}

impl HistoryResponse {
    /// Slack sends an empty cursor on the last page.
    pub fn next_cursor(&self) -> Option<String> {
        self.response_metadata
            .as_ref()?
            .next_cursor
            .as_ref()
            .filter(|c| !c.is_empty())
            .cloned()
    }
}

/// Paging and range options for `conversations.history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub oldest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessageResponse {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `conversations.join` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub channel: SlackChannel,
    pub warning: Option<String>,
}

impl JoinResponse {
    pub fn already_in_channel(&self) -> bool {
        self.warning.as_deref() == Some("already_in_channel")
    }
}

/// `auth.test` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub url: Option<String>,
    pub team: Option<String>,
    pub user: Option<String>,
    pub team_id: Option<String>,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_next_cursor() {
        let page: HistoryResponse = serde_json::from_value(json!({
            "ok": true,
            "messages": [{"type": "message", "ts": "1.0", "text": "hi"}],
            "has_more": true,
            "response_metadata": {"next_cursor": "bmV4dA=="}
        }))
        .unwrap();
        assert_eq!(page.next_cursor().as_deref(), Some("bmV4dA=="));
        assert_eq!(page.messages[0]["text"], "hi");

        let last: HistoryResponse = serde_json::from_value(json!({
            "ok": true,
            "messages": [],
            "response_metadata": {"next_cursor": ""}
        }))
        .unwrap();
        assert!(!last.has_more);
        assert_eq!(last.next_cursor(), None);
    }

    #[test]
    fn test_join_warning() {
        let joined: JoinResponse = serde_json::from_value(json!({
            "ok": true,
            "channel": {"id": "C123", "name": "general", "is_channel": true},
            "warning": "already_in_channel"
        }))
        .unwrap();
        assert!(joined.already_in_channel());
        assert_eq!(joined.channel.name.as_deref(), Some("general"));
    }
}
