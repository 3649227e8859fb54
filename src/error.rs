use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing Slack credentials: {0}")]
    MissingCredentials(String),

    /// Slack answered with `ok: false`.
    #[error("Slack API error from {method}: {error}")]
    Slack { method: String, error: String },

    #[error("Rate limited by Slack{}", retry_after.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },
}

impl McpError {
    /// Errors caused by the caller's request rather than by the server or Slack.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            McpError::InvalidParameter(_) | McpError::NotFound(_) | McpError::MissingCredentials(_)
        )
    }
}

pub type McpResult<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_error_display() {
        let err = McpError::Slack {
            method: "chat.postMessage".to_string(),
            error: "channel_not_found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Slack API error from chat.postMessage: channel_not_found"
        );
    }

    #[test]
    fn test_rate_limited_display() {
        let err = McpError::RateLimited {
            retry_after: Some(30),
        };
        assert_eq!(err.to_string(), "Rate limited by Slack (retry after 30s)");

        let err = McpError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "Rate limited by Slack");
    }

    #[test]
    fn test_client_errors() {
        assert!(McpError::InvalidParameter("x".into()).is_client_error());
        assert!(McpError::MissingCredentials("x".into()).is_client_error());
        assert!(
            !McpError::Slack {
                method: "auth.test".into(),
                error: "invalid_auth".into(),
            }
            .is_client_error()
        );
        assert!(!McpError::RateLimited { retry_after: None }.is_client_error());
    }
}
