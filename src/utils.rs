use crate::error::{McpError, McpResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse JSON value into a typed parameter struct
pub fn parse_params<T: DeserializeOwned>(params: Value) -> McpResult<T> {
    serde_json::from_value(params)
        .map_err(|e| McpError::InvalidParameter(format!("Invalid parameters: {}", e)))
}

/// Reject missing or whitespace-only required string arguments
pub fn require_non_empty<'a>(value: &'a str, field_name: &str) -> McpResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(McpError::InvalidParameter(format!(
            "'{}' must not be empty",
            field_name
        )));
    }
    Ok(trimmed)
}

/// Treat empty optional strings as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize an emoji name: `:thumbsup:` and `thumbsup` both become `thumbsup`
pub fn normalize_reaction(name: &str) -> McpResult<String> {
    let name = require_non_empty(name, "reaction")?;
    let stripped = name.trim_matches(':');
    if stripped.is_empty() {
        return Err(McpError::InvalidParameter(
            "'reaction' must name an emoji".to_string(),
        ));
    }
    Ok(stripped.to_string())
}
