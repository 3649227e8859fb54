pub mod channels;
pub mod identity;
pub mod messages;
pub mod reactions;
pub mod response;

use crate::error::McpResult;
use crate::mcp::types::ToolInputSchema;
use crate::slack::SessionCredentials;
use async_trait::async_trait;
use serde_json::Value;

pub use response::ToolResponse;

#[async_trait]
pub trait Tool {
    fn description(&self) -> &str;
    fn input_schema(&self) -> ToolInputSchema;
    async fn execute(&self, credentials: &SessionCredentials, params: Value) -> McpResult<Value>;
}
