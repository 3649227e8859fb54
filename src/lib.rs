pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod slack;
pub mod telemetry;
pub mod tools;
pub mod transport;
pub mod utils;

pub use config::{Config, TransportMode};
pub use error::{McpError, McpResult};
