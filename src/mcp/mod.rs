pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::RequestHandler;
pub use server::{McpServer, McpSession};
