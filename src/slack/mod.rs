pub mod activity;
pub mod client;
pub mod credentials;
pub mod types;

pub use activity::ActivityLog;
pub use client::SlackClient;
pub use credentials::SessionCredentials;
