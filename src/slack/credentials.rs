use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::{McpError, McpResult};

const WEB_TOKEN_PREFIX: &str = "xoxc-";
const COOKIE_TOKEN_PREFIX: &str = "xoxd-";

/// A Slack browser-session credential pair.
///
/// The web token (XOXC) goes into the `Authorization` header, the cookie token
/// (XOXD) into the `d` cookie. Both values stay wrapped in [`SecretString`] so
/// they never show up in `Debug` output or logs.
#[derive(Clone)]
pub struct SessionCredentials {
    web: SecretString,
    cookie: SecretString,
}

impl SessionCredentials {
    pub fn new(web: impl Into<String>, cookie: impl Into<String>) -> McpResult<Self> {
        let web = web.into().trim().to_string();
        let cookie = cookie.into().trim().to_string();

        if web.is_empty() {
            return Err(McpError::MissingCredentials(
                "web (xoxc) token is empty".to_string(),
            ));
        }
        if cookie.is_empty() {
            return Err(McpError::MissingCredentials(
                "cookie (xoxd) token is empty".to_string(),
            ));
        }

        if !web.starts_with(WEB_TOKEN_PREFIX) {
            warn!("Web token does not look like an xoxc session token");
        }
        if !cookie.starts_with(COOKIE_TOKEN_PREFIX) {
            warn!("Cookie token does not look like an xoxd session token");
        }

        Ok(Self {
            web: SecretString::new(web),
            cookie: SecretString::new(cookie),
        })
    }

    pub fn web_token(&self) -> &str {
        self.web.expose_secret()
    }

    pub fn cookie_token(&self) -> &str {
        self.cookie.expose_secret()
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!("d={}", self.cookie_token())
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("web", &"[REDACTED]")
            .field("cookie", &"[REDACTED]")
            .finish()
    }
}
