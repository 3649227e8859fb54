use anyhow::Result;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// Map a LOG_LEVEL value onto a filter directive; unknown values fall back to warn.
pub fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => DEFAULT_LEVEL,
    }
}

/// RUST_LOG wins (allows module-specific logging), then LOG_LEVEL, then warn.
pub fn build_filter(rust_log: Option<&str>, log_level: Option<&str>) -> EnvFilter {
    if let Some(rust_log) = rust_log {
        EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    } else if let Some(log_level) = log_level {
        EnvFilter::new(normalize_level(log_level))
    } else {
        EnvFilter::new(DEFAULT_LEVEL)
    }
}

pub fn init() -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let log_level = std::env::var("LOG_LEVEL").ok();
    let filter = build_filter(rust_log.as_deref(), log_level.as_deref());

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries the stdio transport
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        builder
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    }

    Ok(())
}
