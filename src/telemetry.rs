//! Tool usage metrics.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. The SSE transport installs the Prometheus recorder
//! and serves it on `/metrics`.

use anyhow::Result;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::time::Duration;

pub const TOOL_REQUEST_COUNT: &str = "slack_mcp_tool_request_count";
pub const TOOL_REQUEST_DURATION: &str = "slack_mcp_tool_request_duration";

/// Latency buckets in seconds; Prometheus adds `+Inf`.
const DURATION_BUCKETS: &[f64] = &[0.1, 1.0, 10.0, 30.0];

pub fn record_tool_call(tool: &str, elapsed: Duration) {
    metrics::counter!(TOOL_REQUEST_COUNT, "tool" => tool.to_string()).increment(1);
    metrics::histogram!(TOOL_REQUEST_DURATION, "tool" => tool.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn build_recorder() -> Result<PrometheusRecorder> {
    let recorder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(TOOL_REQUEST_DURATION.to_string()),
            DURATION_BUCKETS,
        )?
        .build_recorder();
    Ok(recorder)
}

/// Install the Prometheus recorder as the global recorder.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let recorder = build_recorder()?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
    Ok(handle)
}
