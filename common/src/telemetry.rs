// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging with JSON formatting.
///
/// The log level comes from RUST_LOG when set, otherwise from configuration.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, "Structured logging initialized");

    Ok(())
}

/// Initialize the Prometheus metrics exporter and register all metrics:
/// - swap_success_total: Counter for filled invocations
/// - swap_failed_total: Counter for exhausted/aborted invocations
/// - swap_skipped_total: Counter for invocations skipped by the trading switch
/// - swap_duration_seconds: Histogram for invocation duration
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!("swap_success_total", "Total number of filled invocations");
    describe_counter!(
        "swap_failed_total",
        "Total number of invocations that ended without a fill"
    );
    describe_counter!(
        "swap_skipped_total",
        "Total number of invocations skipped because trading is disabled"
    );
    describe_histogram!(
        "swap_duration_seconds",
        "Duration of scheduled invocations in seconds"
    );

    tracing::info!(
        metrics_port = metrics_port,
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Record a filled invocation
#[inline]
pub fn record_swap_success(job_name: &str) {
    counter!("swap_success_total", "job_name" => job_name.to_string()).increment(1);
}

/// Record an invocation that ended without a fill
#[inline]
pub fn record_swap_failure(job_name: &str, reason: &str) {
    counter!(
        "swap_failed_total",
        "job_name" => job_name.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record an invocation skipped by the trading switch
#[inline]
pub fn record_swap_skipped(job_name: &str) {
    counter!("swap_skipped_total", "job_name" => job_name.to_string()).increment(1);
}

/// Record invocation duration
#[inline]
pub fn record_swap_duration(job_name: &str, duration_seconds: f64) {
    histogram!(
        "swap_duration_seconds",
        "job_name" => job_name.to_string()
    )
    .record(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_with_valid_level() {
        // Either succeeds or a subscriber is already installed by another test
        let result = init_logging("info");
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_metrics_recording_does_not_panic() {
        record_swap_success("test-job");
        record_swap_failure("test-job", "exhausted");
        record_swap_skipped("test-job");
        record_swap_duration("test-job", 1.5);
    }
}
