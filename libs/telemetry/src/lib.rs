//! Tracing setup and outcome recorders for the order stock notifier.
//!
//! Logs go to stdout (JSON unless `LOG_FORMAT=text`), optionally mirrored to an OTLP
//! collector. Counters use the `metrics` facade and are no-ops until a recorder is set.

use anyhow::Result;

mod config;
mod outcomes;
mod tracing_init;

pub use config::{LogFormat, OtlpTarget, TelemetryConfig, TelemetryProtocol};
pub use outcomes::{record_order_fields, record_outcome, start_webhook_span};
pub use tracing_init::{init_telemetry, shutdown_telemetry};

/// Installs the subscriber configured from the environment (`RUST_LOG`, `LOG_FORMAT`, `OTEL_*`).
pub fn install(service_name: &str, service_version: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name, service_version))
}
