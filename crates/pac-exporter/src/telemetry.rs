//! Tracing subscriber setup

use crate::config::ExporterConfig;
use pac_common::{ExporterError, Result};
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `LOG_LEVEL` when both are set. With telemetry
/// enabled, every fetch span is logged on close together with its
/// `otel.status_code` and `otel.status_message` fields.
pub fn init_tracing(config: &ExporterConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ExporterError::Config(format!("invalid log filter: {}", e)))?;

    let span_events = if config.telemetry_enabled {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(span_events))
        .try_init()
        .map_err(|e| ExporterError::Internal(format!("tracing already initialized: {}", e)))?;

    info!(
        service = %config.service_name,
        version = %config.service_version,
        telemetry = config.telemetry_enabled,
        "Tracing initialized"
    );
    Ok(())
}
