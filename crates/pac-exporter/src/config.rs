//! Exporter configuration

use config::{Config, Environment};
use pac_common::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Exporter settings, read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Minimum log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Delay between two refresh ticks
    #[serde(with = "humantime_serde")]
    pub metric_interval: Duration,
    /// Path of the scrape endpoint
    pub metrics_path: String,
    /// Port of the scrape endpoint
    pub metrics_port: u16,
    pub service_name: String,
    pub service_version: String,
    /// Emit span close events with their status fields
    pub telemetry_enabled: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metric_interval: Duration::from_secs(30 * 60),
            metrics_path: "/metrics".to_string(),
            metrics_port: 11223,
            service_name: "prometheus-aws-costs".to_string(),
            service_version: pac_common::VERSION.to_string(),
            telemetry_enabled: false,
        }
    }
}

impl ExporterConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        Self::from_env(Environment::default())
    }

    fn from_env(env: Environment) -> Result<Self> {
        let defaults = Self::default();
        let cfg: Self = Config::builder()
            .set_default("log_level", defaults.log_level)
            .and_then(|b| b.set_default("metric_interval", "30m"))
            .and_then(|b| b.set_default("metrics_path", defaults.metrics_path))
            .and_then(|b| b.set_default("metrics_port", defaults.metrics_port as i64))
            .and_then(|b| b.set_default("service_name", defaults.service_name))
            .and_then(|b| b.set_default("service_version", defaults.service_version))
            .and_then(|b| b.set_default("telemetry_enabled", defaults.telemetry_enabled))
            .map_err(config_error)?
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the exporter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.metrics_port == 0 {
            return Err(ExporterError::Config("METRICS_PORT must be non-zero".into()));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(ExporterError::Config(format!(
                "METRICS_PATH must start with '/', got {:?}",
                self.metrics_path
            )));
        }
        if self.metrics_path == "/health" {
            return Err(ExporterError::Config("METRICS_PATH /health is reserved".into()));
        }
        if self.metric_interval.is_zero() {
            return Err(ExporterError::Config("METRIC_INTERVAL must be non-zero".into()));
        }
        tracing::Level::from_str(&self.log_level).map_err(|_| {
            ExporterError::Config(format!("unknown LOG_LEVEL {:?}", self.log_level))
        })?;
        Ok(())
    }
}

fn config_error(err: config::ConfigError) -> ExporterError {
    ExporterError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_from(vars: &[(&str, &str)]) -> Result<ExporterConfig> {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ExporterConfig::from_env(Environment::default().source(Some(source)))
    }

    #[test]
    fn test_defaults() {
        let cfg = load_from(&[]).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.metric_interval, Duration::from_secs(1800));
        assert_eq!(cfg.metrics_path, "/metrics");
        assert_eq!(cfg.metrics_port, 11223);
        assert_eq!(cfg.service_name, "prometheus-aws-costs");
        assert_eq!(cfg.service_version, pac_common::VERSION);
        assert!(!cfg.telemetry_enabled);
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = load_from(&[
            ("LOG_LEVEL", "debug"),
            ("METRIC_INTERVAL", "1h 30m"),
            ("METRICS_PATH", "/costs"),
            ("METRICS_PORT", "9100"),
            ("TELEMETRY_ENABLED", "true"),
        ])
        .unwrap();

        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.metric_interval, Duration::from_secs(5400));
        assert_eq!(cfg.metrics_path, "/costs");
        assert_eq!(cfg.metrics_port, 9100);
        assert!(cfg.telemetry_enabled);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            vec![("METRICS_PORT", "0")],
            vec![("METRICS_PATH", "metrics")],
            vec![("METRICS_PATH", "/health")],
            vec![("METRIC_INTERVAL", "0s")],
            vec![("METRIC_INTERVAL", "soon")],
            vec![("LOG_LEVEL", "loud")],
        ] {
            let err = load_from(&vars).unwrap_err();
            assert!(matches!(err, ExporterError::Config(_)), "{:?}: {}", vars, err);
        }
    }
}
