//! Prometheus AWS Costs exporter service
//!
//! Wires the Cost Explorer fetchers to a periodic scheduler and exposes the
//! shared registry on an HTTP scrape endpoint.

pub mod config;
pub mod scheduler;
pub mod server;
pub mod telemetry;

pub use config::ExporterConfig;
