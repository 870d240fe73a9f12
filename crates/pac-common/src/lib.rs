//! # PAC Common
//!
//! Shared pieces of the Prometheus AWS Costs exporter.
//!
//! - [`SavingsPlansMetrics`]: the explicitly constructed metric registry that
//!   fetchers write into and the scrape endpoint reads from
//! - [`ExporterError`]: startup and serving errors
//! - [`BillingApiError`]: the two-way classification of billing API failures
//! - [`ConversionError`]: a provider field that is not a decimal number

pub mod error;
pub mod metrics;

// Re-export commonly used types at crate root
pub use error::{BillingApiError, ConversionError, ExporterError, Result};
pub use metrics::{
    CoverageLabels, CoverageMetric, SavingsPlansMetrics, UtilizationMetric, API_CALLS_METRIC,
    COVERAGE_LABELS,
};

/// Exporter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
