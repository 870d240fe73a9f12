//! Error types for the exporter
//!
//! Provides the process-level error type plus the two pipeline error
//! taxonomies: billing API failures and field conversion failures.

use thiserror::Error;

/// Result type alias using ExporterError
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Unified error type for exporter startup and serving
#[derive(Debug, Error)]
pub enum ExporterError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Metric registration and encoding errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // Socket and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single billing API request.
///
/// The fetchers match on the variant to pick the log severity; nothing
/// inspects the message beyond logging it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingApiError {
    /// The provider has not published data for the requested window yet
    #[error("No data available: {0}")]
    NoData(String),

    /// Network, authorization, throttling, malformed request or cancellation
    #[error("Billing API error: {0}")]
    Other(String),
}

impl BillingApiError {
    /// Whether this is the expected "no data yet" condition
    pub fn is_no_data(&self) -> bool {
        matches!(self, BillingApiError::NoData(_))
    }
}

/// A provider field that did not parse as a decimal number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot convert {field} value {raw:?} to float")]
pub struct ConversionError {
    /// Provider field name, e.g. `CoveragePercentage`
    pub field: &'static str,
    /// The literal string returned by the provider (empty when missing)
    pub raw: String,
}
