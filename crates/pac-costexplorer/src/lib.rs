//! # PAC Cost Explorer
//!
//! Pulls Savings Plans coverage and utilization from AWS Cost Explorer and
//! publishes them into a [`pac_common::SavingsPlansMetrics`] registry.
//!
//! ## Pipeline
//!
//! ```text
//! FetchOrchestrator::run_once
//!   ├── CoverageFetcher     (paginated, labeled gauges)
//!   └── UtilizationFetcher  (single call, unlabeled gauges)
//!         │
//!         └── BillingApi ── AwsCostExplorer
//! ```
//!
//! Each tick queries a one-day window ending 48 hours in the past, since
//! Cost Explorer data for more recent days is not final. A field that fails
//! to parse is skipped on its own; an API failure ends that fetcher's work
//! for the tick and leaves previously published values in place.

pub mod api;
pub mod aws;
mod call;
#[cfg(test)]
mod capture;
pub mod convert;
pub mod coverage;
pub mod orchestrator;
pub mod report;
pub mod utilization;
pub mod window;

pub use api::{
    BillingApi, CoveragePage, CoverageQuery, CoverageRecord, Granularity, UtilizationQuery,
    UtilizationSummary,
};
pub use aws::AwsCostExplorer;
pub use convert::{parse_decimal, FieldPublisher, SpanStatus};
pub use coverage::CoverageFetcher;
pub use orchestrator::{FetchOrchestrator, TickReport};
pub use report::{FetchReport, FetchStatus};
pub use utilization::UtilizationFetcher;
pub use window::QueryWindow;
