//! Billing API seam
//!
//! The fetchers only see this trait and these plain types; the AWS SDK lives
//! behind [`crate::aws::AwsCostExplorer`]. Numeric fields stay as the
//! provider's decimal strings until the fetchers convert them.

use crate::window::QueryWindow;
use async_trait::async_trait;
use pac_common::BillingApiError;
use std::collections::HashMap;

/// Maximum coverage rows requested per page
pub const COVERAGE_PAGE_SIZE: i32 = 20;

/// Cost Explorer metric requested by the coverage query
pub const COVERAGE_METRIC: &str = "SpendCoveredBySavingsPlans";

/// Attribute keys coverage rows are grouped by
pub const GROUP_INSTANCE_TYPE_FAMILY: &str = "INSTANCE_TYPE_FAMILY";
pub const GROUP_REGION: &str = "REGION";
pub const GROUP_SERVICE: &str = "SERVICE";

/// Time bucket size of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
}

/// Inputs of one coverage page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageQuery {
    pub window: QueryWindow,
    pub max_results: i32,
    pub granularity: Granularity,
    /// Tag keys to group by, in label order
    pub group_by: Vec<&'static str>,
    pub metrics: Vec<&'static str>,
    /// Continuation token from the previous page
    pub next_token: Option<String>,
}

impl CoverageQuery {
    /// First page of the standard grouped coverage query
    pub fn first_page(window: QueryWindow) -> Self {
        Self {
            window,
            max_results: COVERAGE_PAGE_SIZE,
            granularity: Granularity::Daily,
            group_by: vec![GROUP_INSTANCE_TYPE_FAMILY, GROUP_REGION, GROUP_SERVICE],
            metrics: vec![COVERAGE_METRIC],
            next_token: None,
        }
    }

    /// Same query, continued from `token`
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.next_token = token;
        self
    }
}

/// One coverage row for an (instance family, region, service) group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageRecord {
    pub attributes: HashMap<String, String>,
    pub coverage_percentage: Option<String>,
    pub on_demand_cost: Option<String>,
    pub spend_covered_by_savings_plans: Option<String>,
    pub total_cost: Option<String>,
}

impl CoverageRecord {
    /// Attribute value, empty when the provider omitted the key
    pub fn attribute(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or_default()
    }
}

/// One page of coverage rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoveragePage {
    pub records: Vec<CoverageRecord>,
    /// Present when more pages follow
    pub next_token: Option<String>,
}

/// Inputs of the utilization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtilizationQuery {
    pub window: QueryWindow,
    pub granularity: Granularity,
}

impl UtilizationQuery {
    pub fn new(window: QueryWindow) -> Self {
        Self {
            window,
            granularity: Granularity::Daily,
        }
    }
}

/// Account-wide utilization and savings totals for the window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtilizationSummary {
    pub total_commitment: Option<String>,
    pub unused_commitment: Option<String>,
    pub used_commitment: Option<String>,
    pub utilization_percentage: Option<String>,
    pub net_savings: Option<String>,
    pub on_demand_cost_equivalent: Option<String>,
}

/// Read-only Savings Plans queries against the billing provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Fetch one page of grouped coverage rows
    async fn savings_plans_coverage(
        &self,
        query: &CoverageQuery,
    ) -> Result<CoveragePage, BillingApiError>;

    /// Fetch the aggregate utilization for the window
    async fn savings_plans_utilization(
        &self,
        query: &UtilizationQuery,
    ) -> Result<UtilizationSummary, BillingApiError>;
}
