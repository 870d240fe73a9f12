//! Savings Plans utilization fetcher

use crate::api::{BillingApi, UtilizationQuery, UtilizationSummary};
use crate::call::{cancellable, log_api_failure};
use crate::convert::FieldPublisher;
use crate::report::FetchReport;
use crate::window::QueryWindow;
use pac_common::{SavingsPlansMetrics, UtilizationMetric};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, info_span, Instrument};

/// Fetches the account-wide utilization totals and writes the six
/// unlabeled utilization gauges
#[derive(Clone)]
pub struct UtilizationFetcher {
    api: Arc<dyn BillingApi>,
    metrics: Arc<SavingsPlansMetrics>,
}

impl UtilizationFetcher {
    pub fn new(api: Arc<dyn BillingApi>, metrics: Arc<SavingsPlansMetrics>) -> Self {
        Self { api, metrics }
    }

    /// Issue the single utilization call for `window` and publish the result
    pub async fn fetch(&self, window: &QueryWindow, cancel: &CancellationToken) -> FetchReport {
        info!("Get Saving Plans utilization metrics");

        let span = info_span!(
            "get-costexplorer-savingplans-utilization-metrics",
            window = %window,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );
        let publisher = FieldPublisher::new(span.clone());
        self.fetch_once(window, cancel, publisher)
            .instrument(span)
            .await
    }

    async fn fetch_once(
        &self,
        window: &QueryWindow,
        cancel: &CancellationToken,
        mut publisher: FieldPublisher,
    ) -> FetchReport {
        let query = UtilizationQuery::new(*window);
        let result = cancellable(cancel, self.api.savings_plans_utilization(&query)).await;
        self.metrics.inc_api_calls();

        let mut report = FetchReport::new();
        report.api_calls = 1;

        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                log_api_failure("utilization", &err);
                if !err.is_no_data() {
                    publisher.mark_error("Cannot fetch Saving Plans utilization");
                }
                return report.finish(Some(&err));
            }
        };

        debug!(utilization = ?summary, "Saving Plans utilization output");
        report.records = 1;
        for metric in UtilizationMetric::ALL {
            publisher.publish(metric.field(), raw_field(&summary, metric), |value| {
                self.metrics.set_utilization(metric, value)
            });
        }

        report.skipped_fields = publisher.skipped();
        let report = report.finish(None);
        if report.is_success() {
            publisher.mark_ok("Saving Plans utilization metrics fetched");
        }
        report
    }
}

fn raw_field(summary: &UtilizationSummary, metric: UtilizationMetric) -> Option<&str> {
    match metric {
        UtilizationMetric::TotalCommitment => summary.total_commitment.as_deref(),
        UtilizationMetric::UnusedCommitment => summary.unused_commitment.as_deref(),
        UtilizationMetric::UsedCommitment => summary.used_commitment.as_deref(),
        UtilizationMetric::Percentage => summary.utilization_percentage.as_deref(),
        UtilizationMetric::NetSavings => summary.net_savings.as_deref(),
        UtilizationMetric::OnDemandEquivalent => summary.on_demand_cost_equivalent.as_deref(),
    }
}
