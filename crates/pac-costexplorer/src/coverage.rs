//! Savings Plans coverage fetcher
//!
//! Walks every page of the grouped coverage query and publishes four gauges
//! per (instance family, region, service) row.

use crate::api::{
    BillingApi, CoverageQuery, CoverageRecord, GROUP_INSTANCE_TYPE_FAMILY, GROUP_REGION,
    GROUP_SERVICE,
};
use crate::call::{cancellable, log_api_failure};
use crate::convert::FieldPublisher;
use crate::report::FetchReport;
use crate::window::QueryWindow;
use pac_common::{CoverageLabels, CoverageMetric, SavingsPlansMetrics};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, info_span, Instrument};

/// Fetches coverage rows and writes the labeled coverage gauges
#[derive(Clone)]
pub struct CoverageFetcher {
    api: Arc<dyn BillingApi>,
    metrics: Arc<SavingsPlansMetrics>,
}

impl CoverageFetcher {
    pub fn new(api: Arc<dyn BillingApi>, metrics: Arc<SavingsPlansMetrics>) -> Self {
        Self { api, metrics }
    }

    /// Fetch all coverage pages for `window` and publish them
    ///
    /// Pagination stops at the first page without a continuation token, or
    /// at the first failed call. Errors never escape; they are logged and
    /// reflected in the returned report.
    pub async fn fetch(&self, window: &QueryWindow, cancel: &CancellationToken) -> FetchReport {
        info!("Get Saving Plans coverage metrics");

        let span = info_span!(
            "get-costexplorer-savingplans-coverage-metrics",
            window = %window,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );
        let publisher = FieldPublisher::new(span.clone());
        self.fetch_pages(window, cancel, publisher)
            .instrument(span)
            .await
    }

    async fn fetch_pages(
        &self,
        window: &QueryWindow,
        cancel: &CancellationToken,
        mut publisher: FieldPublisher,
    ) -> FetchReport {
        let mut report = FetchReport::new();

        let mut query = CoverageQuery::first_page(*window);
        let api_error = loop {
            let result = cancellable(cancel, self.api.savings_plans_coverage(&query)).await;
            self.metrics.inc_api_calls();
            report.api_calls += 1;

            let page = match result {
                Ok(page) => page,
                Err(err) => {
                    log_api_failure("coverage", &err);
                    if !err.is_no_data() {
                        publisher.mark_error("Cannot fetch Saving Plans coverage");
                    }
                    break Some(err);
                }
            };

            debug!(records = page.records.len(), "Output from GetSavingsPlansCoverage");
            for record in &page.records {
                self.publish_record(record, &mut publisher);
                report.records += 1;
            }

            match page.next_token {
                Some(token) => query = query.with_token(Some(token)),
                None => break None,
            }
        };

        report.skipped_fields = publisher.skipped();
        let report = report.finish(api_error.as_ref());
        if report.is_success() {
            publisher.mark_ok("Saving Plans coverage metrics fetched");
        }
        report
    }

    fn publish_record(&self, record: &CoverageRecord, publisher: &mut FieldPublisher) {
        debug!(coverage = ?record, "Coverage record");

        let labels = CoverageLabels::new(
            record.attribute(GROUP_INSTANCE_TYPE_FAMILY),
            record.attribute(GROUP_REGION),
            record.attribute(GROUP_SERVICE),
        );

        for metric in CoverageMetric::ALL {
            let raw = match metric {
                CoverageMetric::Percentage => record.coverage_percentage.as_deref(),
                CoverageMetric::OnDemandCost => record.on_demand_cost.as_deref(),
                CoverageMetric::CoveredCost => record.spend_covered_by_savings_plans.as_deref(),
                CoverageMetric::TotalCost => record.total_cost.as_deref(),
            };
            publisher.publish(metric.field(), raw, |value| {
                self.metrics.set_coverage(metric, &labels, value)
            });
        }
    }
}
