//! One refresh tick: both fetchers, concurrently, over the same window

use crate::api::BillingApi;
use crate::coverage::CoverageFetcher;
use crate::report::FetchReport;
use crate::utilization::UtilizationFetcher;
use crate::window::QueryWindow;
use pac_common::SavingsPlansMetrics;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// Reports of both fetchers for one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub window: QueryWindow,
    pub coverage: FetchReport,
    pub utilization: FetchReport,
}

impl TickReport {
    /// API calls issued by the tick
    pub fn api_calls(&self) -> u64 {
        self.coverage.api_calls + self.utilization.api_calls
    }
}

/// Runs the coverage and utilization fetchers as independent tasks
#[derive(Clone)]
pub struct FetchOrchestrator {
    coverage: CoverageFetcher,
    utilization: UtilizationFetcher,
}

impl FetchOrchestrator {
    pub fn new(api: Arc<dyn BillingApi>, metrics: Arc<SavingsPlansMetrics>) -> Self {
        Self {
            coverage: CoverageFetcher::new(api.clone(), metrics.clone()),
            utilization: UtilizationFetcher::new(api, metrics),
        }
    }

    /// Refresh all metrics for the window ending 48h before now
    pub async fn run_once(&self, cancel: &CancellationToken) -> TickReport {
        self.run_once_with_window(QueryWindow::current(), cancel)
            .await
    }

    /// Refresh all metrics for an explicit window
    ///
    /// Returns once both fetchers have finished. Neither fetcher's outcome
    /// affects the other.
    pub async fn run_once_with_window(
        &self,
        window: QueryWindow,
        cancel: &CancellationToken,
    ) -> TickReport {
        let span = info_span!("refresh-metrics", window = %window);
        async move {
            info!("Refreshing Saving Plans metrics");

            let coverage = {
                let fetcher = self.coverage.clone();
                let cancel = cancel.clone();
                tokio::spawn(
                    async move { fetcher.fetch(&window, &cancel).await }.in_current_span(),
                )
            };
            let utilization = {
                let fetcher = self.utilization.clone();
                let cancel = cancel.clone();
                tokio::spawn(
                    async move { fetcher.fetch(&window, &cancel).await }.in_current_span(),
                )
            };

            let report = TickReport {
                window,
                coverage: join("coverage", coverage).await,
                utilization: join("utilization", utilization).await,
            };
            info!(
                coverage = ?report.coverage.status,
                utilization = ?report.utilization.status,
                api_calls = report.api_calls(),
                "Saving Plans metrics refreshed"
            );
            report
        }
        .instrument(span)
        .await
    }
}

async fn join(fetcher: &str, handle: JoinHandle<FetchReport>) -> FetchReport {
    match handle.await {
        Ok(report) => report,
        Err(err) => {
            error!(fetcher, error = %err, "Fetcher task did not complete");
            FetchReport::failed()
        }
    }
}
