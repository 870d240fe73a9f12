//! Periodic refresh loop

use pac_costexplorer::FetchOrchestrator;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run a refresh tick every `period` until `cancel` fires
///
/// The first tick runs immediately. A tick that outlasts `period` delays the
/// next one instead of overlapping it. Returns the number of ticks run.
pub async fn run(orchestrator: FetchOrchestrator, period: Duration, cancel: CancellationToken) -> u64 {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period = ?period, "Metric refresh scheduled");

    let mut ticks = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let report = orchestrator.run_once(&cancel).await;
        ticks += 1;
        debug!(tick = ticks, api_calls = report.api_calls(), "Tick finished");
    }

    info!(ticks, "Metric refresh stopped");
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pac_common::{BillingApiError, SavingsPlansMetrics};
    use pac_costexplorer::{
        BillingApi, CoveragePage, CoverageQuery, UtilizationQuery, UtilizationSummary,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingApi {
        utilization_calls: AtomicUsize,
    }

    #[async_trait]
    impl BillingApi for CountingApi {
        async fn savings_plans_coverage(
            &self,
            _query: &CoverageQuery,
        ) -> Result<CoveragePage, BillingApiError> {
            Ok(CoveragePage::default())
        }

        async fn savings_plans_utilization(
            &self,
            _query: &UtilizationQuery,
        ) -> Result<UtilizationSummary, BillingApiError> {
            self.utilization_calls.fetch_add(1, Ordering::SeqCst);
            Err(BillingApiError::NoData("DataUnavailableException".into()))
        }
    }

    fn setup() -> (FetchOrchestrator, Arc<CountingApi>, Arc<SavingsPlansMetrics>) {
        let api = Arc::new(CountingApi::default());
        let metrics = Arc::new(SavingsPlansMetrics::new().unwrap());
        (FetchOrchestrator::new(api.clone(), metrics.clone()), api, metrics)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_immediately_then_every_period() {
        let (orchestrator, api, metrics) = setup();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(orchestrator, Duration::from_secs(1800), cancel.clone()));

        // ticks at 0, 30m and 60m
        tokio::time::sleep(Duration::from_secs(3601)).await;
        cancel.cancel();
        let ticks = handle.await.unwrap();

        assert_eq!(ticks, 3);
        assert_eq!(api.utilization_calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.api_calls(), 6);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let (orchestrator, api, _metrics) = setup();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let ticks = run(orchestrator, Duration::from_secs(1800), cancel).await;

        assert_eq!(ticks, 0);
        assert_eq!(api.utilization_calls.load(Ordering::SeqCst), 0);
    }
}
