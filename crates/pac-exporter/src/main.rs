//! Prometheus AWS Costs exporter binary

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pac_common::SavingsPlansMetrics;
use pac_costexplorer::{AwsCostExplorer, FetchOrchestrator};
use pac_exporter::{scheduler, server, telemetry, ExporterConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExporterConfig::load()?;
    telemetry::init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    let metrics = Arc::new(SavingsPlansMetrics::new()?);
    let api = Arc::new(AwsCostExplorer::from_env().await);
    let orchestrator = FetchOrchestrator::new(api, metrics.clone());

    let listener = server::bind(config.metrics_port).await?;
    let cancel = CancellationToken::new();

    let server = tokio::spawn(server::serve(
        listener,
        server::router(metrics, &config.metrics_path),
        cancel.clone(),
    ));
    let refresh = tokio::spawn(scheduler::run(
        orchestrator,
        config.metric_interval,
        cancel.clone(),
    ));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                shutdown.cancel();
            }
            Err(err) => error!(error = %err, "Cannot listen for shutdown signal"),
        }
    });

    let served = server.await?;
    // a server failure must stop the scheduler too
    cancel.cancel();
    refresh.await?;
    served?;

    info!("Shutting down {}", config.service_name);
    Ok(())
}
