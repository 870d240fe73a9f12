//! Prometheus metric registry for Savings Plans data
//!
//! One `SavingsPlansMetrics` is built at startup and shared by `Arc` between
//! the fetchers (writers) and the scrape endpoint (reader). Metric names and
//! label names are part of the exporter's public contract: dashboards query
//! them directly, so they must not change.

use crate::error::Result;
use prometheus::core::Collector;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, Opts, Registry, TextEncoder};

/// Label names shared by every coverage gauge
pub const COVERAGE_LABELS: [&str; 3] = ["aws_instance_type_family", "aws_region", "aws_service"];

/// Coverage gauges, one per field of a coverage record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageMetric {
    /// Percentage of spend covered by plans
    Percentage,
    /// Equivalent on-demand cost
    OnDemandCost,
    /// Spend covered by plans
    CoveredCost,
    /// Total spend regardless of plans
    TotalCost,
}

impl CoverageMetric {
    pub const ALL: [CoverageMetric; 4] = [
        CoverageMetric::Percentage,
        CoverageMetric::OnDemandCost,
        CoverageMetric::CoveredCost,
        CoverageMetric::TotalCost,
    ];

    /// Provider field the gauge is fed from
    pub fn field(&self) -> &'static str {
        match self {
            CoverageMetric::Percentage => "CoveragePercentage",
            CoverageMetric::OnDemandCost => "OnDemandCost",
            CoverageMetric::CoveredCost => "SpendCoveredBySavingsPlans",
            CoverageMetric::TotalCost => "TotalCost",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            CoverageMetric::Percentage => "pac_savingplans_coverage_percent",
            CoverageMetric::OnDemandCost => "pac_savingplans_coverage_ondemandcost_dollar",
            CoverageMetric::CoveredCost => "pac_savingplans_coverage_coveredcost_dollar",
            CoverageMetric::TotalCost => "pac_savingplans_coverage_totalcost_dollar",
        }
    }

    fn help(&self) -> &'static str {
        match self {
            CoverageMetric::Percentage => "Percentage of cost covered by Saving Plans",
            CoverageMetric::OnDemandCost => "Cost for On Demand in Dollars",
            CoverageMetric::CoveredCost => "Number of dollar covered by Saving Plans",
            CoverageMetric::TotalCost => "total cost spent on AWS regardless of Saving Plans",
        }
    }
}

/// Account-wide utilization gauges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtilizationMetric {
    TotalCommitment,
    UnusedCommitment,
    UsedCommitment,
    Percentage,
    NetSavings,
    OnDemandEquivalent,
}

impl UtilizationMetric {
    pub const ALL: [UtilizationMetric; 6] = [
        UtilizationMetric::TotalCommitment,
        UtilizationMetric::UnusedCommitment,
        UtilizationMetric::UsedCommitment,
        UtilizationMetric::Percentage,
        UtilizationMetric::NetSavings,
        UtilizationMetric::OnDemandEquivalent,
    ];

    /// Provider field the gauge is fed from
    pub fn field(&self) -> &'static str {
        match self {
            UtilizationMetric::TotalCommitment => "TotalCommitment",
            UtilizationMetric::UnusedCommitment => "UnusedCommitment",
            UtilizationMetric::UsedCommitment => "UsedCommitment",
            UtilizationMetric::Percentage => "UtilizationPercentage",
            UtilizationMetric::NetSavings => "NetSavings",
            UtilizationMetric::OnDemandEquivalent => "OnDemandCostEquivalent",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            UtilizationMetric::TotalCommitment => {
                "pac_savingplans_utilization_total_commitment_dollar"
            }
            UtilizationMetric::UnusedCommitment => {
                "pac_savingplans_utilization_unused_commitment_dollar"
            }
            UtilizationMetric::UsedCommitment => "pac_savingplans_utilization_used_commitment_dollar",
            UtilizationMetric::Percentage => "pac_savingplans_utilization_percent",
            UtilizationMetric::NetSavings => "pac_savingplans_utilization_netsavings_dollar",
            UtilizationMetric::OnDemandEquivalent => {
                "pac_savingplans_utilization_ondemand_equivalent_dollar"
            }
        }
    }

    fn help(&self) -> &'static str {
        match self {
            UtilizationMetric::TotalCommitment => "Number of dollars purchased as saving plans.",
            UtilizationMetric::UnusedCommitment => "Number of dollars unused by saving plans.",
            UtilizationMetric::UsedCommitment => "Number of dollars used by saving plans.",
            UtilizationMetric::Percentage => "Percentage of saving plans utilization.",
            UtilizationMetric::NetSavings => "Number of dollar saved by saving plans.",
            UtilizationMetric::OnDemandEquivalent => {
                "Number of dollar you would have paid using on-demand."
            }
        }
    }
}

/// Label key of one coverage row
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CoverageLabels {
    pub instance_type_family: String,
    pub region: String,
    pub service: String,
}

impl CoverageLabels {
    pub fn new(
        instance_type_family: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            instance_type_family: instance_type_family.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    fn values(&self) -> [&str; 3] {
        [&self.instance_type_family, &self.region, &self.service]
    }
}

/// Name of the API call counter
pub const API_CALLS_METRIC: &str = "pac_costexplorer_api_calls_total";

/// All gauges and counters published by the exporter
pub struct SavingsPlansMetrics {
    registry: Registry,
    coverage_percent: GaugeVec,
    coverage_on_demand_cost: GaugeVec,
    coverage_covered_cost: GaugeVec,
    coverage_total_cost: GaugeVec,
    utilization_total_commitment: Gauge,
    utilization_unused_commitment: Gauge,
    utilization_used_commitment: Gauge,
    utilization_percent: Gauge,
    utilization_net_savings: Gauge,
    utilization_on_demand_equivalent: Gauge,
    api_calls: IntCounter,
}

impl SavingsPlansMetrics {
    /// Create every collector and register it with a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if a collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let coverage = |metric: CoverageMetric| {
            GaugeVec::new(
                Opts::new(metric.metric_name(), metric.help()),
                &COVERAGE_LABELS,
            )
        };
        let utilization =
            |metric: UtilizationMetric| Gauge::new(metric.metric_name(), metric.help());

        let metrics = Self {
            registry: Registry::new(),
            coverage_percent: coverage(CoverageMetric::Percentage)?,
            coverage_on_demand_cost: coverage(CoverageMetric::OnDemandCost)?,
            coverage_covered_cost: coverage(CoverageMetric::CoveredCost)?,
            coverage_total_cost: coverage(CoverageMetric::TotalCost)?,
            utilization_total_commitment: utilization(UtilizationMetric::TotalCommitment)?,
            utilization_unused_commitment: utilization(UtilizationMetric::UnusedCommitment)?,
            utilization_used_commitment: utilization(UtilizationMetric::UsedCommitment)?,
            utilization_percent: utilization(UtilizationMetric::Percentage)?,
            utilization_net_savings: utilization(UtilizationMetric::NetSavings)?,
            utilization_on_demand_equivalent: utilization(UtilizationMetric::OnDemandEquivalent)?,
            api_calls: IntCounter::new(
                API_CALLS_METRIC,
                "Number of calls to the AWS Cost Explorer API",
            )?,
        };
        metrics.register()?;
        Ok(metrics)
    }

    fn register(&self) -> Result<()> {
        for metric in CoverageMetric::ALL {
            self.registry
                .register(Box::new(self.coverage_vec(metric).clone()))?;
        }
        for metric in UtilizationMetric::ALL {
            self.registry
                .register(Box::new(self.utilization_gauge(metric).clone()))?;
        }
        self.registry.register(Box::new(self.api_calls.clone()))?;
        Ok(())
    }

    fn coverage_vec(&self, metric: CoverageMetric) -> &GaugeVec {
        match metric {
            CoverageMetric::Percentage => &self.coverage_percent,
            CoverageMetric::OnDemandCost => &self.coverage_on_demand_cost,
            CoverageMetric::CoveredCost => &self.coverage_covered_cost,
            CoverageMetric::TotalCost => &self.coverage_total_cost,
        }
    }

    fn utilization_gauge(&self, metric: UtilizationMetric) -> &Gauge {
        match metric {
            UtilizationMetric::TotalCommitment => &self.utilization_total_commitment,
            UtilizationMetric::UnusedCommitment => &self.utilization_unused_commitment,
            UtilizationMetric::UsedCommitment => &self.utilization_used_commitment,
            UtilizationMetric::Percentage => &self.utilization_percent,
            UtilizationMetric::NetSavings => &self.utilization_net_savings,
            UtilizationMetric::OnDemandEquivalent => &self.utilization_on_demand_equivalent,
        }
    }

    /// Set one labeled coverage gauge
    pub fn set_coverage(&self, metric: CoverageMetric, labels: &CoverageLabels, value: f64) {
        self.coverage_vec(metric)
            .with_label_values(&labels.values())
            .set(value);
    }

    /// Set one utilization gauge
    pub fn set_utilization(&self, metric: UtilizationMetric, value: f64) {
        self.utilization_gauge(metric).set(value);
    }

    /// Count one attempted billing API request
    pub fn inc_api_calls(&self) {
        self.api_calls.inc();
    }

    /// Current value of a coverage gauge, `None` if the label set was never written
    ///
    /// Reads from a collected snapshot so that probing does not create series.
    pub fn coverage(&self, metric: CoverageMetric, labels: &CoverageLabels) -> Option<f64> {
        let wanted = labels.values();
        self.coverage_vec(metric)
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|m| {
                COVERAGE_LABELS.iter().zip(wanted.iter()).all(|(name, value)| {
                    m.get_label()
                        .iter()
                        .any(|l| l.get_name() == *name && l.get_value() == *value)
                })
            })
            .map(|m| m.get_gauge().get_value())
    }

    /// Current value of a utilization gauge
    pub fn utilization(&self, metric: UtilizationMetric) -> f64 {
        self.utilization_gauge(metric).get()
    }

    /// Total attempted billing API requests
    pub fn api_calls(&self) -> u64 {
        self.api_calls.get()
    }

    /// Underlying registry, for callers that gather on their own
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::ExporterError::Internal(e.to_string()))
    }
}

impl std::fmt::Debug for SavingsPlansMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavingsPlansMetrics")
            .field("api_calls", &self.api_calls.get())
            .finish_non_exhaustive()
    }
}
