//! AWS Cost Explorer implementation of [`BillingApi`]

use crate::api::{
    BillingApi, CoveragePage, CoverageQuery, CoverageRecord, Granularity, UtilizationQuery,
    UtilizationSummary,
};
use crate::window::QueryWindow;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_costexplorer::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_costexplorer::operation::get_savings_plans_coverage::GetSavingsPlansCoverageError;
use aws_sdk_costexplorer::operation::get_savings_plans_utilization::GetSavingsPlansUtilizationError;
use aws_sdk_costexplorer::types::{
    DateInterval, GroupDefinition, GroupDefinitionType, SavingsPlansCoverage,
};
use aws_sdk_costexplorer::{types, Client};
use pac_common::BillingApiError;
use std::fmt::Debug;
use tracing::debug;

/// Cost Explorer client wrapper
#[derive(Debug, Clone)]
pub struct AwsCostExplorer {
    client: Client,
}

impl AwsCostExplorer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential and region chain
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        debug!(region = ?config.region(), "Loaded AWS configuration");
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl BillingApi for AwsCostExplorer {
    async fn savings_plans_coverage(
        &self,
        query: &CoverageQuery,
    ) -> Result<CoveragePage, BillingApiError> {
        let mut request = self
            .client
            .get_savings_plans_coverage()
            .time_period(date_interval(&query.window)?)
            .granularity(granularity(query.granularity))
            .max_results(query.max_results)
            .set_next_token(query.next_token.clone());
        for key in &query.group_by {
            request = request.group_by(
                GroupDefinition::builder()
                    .r#type(GroupDefinitionType::Tag)
                    .key(*key)
                    .build(),
            );
        }
        for metric in &query.metrics {
            request = request.metrics(*metric);
        }

        let output = request.send().await.map_err(classify_coverage)?;

        Ok(CoveragePage {
            records: output
                .savings_plans_coverages()
                .iter()
                .map(coverage_record)
                .collect(),
            next_token: output
                .next_token()
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        })
    }

    async fn savings_plans_utilization(
        &self,
        query: &UtilizationQuery,
    ) -> Result<UtilizationSummary, BillingApiError> {
        let output = self
            .client
            .get_savings_plans_utilization()
            .time_period(date_interval(&query.window)?)
            .granularity(granularity(query.granularity))
            .send()
            .await
            .map_err(classify_utilization)?;

        let total = output.total();
        let utilization = total.and_then(|t| t.utilization());
        let savings = total.and_then(|t| t.savings());

        Ok(UtilizationSummary {
            total_commitment: owned(utilization.and_then(|u| u.total_commitment())),
            unused_commitment: owned(utilization.and_then(|u| u.unused_commitment())),
            used_commitment: owned(utilization.and_then(|u| u.used_commitment())),
            utilization_percentage: owned(utilization.and_then(|u| u.utilization_percentage())),
            net_savings: owned(savings.and_then(|s| s.net_savings())),
            on_demand_cost_equivalent: owned(savings.and_then(|s| s.on_demand_cost_equivalent())),
        })
    }
}

fn date_interval(window: &QueryWindow) -> Result<DateInterval, BillingApiError> {
    DateInterval::builder()
        .start(window.start_str())
        .end(window.end_str())
        .build()
        .map_err(|e| BillingApiError::Other(format!("invalid time period: {}", e)))
}

fn granularity(granularity: Granularity) -> types::Granularity {
    match granularity {
        Granularity::Daily => types::Granularity::Daily,
    }
}

fn coverage_record(coverage: &SavingsPlansCoverage) -> CoverageRecord {
    let data = coverage.coverage();
    CoverageRecord {
        attributes: coverage.attributes().cloned().unwrap_or_default(),
        coverage_percentage: owned(data.and_then(|d| d.coverage_percentage())),
        on_demand_cost: owned(data.and_then(|d| d.on_demand_cost())),
        spend_covered_by_savings_plans: owned(data.and_then(|d| d.spend_covered_by_savings_plans())),
        total_cost: owned(data.and_then(|d| d.total_cost())),
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn classify_coverage<R: Debug>(err: SdkError<GetSavingsPlansCoverageError, R>) -> BillingApiError {
    let no_data = err
        .as_service_error()
        .is_some_and(GetSavingsPlansCoverageError::is_data_unavailable_exception);
    classify(no_data, err.code().map(str::to_string), &err)
}

fn classify_utilization<R: Debug>(
    err: SdkError<GetSavingsPlansUtilizationError, R>,
) -> BillingApiError {
    let no_data = err
        .as_service_error()
        .is_some_and(GetSavingsPlansUtilizationError::is_data_unavailable_exception);
    classify(no_data, err.code().map(str::to_string), &err)
}

fn classify<E: std::error::Error>(no_data: bool, code: Option<String>, err: &E) -> BillingApiError {
    let message = match code {
        Some(code) => format!("{}: {}", code, DisplayErrorContext(err)),
        None => DisplayErrorContext(err).to_string(),
    };
    if no_data {
        BillingApiError::NoData(message)
    } else {
        BillingApiError::Other(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_costexplorer::types::SavingsPlansCoverageData;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    #[test]
    fn test_date_interval_uses_window_dates() {
        let window = QueryWindow {
            start: NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };
        let interval = date_interval(&window).unwrap();
        assert_eq!(interval.start(), "2024-02-28");
        assert_eq!(interval.end(), "2024-02-29");
    }

    #[test]
    fn test_coverage_record_mapping() {
        let coverage = SavingsPlansCoverage::builder()
            .set_attributes(Some(HashMap::from([(
                "REGION".to_string(),
                "eu-west-1".to_string(),
            )])))
            .coverage(
                SavingsPlansCoverageData::builder()
                    .coverage_percentage("42.5")
                    .total_cost("100.00")
                    .build(),
            )
            .build();

        let record = coverage_record(&coverage);
        assert_eq!(record.attribute("REGION"), "eu-west-1");
        assert_eq!(record.attribute("SERVICE"), "");
        assert_eq!(record.coverage_percentage.as_deref(), Some("42.5"));
        assert_eq!(record.total_cost.as_deref(), Some("100.00"));
        assert!(record.on_demand_cost.is_none());
    }

    #[test]
    fn test_record_without_coverage_data() {
        let record = coverage_record(&SavingsPlansCoverage::builder().build());
        assert!(record.attributes.is_empty());
        assert!(record.spend_covered_by_savings_plans.is_none());
    }
}
