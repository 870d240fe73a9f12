//! Outcome of one fetcher invocation

use pac_common::BillingApiError;

/// Terminal state of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Every call and every field succeeded
    Succeeded,
    /// Calls succeeded but at least one field was skipped
    PartiallySucceeded,
    /// The provider has no data for the window yet
    NoData,
    /// A call failed for any other reason, or the task died
    Failed,
}

/// What a fetcher did during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub status: FetchStatus,
    /// Billing API requests attempted, successful or not
    pub api_calls: u64,
    /// Records processed across all pages
    pub records: usize,
    /// Fields skipped because they did not parse
    pub skipped_fields: usize,
}

impl FetchReport {
    pub(crate) fn new() -> Self {
        Self {
            status: FetchStatus::Succeeded,
            api_calls: 0,
            records: 0,
            skipped_fields: 0,
        }
    }

    /// Report for a task that never returned
    pub fn failed() -> Self {
        Self {
            status: FetchStatus::Failed,
            ..Self::new()
        }
    }

    /// Settle the status once the fetch loop is over
    pub(crate) fn finish(mut self, api_error: Option<&BillingApiError>) -> Self {
        self.status = match api_error {
            Some(BillingApiError::NoData(_)) => FetchStatus::NoData,
            Some(BillingApiError::Other(_)) => FetchStatus::Failed,
            None if self.skipped_fields > 0 => FetchStatus::PartiallySucceeded,
            None => FetchStatus::Succeeded,
        };
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Succeeded
    }
}
