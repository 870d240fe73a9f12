//! One billing API attempt: cancellation and failure classification

use pac_common::BillingApiError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Run `request` unless `cancel` fires first
///
/// A cancelled request is dropped mid-flight and surfaces as
/// [`BillingApiError::Other`], the same as any other failed call.
pub(crate) async fn cancellable<T, F>(
    cancel: &CancellationToken,
    request: F,
) -> Result<T, BillingApiError>
where
    F: Future<Output = Result<T, BillingApiError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BillingApiError::Other("request cancelled".to_string())),
        result = request => result,
    }
}

/// Log a failed call at the severity its class deserves
pub(crate) fn log_api_failure(kind: &str, err: &BillingApiError) {
    match err {
        BillingApiError::NoData(_) => {
            info!(error = %err, "No Saving Plans {} found", kind);
        }
        BillingApiError::Other(_) => {
            error!(error = %err, "Cannot fetch Saving Plans {}", kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Capture;
    use std::time::Duration;
    use tracing::Level;

    fn logged(err: BillingApiError) -> Capture {
        let capture = Capture::default();
        tracing::subscriber::with_default(capture.subscriber(), || {
            log_api_failure("coverage", &err)
        });
        capture
    }

    #[test]
    fn test_no_data_logs_at_info() {
        let capture = logged(BillingApiError::NoData("DataUnavailableException".into()));

        assert_eq!(
            capture.events_at(Level::INFO),
            vec!["No Saving Plans coverage found".to_string()]
        );
        assert!(capture.events_at(Level::ERROR).is_empty());
    }

    #[test]
    fn test_other_error_logs_at_error() {
        let capture = logged(BillingApiError::Other("AccessDeniedException".into()));

        assert_eq!(
            capture.events_at(Level::ERROR),
            vec!["Cannot fetch Saving Plans coverage".to_string()]
        );
        assert!(capture.events_at(Level::INFO).is_empty());
    }

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, BillingApiError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_aborts_in_flight_request() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = cancellable(&cancel, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, BillingApiError>(1)
        })
        .await;

        assert_eq!(
            result,
            Err(BillingApiError::Other("request cancelled".to_string()))
        );
    }
}
