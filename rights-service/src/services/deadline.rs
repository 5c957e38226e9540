use std::future::Future;
use std::time::Duration;

use crate::services::error::{AccessError, BackendError};

/// Run a collaborator call under `timeout`. Timeouts and backend faults both
/// become `EvaluationUnavailable`, never a verdict.
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    op: &'static str,
    call: F,
) -> Result<T, AccessError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::warn!(op, error = %err, "Backend call failed");
            Err(err.into())
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            tracing::warn!(op, timeout_ms, "Backend call timed out");
            Err(AccessError::EvaluationUnavailable(format!(
                "{} timed out after {}ms",
                op, timeout_ms
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let result: Result<(), _> = bounded(Duration::from_millis(10), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(
            matches!(result, Err(AccessError::EvaluationUnavailable(msg)) if msg.contains("slow"))
        );
    }

    #[tokio::test]
    async fn test_backend_error_is_unavailable() {
        let result: Result<(), _> = bounded(Duration::from_secs(1), "broken", async {
            Err(BackendError::Unreachable("connection refused".to_string()))
        })
        .await;
        assert!(matches!(result, Err(AccessError::EvaluationUnavailable(_))));
    }
}
