//! Async utilities
//!
//! Deadline handling shared by the generation pipeline

use crate::error::{DeskError, DeskResult, ErrorContext};
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Run `future` with a deadline. On expiry the future is dropped, which
/// cancels whatever I/O it was awaiting.
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> DeskResult<T>
where
    F: std::future::Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => {
            warn!(
                operation = operation_name,
                timeout_ms = timeout_ms,
                "Operation exceeded its deadline"
            );
            Err(DeskError::Timeout {
                operation: operation_name.to_string(),
                duration_ms: timeout_ms,
                context: ErrorContext::new("async_utils")
                    .with_operation("timeout")
                    .with_metadata("timeout_ms", &timeout_ms.to_string())
                    .with_suggestion("Increase generation_timeout_ms")
                    .with_suggestion("Verify completion provider availability"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(async { 42 }, 1000, "quick").await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            tokio::time::sleep(Duration::from_millis(200)),
            10,
            "slow",
        )
        .await;

        match result {
            Err(DeskError::Timeout {
                operation,
                duration_ms,
                ..
            }) => {
                assert_eq!(operation, "slow");
                assert_eq!(duration_ms, 10);
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }
}
