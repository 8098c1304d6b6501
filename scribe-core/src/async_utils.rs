//! Async utilities and patterns

use crate::error::{ErrorContext, ScribeError, ScribeResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Race a future against a timer.
///
/// On expiry the future is dropped and a `Timeout` error is returned; whether the
/// underlying I/O is cancelled depends on the future.
pub async fn with_timeout<F, T>(future: F, duration: Duration, operation_name: &str) -> ScribeResult<T>
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => Ok(result),
        Err(_) => {
            let timeout_ms = duration.as_millis() as u64;
            Err(ScribeError::Timeout {
                operation: operation_name.to_string(),
                duration_ms: timeout_ms,
                context: ErrorContext::new("async_utils")
                    .with_operation("timeout")
                    .with_metadata("timeout_ms", &timeout_ms.to_string())
                    .with_suggestion("Increase timeout duration")
                    .with_suggestion("Verify provider availability"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            std::future::pending::<()>(),
            Duration::from_secs(10),
            "never_resolves",
        )
        .await;

        let error = result.unwrap_err();
        assert!(error.is_recoverable());
        assert_eq!(error.retry_delay_ms(), Some(2000));
        match error {
            ScribeError::Timeout {
                operation,
                duration_ms,
                ..
            } => {
                assert_eq!(operation, "never_resolves");
                assert_eq!(duration_ms, 10_000);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_passes_value_through() {
        let result = with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                42
            },
            Duration::from_secs(1),
            "fast",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
    }
}
