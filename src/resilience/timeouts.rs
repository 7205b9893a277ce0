//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race an operation against a deadline
//! - Map expiry into the operation's own error type, so a guarded call
//!   that times out is recorded as an ordinary failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

/// Run `fut` with a deadline, converting expiry with `on_timeout`.
pub async fn with_timeout<T, E, Fut>(
    duration: Duration,
    fut: Fut,
    on_timeout: impl FnOnce() -> E,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_error() {
        let result: Result<(), String> = with_timeout(
            Duration::from_millis(1000),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            || "Request timeout".to_string(),
        )
        .await;
        assert_eq!(result.unwrap_err(), "Request timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_operation_passes_through() {
        let result: Result<u32, String> = with_timeout(
            Duration::from_millis(1000),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(7)
            },
            || "Request timeout".to_string(),
        )
        .await;
        assert_eq!(result.unwrap(), 7);

        let failed: Result<u32, String> = with_timeout(
            Duration::from_millis(1000),
            async { Err("refused".to_string()) },
            || "Request timeout".to_string(),
        )
        .await;
        assert_eq!(failed.unwrap_err(), "refused");
    }
}
