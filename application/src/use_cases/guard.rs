//! Execution Guard
//!
//! Bounds a single tool invocation with a timeout, turning a hang into a
//! typed [`ToolError`] the model can read.
//!
//! The bound is best-effort. The invocation runs as its own tokio task; on
//! expiry the guard stops waiting and drops the join handle, which detaches
//! the task instead of aborting it. A runaway handler therefore keeps
//! running (and consuming whatever it consumes) after the guard has
//! reported `Timeout`.

use relay_domain::ToolError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Races tool invocations against an optional per-call deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionGuard {
    timeout: Option<Duration>,
}

impl ExecutionGuard {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `operation` for `tool_name` under the configured bound.
    ///
    /// If the operation settles first its result passes through unchanged.
    /// A panic inside the operation becomes an `ExecutionFailed` error.
    pub async fn guard<F>(
        &self,
        tool_name: &str,
        operation: F,
    ) -> Result<serde_json::Value, ToolError>
    where
        F: Future<Output = Result<serde_json::Value, ToolError>> + Send + 'static,
    {
        let handle = tokio::spawn(operation);

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    let limit_ms = millis(limit);
                    warn!(tool = %tool_name, limit_ms, "Tool call timed out; handler left running");
                    return Err(ToolError::timeout(tool_name, limit_ms));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(result) => result,
            Err(join_error) => {
                debug!(tool = %tool_name, error = %join_error, "Tool task did not complete");
                Err(ToolError::execution_failed(format!(
                    "Tool '{}' aborted: {}",
                    tool_name, join_error
                )))
            }
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::ToolErrorKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_never_settling_handler_times_out_at_bound() {
        let guard = ExecutionGuard::new(Some(Duration::from_millis(50)));
        let started = tokio::time::Instant::now();

        let err = guard
            .guard("getPositions", std::future::pending())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Timeout);
        assert!(err.message.contains("getPositions"));
        assert!(err.message.contains("50ms"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_result_passes_through() {
        let guard = ExecutionGuard::new(Some(Duration::from_millis(50)));

        let ok = guard
            .guard("getAvailableMargin", async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(serde_json::json!({"margin": 12.5}))
            })
            .await
            .unwrap();
        assert_eq!(ok["margin"], 12.5);

        let err = guard
            .guard("placeOrder", async {
                Err(ToolError::invalid_argument("size must be positive"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArgument);
        assert_eq!(err.message, "size must be positive");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_handler_is_detached_not_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let guard = ExecutionGuard::new(Some(Duration::from_millis(20)));

        let err = guard
            .guard("slow", async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(serde_json::Value::Null)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Timeout);
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panic_becomes_execution_failure() {
        let guard = ExecutionGuard::new(None);

        let err = guard
            .guard("explode", async {
                if true {
                    panic!("handler bug");
                }
                Ok(serde_json::Value::Null)
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::ExecutionFailed);
        assert!(err.message.contains("explode"));
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_timeout_accessor() {
        assert_eq!(ExecutionGuard::default().timeout(), None);
        let guard = ExecutionGuard::new(Some(Duration::from_millis(50)));
        assert_eq!(guard.timeout(), Some(Duration::from_millis(50)));
    }
}
