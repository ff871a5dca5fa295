//! Polling with exponential backoff and cancellation support.
//!
//! Provides a generic abstraction for waiting on an AWS resource (or any
//! async condition) to reach a terminal state.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for polling with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Poll `check` until it yields a terminal value.
///
/// `check` returns `Ok(Some(value))` when done, `Ok(None)` to poll again,
/// and `Err` to abort immediately.
///
/// # Returns
/// * `Ok(value)` - The terminal value from `check`
/// * `Err` - Timeout, cancelled, or check returned an error
///
/// # Example
/// ```ignore
/// let status = wait_for(
///     WaitConfig::default(),
///     Some(&cancel_token),
///     || async { Ok(lookup_status().await?.filter(|s| s.is_terminal())) },
///     "my-stack",
/// ).await?;
/// ```
pub async fn wait_for<T, F, Fut>(
    config: WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    resource_name: &str,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    let mut delays = backoff.into_iter();

    loop {
        attempts += 1;

        if cancel.is_some_and(|token| token.is_cancelled()) {
            anyhow::bail!("Wait for {} cancelled", resource_name);
        }

        if start.elapsed() >= config.timeout {
            anyhow::bail!(
                "Timeout waiting for {} after {:?} ({} attempts)",
                resource_name,
                config.timeout,
                attempts
            );
        }

        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, attempts, "Wait finished");
                return Ok(value);
            }
            Ok(None) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Not finished, polling again"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        match cancel {
                            Some(token) => token.cancelled().await,
                            None => std::future::pending::<()>().await,
                        }
                    } => {
                        anyhow::bail!("Wait for {} cancelled", resource_name);
                    }
                }
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Wait check failed");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_returns_terminal_value() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let value = wait_for(
            fast_config(),
            None,
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok((n >= 2).then_some("done"))
            },
            "test",
        )
        .await
        .unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_check_error_aborts() {
        let err = wait_for::<(), _, _>(
            fast_config(),
            None,
            || async { Err(anyhow::anyhow!("DescribeStacksError")) },
            "test",
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "DescribeStacksError");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let err = wait_for::<(), _, _>(fast_config(), Some(&token), || async { Ok(None) }, "stack")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let config = WaitConfig {
            timeout: Duration::from_millis(20),
            ..fast_config()
        };

        let err = wait_for::<(), _, _>(config, None, || async { Ok(None) }, "stack")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Timeout waiting for stack"));
    }
}
