//! Bounded retry combinator for externally-collaborating calls.
//!
//! Replaces the retry-loop-with-mutable-counter pattern: every worker call
//! to an external collaborator runs through [`with_retries`], which returns
//! a result instead of sharing mutable success/attempt flags.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

use forge_core::{defaults, Error, Result};

/// Run `op` up to `max_attempts` times.
///
/// Each failed attempt is logged, not thrown. Permanent faults
/// ([`Error::is_retryable`] == false) short-circuit immediately; transient
/// faults back off exponentially with jitter between attempts. Exhaustion
/// returns a job error whose message names the operation and attempt count.
pub async fn with_retries<T, F, Fut>(op_name: &str, max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug_assert!(max_attempts >= 1);
    let mut last_error = Error::Internal(format!("{} never attempted", op_name));

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                warn!(op = op_name, attempt, error = %e, "permanent fault, not retrying");
                return Err(e);
            }
            Err(e) => {
                warn!(op = op_name, attempt, max_attempts, error = %e, "attempt failed");
                last_error = e;
                if attempt < max_attempts {
                    sleep(backoff_delay(attempt)).await;
                }
            }
        }
    }

    Err(Error::Job(format!(
        "{} failed after {} attempts: {}",
        op_name, max_attempts, last_error
    )))
}

/// Exponential backoff with jitter, capped at the configured maximum.
fn backoff_delay(attempt: u32) -> Duration {
    let base = defaults::RETRY_BASE_DELAY_MS
        .saturating_mul(1u64 << (attempt - 1).min(16))
        .min(defaults::RETRY_MAX_DELAY_MS);
    let jitter = rand::thread_rng().gen_range(0..=base / 4);
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retries("op", 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>(42) }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries("op", 5, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::Request("flaky".into()))
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_attempts_exactly_max_times() {
        let calls = AtomicU32::new(0);
        let err = with_retries("fetch_html", 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::Request("always down".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let message = err.to_string();
        assert!(message.contains("failed after 5 attempts"), "{}", message);
        assert!(message.contains("fetch_html"), "{}", message);
        assert!(message.contains("always down"), "{}", message);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_fault_short_circuits() {
        let calls = AtomicU32::new(0);
        let err = with_retries("fetch_page", 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::NotFound("page gone".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let d1 = backoff_delay(1).as_millis() as u64;
        let d3 = backoff_delay(3).as_millis() as u64;
        let d10 = backoff_delay(10).as_millis() as u64;

        assert!(d1 >= defaults::RETRY_BASE_DELAY_MS);
        assert!(d3 >= defaults::RETRY_BASE_DELAY_MS * 4);
        // Cap plus at most 25% jitter
        assert!(d10 <= defaults::RETRY_MAX_DELAY_MS + defaults::RETRY_MAX_DELAY_MS / 4);
    }
}
