use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RetryConfig;

pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }

    /// Run `f`, retrying with exponential backoff while `should_retry` accepts the error
    pub async fn retry<F, Fut, T, E, P>(&self, operation_name: &str, should_retry: P, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !should_retry(&e) {
                        return Err(e);
                    }

                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %e,
                            "Operation failed after max retries"
                        );
                        return Err(e);
                    }

                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Operation failed, retrying"
                    );

                    sleep(backoff).await;

                    backoff = std::cmp::min(backoff * 2, self.max_backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let policy = RetryPolicy::new(3, 1, 2);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<&str, String> = policy
            .retry("flaky", |_| true, move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("temporary".to_string())
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, 1, 1);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<(), String> = policy
            .retry("down", |_| true, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("unavailable".to_string())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let policy = RetryPolicy::new(5, 1, 1);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<(), String> = policy
            .retry("bad-input", |e: &String| e != "malformed", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("malformed".to_string())
            })
            .await;

        assert_eq!(result, Err("malformed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
