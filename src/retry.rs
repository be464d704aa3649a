//! Generic retry loop
//!
//! [`retry`] drives `1..=max_attempts` runs of an operation. The loop moves
//! through `Attempting -> RetryWait -> Attempting` until the operation
//! succeeds, fails permanently, runs out of attempts or the context is
//! canceled. The backoff wait races the context, so cancellation interrupts
//! it immediately.

use crate::{
    backoff::RetryPolicy,
    classifier::FailureKind,
    context::RequestContext,
    errors::{AttemptError, Error, Result},
    models::Attempted,
};
use std::future::Future;
use tracing::{debug, error, info, warn};

/// Run `operation` until it succeeds or the policy says stop
///
/// The operation receives the 1-indexed attempt number. Its error decides
/// what happens next:
///
/// * `Permanent` - stop with [`Error::Permanent`]
/// * `Retryable` - wait [`RetryPolicy::delay_for`] and try again, or stop
///   with [`Error::Exhausted`] after the last attempt
/// * `Canceled` - stop with [`Error::Canceled`]
///
/// Cancellation observed after an attempt wins over its own classification.
///
/// # Example
///
/// ```
/// # use grayskull_sdk::{retry, AttemptError, RequestContext, RetryPolicy};
/// # use std::time::Duration;
/// # #[tokio::main]
/// # async fn main() {
/// let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
/// let ctx = RequestContext::new();
///
/// let result = retry(&ctx, &policy, |attempt| async move {
///     if attempt < 2 {
///         Err(AttemptError::Timeout)
///     } else {
///         Ok("done")
///     }
/// })
/// .await
/// .unwrap();
///
/// assert_eq!(result.value, "done");
/// assert_eq!(result.attempts, 2);
/// # }
/// ```
pub async fn retry<T, F, Fut>(
    ctx: &RequestContext,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<Attempted<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        if ctx.is_done() {
            debug!(request_id = %ctx.request_id(), attempt, "Call canceled before attempt");
            return Err(Error::Canceled {
                attempts: attempt - 1,
            });
        }

        debug!(request_id = %ctx.request_id(), attempt, max_attempts, "Executing attempt");

        let cause = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(request_id = %ctx.request_id(), attempt, "Call succeeded after retry");
                }
                return Ok(Attempted {
                    value,
                    attempts: attempt,
                });
            }
            Err(cause) => cause,
        };

        let kind = if ctx.is_done() {
            FailureKind::Canceled
        } else {
            cause.kind()
        };

        match kind {
            FailureKind::Canceled => {
                debug!(request_id = %ctx.request_id(), attempt, "Call canceled during attempt");
                return Err(Error::Canceled { attempts: attempt });
            }
            FailureKind::Permanent => {
                debug!(request_id = %ctx.request_id(), attempt, error = %cause, "Permanent failure");
                return Err(Error::Permanent {
                    attempts: attempt,
                    cause,
                });
            }
            FailureKind::Retryable if attempt >= max_attempts => {
                error!(
                    request_id = %ctx.request_id(),
                    attempts = attempt,
                    error = %cause,
                    "Max retry attempts reached"
                );
                return Err(Error::Exhausted {
                    attempts: attempt,
                    cause,
                });
            }
            FailureKind::Retryable => {
                let delay = policy.delay_for(attempt);
                warn!(
                    request_id = %ctx.request_id(),
                    attempt,
                    max_attempts,
                    ?delay,
                    error = %cause,
                    "Retryable error occurred"
                );

                tokio::select! {
                    biased;
                    _ = ctx.done() => {
                        debug!(request_id = %ctx.request_id(), attempt, "Call canceled during retry wait");
                        return Err(Error::CanceledDuringRetry {
                            attempts: attempt,
                            cause,
                        });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(100), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success() {
        let ctx = RequestContext::new();
        let result = retry(&ctx, &policy(3), |_| async { Ok::<_, AttemptError>(7) })
            .await
            .unwrap();
        assert_eq!(result, Attempted { value: 7, attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let ctx = RequestContext::new();
        let mut calls = 0;
        let result: Result<Attempted<()>> = retry(&ctx, &policy(4), |_| {
            calls += 1;
            async { Err(AttemptError::Network("refused".into())) }
        })
        .await;

        assert_eq!(calls, 4);
        match result {
            Err(Error::Exhausted { attempts, cause }) => {
                assert_eq!(attempts, 4);
                assert_eq!(cause, AttemptError::Network("refused".into()));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_stops_immediately() {
        let ctx = RequestContext::new();
        let mut calls = 0;
        let result: Result<Attempted<()>> = retry(&ctx, &policy(5), |_| {
            calls += 1;
            async {
                Err(AttemptError::Http {
                    status: 400,
                    message: "bad request".into(),
                })
            }
        })
        .await;

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(Error::Permanent { attempts: 1, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let ctx = RequestContext::new();
        let policy = policy(3);
        let start = Instant::now();
        let result = retry(&ctx, &policy, |attempt| async move {
            if attempt < 3 {
                Err(AttemptError::Http {
                    status: 503,
                    message: "unavailable".into(),
                })
            } else {
                Ok(attempt)
            }
        })
        .await
        .unwrap();

        assert_eq!(result.attempts, 3);
        assert!(start.elapsed() >= policy.base_delay(1) + policy.base_delay(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_canceled_before_start() {
        let ctx = RequestContext::new();
        ctx.cancellation_token().cancel();
        let mut calls = 0;
        let result: Result<Attempted<()>> = retry(&ctx, &policy(3), |_| {
            calls += 1;
            async { Ok(()) }
        })
        .await;

        assert_eq!(calls, 0);
        assert!(matches!(result, Err(Error::Canceled { attempts: 0 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_observed_after_attempt_wins() {
        let ctx = RequestContext::new();
        let token = ctx.cancellation_token().clone();
        let result: Result<Attempted<()>> = retry(&ctx, &policy(3), |_| {
            token.cancel();
            async { Err(AttemptError::Timeout) }
        })
        .await;

        assert!(matches!(result, Err(Error::Canceled { attempts: 1 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_wait() {
        let policy = RetryPolicy::new(5, Duration::from_secs(10), Duration::from_secs(60));
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(1));
        let start = Instant::now();
        let result: Result<Attempted<()>> =
            retry(&ctx, &policy, |_| async { Err(AttemptError::Timeout) }).await;

        assert!(matches!(
            result,
            Err(Error::CanceledDuringRetry { attempts: 1, .. })
        ));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
