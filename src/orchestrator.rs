//! Retrying GET with metrics and envelope decoding

use crate::{
    backoff::RetryPolicy,
    context::RequestContext,
    errors::{AttemptError, Error},
    executor::{AttemptOutcome, Execute},
    models::{CallResult, Envelope, Fetched},
    retry::retry,
    telemetry::MetricsSink,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Drives attempts of one GET through the retry loop
///
/// Every attempt is reported to the [`MetricsSink`] with its status and
/// duration. A 2xx body is decoded as an [`Envelope`]; a body that does not
/// decode fails the call permanently, since a retry would fetch the same
/// payload. Calls that needed more than one attempt are reported through
/// [`MetricsSink::record_retry`], except when they end in cancellation.
///
/// The orchestrator holds no per-call state, so one instance serves any
/// number of concurrent calls.
#[derive(Debug, Clone)]
pub struct RetryOrchestrator {
    executor: Arc<dyn Execute>,
    metrics: Arc<dyn MetricsSink>,
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    /// Create an orchestrator
    pub fn new(
        executor: Arc<dyn Execute>,
        metrics: Arc<dyn MetricsSink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            executor,
            metrics,
            policy,
        }
    }

    /// Policy shared by every call
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` until it yields a decodable envelope or the policy gives up
    pub async fn run<T: DeserializeOwned>(&self, ctx: &RequestContext, url: &str) -> CallResult<T> {
        self.run_checked(ctx, url, |_: &T| Ok(())).await
    }

    /// Like [`run`](Self::run), but `check` may reject a decoded payload
    ///
    /// A rejection is classified like any other attempt failure, so a
    /// permanent one ends the call and shows up in the retry metrics.
    pub async fn run_checked<T, F>(&self, ctx: &RequestContext, url: &str, check: F) -> CallResult<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> Result<(), AttemptError>,
    {
        let check = &check;
        let result = retry(ctx, &self.policy, |_attempt| async move {
            let started = Instant::now();
            let outcome = self.executor.execute(ctx, url).await;
            self.metrics.record_request(
                url,
                outcome.status_code().unwrap_or(0),
                started.elapsed(),
            );

            match outcome {
                AttemptOutcome::Success { status, body } => serde_json::from_str::<Envelope<T>>(&body)
                    .map_err(|e| {
                        AttemptError::Deserialize(format!("failed to parse response: {}", e))
                    })
                    .and_then(|envelope| check(&envelope.data).map(|()| (envelope, status))),
                AttemptOutcome::Failure(cause) => Err(cause),
            }
        })
        .await;

        match result {
            Ok(attempted) => {
                if attempted.attempts > 1 {
                    self.metrics.record_retry(url, attempted.attempts, true);
                }
                let (envelope, status) = attempted.value;
                debug!(
                    request_id = %ctx.request_id(),
                    url,
                    status,
                    attempts = attempted.attempts,
                    "Call succeeded"
                );
                Ok(Fetched {
                    data: envelope.data,
                    message: envelope.message,
                    status,
                    attempts: attempted.attempts,
                    request_id: ctx.request_id().to_string(),
                })
            }
            Err(err) => {
                if matches!(err, Error::Permanent { .. } | Error::Exhausted { .. })
                    && err.attempts() > 1
                {
                    self.metrics.record_retry(url, err.attempts(), false);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::NoopMetrics;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug)]
    struct Scripted {
        outcomes: Mutex<Vec<AttemptOutcome>>,
    }

    #[async_trait]
    impl Execute for Scripted {
        async fn execute(&self, _ctx: &RequestContext, _url: &str) -> AttemptOutcome {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            }
        }
    }

    fn orchestrator(outcomes: Vec<AttemptOutcome>) -> RetryOrchestrator {
        RetryOrchestrator::new(
            Arc::new(Scripted {
                outcomes: Mutex::new(outcomes),
            }),
            Arc::new(NoopMetrics),
            RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_decodes_envelope() {
        let orchestrator = orchestrator(vec![AttemptOutcome::Success {
            status: 200,
            body: r#"{"data": 42, "message": "ok"}"#.to_string(),
        }]);
        let ctx = RequestContext::new().with_request_id("req-9");

        let fetched: Fetched<u32> = orchestrator.run(&ctx, "http://host/x").await.unwrap();
        assert_eq!(fetched.data, 42);
        assert_eq!(fetched.message, "ok");
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.attempts, 1);
        assert_eq!(fetched.request_id, "req-9");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_payload_counts_as_failed_retry() {
        #[derive(Debug, Default)]
        struct Retries(Mutex<Vec<(u32, bool)>>);

        impl MetricsSink for Retries {
            fn record_request(&self, _name: &str, _status: u16, _duration: Duration) {}

            fn record_retry(&self, _url: &str, attempts: u32, success: bool) {
                self.0.lock().unwrap().push((attempts, success));
            }
        }

        let retries = Arc::new(Retries::default());
        let orchestrator = RetryOrchestrator::new(
            Arc::new(Scripted {
                outcomes: Mutex::new(vec![
                    AttemptOutcome::Failure(AttemptError::Timeout),
                    AttemptOutcome::Success {
                        status: 200,
                        body: r#"{"data": 0}"#.to_string(),
                    },
                ]),
            }),
            retries.clone(),
            RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50)),
        );
        let ctx = RequestContext::new();

        let err = orchestrator
            .run_checked(&ctx, "http://host/x", |value: &u32| {
                if *value == 0 {
                    Err(AttemptError::Http {
                        status: 404,
                        message: "empty".to_string(),
                    })
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Permanent { attempts: 2, .. }));
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(*retries.0.lock().unwrap(), vec![(2, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_success_is_permanent() {
        let orchestrator = orchestrator(vec![AttemptOutcome::Success {
            status: 200,
            body: "not json".to_string(),
        }]);
        let ctx = RequestContext::new();

        let err = orchestrator
            .run::<u32>(&ctx, "http://host/x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Permanent {
                attempts: 1,
                cause: AttemptError::Deserialize(_)
            }
        ));
    }
}
