//! Per-call request context

use crate::util::generate_request_id;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation, deadline and correlation id of one logical call
///
/// A context is created for every call and shared by all of its attempts, so
/// every retry carries the same `X-Request-Id`. Reaching the deadline counts
/// as cancellation.
///
/// # Example
///
/// ```no_run
/// # use grayskull_sdk::{Client, RequestContext};
/// # use std::time::Duration;
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let token = tokio_util::sync::CancellationToken::new();
/// let ctx = RequestContext::new()
///     .with_cancellation(token.clone())
///     .with_timeout(Duration::from_secs(5));
///
/// let fetched = client.get_secret_with_context(ctx, "payments:db-password").await?;
/// println!("took {} attempt(s)", fetched.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a context with a fresh correlation id and no deadline
    pub fn new() -> Self {
        Self {
            request_id: generate_request_id(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Use a caller-supplied correlation id
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Tie the call to an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Give up once `deadline` is reached
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Give up once `timeout` has elapsed from now
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// without a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Correlation id sent as `X-Request-Id`
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Token that cancels this call
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if the call has been canceled or its deadline has passed
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolve once the call is canceled or its deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
