//! Single HTTP attempt
//!
//! [`RequestExecutor`] performs exactly one GET: it fetches the auth header,
//! attaches the correlation id, sends the request, reads the body and turns
//! whatever happened into an [`AttemptOutcome`]. It never retries and never
//! decodes; both belong to the orchestrator.

use crate::{
    auth::AuthHeaderProvider,
    classifier::FailureKind,
    context::RequestContext,
    errors::AttemptError,
    util::body_excerpt,
};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client as HttpClient};
use std::sync::Arc;
use tracing::debug;

/// Correlation header carried by every attempt of a call
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const MAX_DIAGNOSTIC_BODY_CHARS: usize = 512;

/// Result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response with its full body
    Success {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
    /// Anything else
    Failure(AttemptError),
}

impl AttemptOutcome {
    /// Failure class, `None` on success
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            AttemptOutcome::Success { .. } => None,
            AttemptOutcome::Failure(cause) => Some(cause.kind()),
        }
    }

    /// HTTP status code, if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AttemptOutcome::Success { status, .. } => Some(*status),
            AttemptOutcome::Failure(cause) => cause.status_code(),
        }
    }
}

/// Performs one attempt against a URL
///
/// The seam between the retry loop and the transport; tests plug in scripted
/// implementations.
#[async_trait]
pub trait Execute: Send + Sync + std::fmt::Debug {
    /// Run one attempt
    async fn execute(&self, ctx: &RequestContext, url: &str) -> AttemptOutcome;
}

/// Executes attempts over a shared `reqwest` client
#[derive(Clone)]
pub struct RequestExecutor {
    http: HttpClient,
    auth: Arc<dyn AuthHeaderProvider>,
}

impl RequestExecutor {
    /// Create an executor over a configured HTTP client
    pub fn new(http: HttpClient, auth: Arc<dyn AuthHeaderProvider>) -> Self {
        Self { http, auth }
    }

    async fn auth_header(&self) -> Result<String, AttemptError> {
        let value = self
            .auth
            .auth_header()
            .await
            .map_err(|e| AttemptError::Auth(format!("failed to get auth header: {}", e)))?;
        if value.is_empty() {
            return Err(AttemptError::Auth("auth header cannot be empty".to_string()));
        }
        Ok(value)
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("auth", &self.auth)
            .finish()
    }
}

#[async_trait]
impl Execute for RequestExecutor {
    async fn execute(&self, ctx: &RequestContext, url: &str) -> AttemptOutcome {
        if ctx.is_done() {
            return AttemptOutcome::Failure(AttemptError::Canceled);
        }

        let auth = tokio::select! {
            biased;
            _ = ctx.done() => return AttemptOutcome::Failure(AttemptError::Canceled),
            auth = self.auth_header() => auth,
        };
        let auth_header = match auth {
            Ok(value) => value,
            Err(cause) => return AttemptOutcome::Failure(cause),
        };

        let request = self
            .http
            .get(url)
            .header(AUTHORIZATION, auth_header)
            .header(REQUEST_ID_HEADER, ctx.request_id());

        debug!(request_id = %ctx.request_id(), url, method = "GET", "Executing HTTP request");

        let sent = tokio::select! {
            biased;
            _ = ctx.done() => return AttemptOutcome::Failure(AttemptError::Canceled),
            sent = request.send() => sent,
        };
        let response = match sent {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::Failure(AttemptError::from(e)),
        };

        let status = response.status();
        let read = tokio::select! {
            biased;
            _ = ctx.done() => return AttemptOutcome::Failure(AttemptError::Canceled),
            read = response.text() => read,
        };
        let body = match read {
            Ok(body) => body,
            Err(e) => return AttemptOutcome::Failure(AttemptError::Body(e.to_string())),
        };

        debug!(
            request_id = %ctx.request_id(),
            url,
            status = status.as_u16(),
            body_length = body.len(),
            "Received HTTP response"
        );

        if status.is_success() {
            AttemptOutcome::Success {
                status: status.as_u16(),
                body,
            }
        } else {
            AttemptOutcome::Failure(AttemptError::Http {
                status: status.as_u16(),
                message: format!(
                    "request failed with status {}: {}",
                    status.as_u16(),
                    body_excerpt(&body, MAX_DIAGNOSTIC_BODY_CHARS)
                ),
            })
        }
    }
}
