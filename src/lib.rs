//! Grayskull SDK for Rust
//!
//! An async client for the Grayskull secret management service, with a
//! retry layer that tells transient failures from permanent ones.
//!
//! # Features
//!
//! - Async/await support with tokio runtime
//! - Automatic retries with exponential backoff and jitter
//! - Cancellation and deadlines through [`RequestContext`], honored during
//!   backoff waits
//! - One correlation id (`X-Request-Id`) across every attempt of a call
//! - Pluggable authorization headers (Basic, Bearer or your own provider)
//! - Pluggable metrics, with an OpenTelemetry sink behind the `metrics` feature
//! - Secret values wrapped in [`SecretString`]
//!
//! # Example
//!
//! ```no_run
//! use grayskull_sdk::{BasicAuth, ClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("https://grayskull.example.com")
//!         .auth(BasicAuth::new("svc-payments", "password")?)
//!         .build()?;
//!
//!     let secret = client.get_secret("payments:db-password").await?;
//!     println!("Secret version: {}", secret.data_version);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cancellation
//!
//! ```no_run
//! use grayskull_sdk::{Client, Error, RequestContext};
//! use std::time::Duration;
//!
//! # async fn example(client: &Client) {
//! let ctx = RequestContext::new().with_timeout(Duration::from_secs(2));
//! match client.get_secret_with_context(ctx, "payments:db-password").await {
//!     Ok(fetched) => println!("took {} attempt(s)", fetched.attempts),
//!     Err(e) if e.is_canceled() => println!("gave up after {} attempt(s)", e.attempts()),
//!     Err(e) => println!("failed: {}", e),
//! }
//! # }
//! ```

#![deny(
    missing_docs,
    missing_debug_implementations,
    unsafe_code,
    unused_results
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod auth;
mod backoff;
mod classifier;
mod client;
mod config;
mod context;
mod endpoints;
mod errors;
mod executor;
mod models;
mod orchestrator;
mod retry;
/// Telemetry and observability support
#[cfg(feature = "metrics")]
pub mod telemetry;

#[cfg(not(feature = "metrics"))]
mod telemetry;
mod util;

pub use auth::{AuthHeaderProvider, BasicAuth, BearerAuth, BoxError};
pub use backoff::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
pub use classifier::{classify_status, is_retryable_status, FailureKind};
pub use client::Client;
pub use config::{ClientBuilder, ClientConfig};
pub use context::RequestContext;
pub use errors::{AttemptError, Error, Result};
pub use executor::{AttemptOutcome, Execute, RequestExecutor, REQUEST_ID_HEADER};
pub use models::*;
pub use orchestrator::RetryOrchestrator;
pub use retry::retry;
#[cfg(feature = "metrics")]
pub use telemetry::OtelMetrics;
pub use telemetry::{normalize_name, MetricsSink, NoopMetrics, TelemetryConfig};

// Re-export commonly used types
pub use secrecy::SecretString;
pub use tokio_util::sync::CancellationToken;

/// SDK version, matches Cargo.toml version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default connection timeout in milliseconds
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 10_000;

/// Default read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;

/// Default idle connections kept per host
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Default wait before the first retry in milliseconds
pub const DEFAULT_MIN_RETRY_DELAY_MS: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_retry_delay_matches_policy() {
        assert_eq!(
            std::time::Duration::from_millis(DEFAULT_MIN_RETRY_DELAY_MS),
            backoff::DEFAULT_INITIAL_DELAY
        );
    }
}
