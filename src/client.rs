//! Grayskull Client Implementation
//!
//! This module contains the main `Client` struct used to fetch secrets from
//! the Grayskull service.
//!
//! # Architecture
//!
//! - **HTTP Layer**: one pooled `reqwest` client shared by all calls
//! - **Executor**: performs a single authenticated GET per attempt
//! - **Retry Logic**: exponential backoff with jitter, racing cancellation
//! - **Telemetry**: an injected [`MetricsSink`](crate::MetricsSink)
//!
//! # Examples
//!
//! ```no_run
//! use grayskull_sdk::{BasicAuth, ClientBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new("https://grayskull.example.com")
//!     .auth(BasicAuth::new("svc-payments", "password")?)
//!     .max_attempts(5)
//!     .min_retry_delay_ms(200)
//!     .build()?;
//!
//! let secret = client.get_secret("payments:db-password").await?;
//! println!("Secret version: {}", secret.data_version);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::ClientConfig,
    context::RequestContext,
    endpoints::Endpoints,
    errors::{AttemptError, Error, Result},
    executor::RequestExecutor,
    models::{CallResult, Fetched, SecretValue},
    orchestrator::RetryOrchestrator,
};
use reqwest::Client as HttpClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const USER_AGENT_PREFIX: &str = "grayskull-sdk-rust";

/// Name under which whole `get_secret` calls are reported
const GET_SECRET_METRIC: &str = "get_secret";

/// Grayskull client
///
/// Cheap to clone; clones share the connection pool, auth provider and
/// metrics sink.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    endpoints: Endpoints,
    orchestrator: RetryOrchestrator,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("retry_policy", &self.config.retry_policy)
            .finish()
    }
}

impl Client {
    /// Create a new client with the given configuration
    pub(crate) fn new(config: ClientConfig) -> Result<Self> {
        let user_agent = if let Some(suffix) = &config.user_agent_suffix {
            format!("{}/{} {}", USER_AGENT_PREFIX, crate::VERSION, suffix)
        } else {
            format!("{}/{}", USER_AGENT_PREFIX, crate::VERSION)
        };

        // Per-attempt budget covers connecting plus reading the response
        let http = HttpClient::builder()
            .user_agent(user_agent)
            .connect_timeout(config.connection_timeout)
            .timeout(config.connection_timeout + config.read_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let executor = RequestExecutor::new(http, Arc::clone(&config.auth));
        let orchestrator = RetryOrchestrator::new(
            Arc::new(executor),
            Arc::clone(&config.metrics),
            config.retry_policy,
        );

        Ok(Self {
            endpoints: Endpoints::new(&config.host),
            orchestrator,
            config,
        })
    }

    /// Get the configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a secret by reference
    ///
    /// `secret_ref` has the form `projectId:secretName`. Each call gets a
    /// fresh [`RequestContext`] with its own correlation id and no deadline.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidSecretRef` if the reference is malformed (no I/O is done)
    /// * `Error::Permanent` for 4xx responses (404 also when the secret is
    ///   empty), auth provider failures and undecodable payloads
    /// * `Error::Exhausted` if every attempt failed with a network error,
    ///   timeout, 408, 429 or 5xx
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use grayskull_sdk::Client;
    /// # use secrecy::ExposeSecret;
    /// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    /// let secret = client.get_secret("payments:db-password").await?;
    /// let password = secret.private_part.expose_secret();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_secret(&self, secret_ref: &str) -> Result<SecretValue> {
        self.get_secret_with_context(RequestContext::new(), secret_ref)
            .await
            .map(|fetched| fetched.data)
    }

    /// Get a secret under a caller-supplied context
    ///
    /// The context's cancellation token and deadline interrupt the call at
    /// any point, including between retries. Returns the secret together
    /// with the number of attempts it took.
    pub async fn get_secret_with_context(
        &self,
        ctx: RequestContext,
        secret_ref: &str,
    ) -> CallResult<SecretValue> {
        let started = Instant::now();
        let result = self.fetch_secret(&ctx, secret_ref).await;

        let status = match &result {
            Ok(fetched) => fetched.status,
            Err(e) => e.status_code().unwrap_or(0),
        };
        let duration = started.elapsed();
        self.config
            .metrics
            .record_request(GET_SECRET_METRIC, status, duration);

        debug!(
            request_id = %ctx.request_id(),
            secret_ref,
            status,
            ?duration,
            "Request completed"
        );

        result
    }

    async fn fetch_secret(&self, ctx: &RequestContext, secret_ref: &str) -> CallResult<SecretValue> {
        let (project_id, secret_name) = parse_secret_ref(secret_ref)?;

        debug!(
            request_id = %ctx.request_id(),
            project_id,
            secret_name,
            "Fetching secret"
        );

        let url = self.endpoints.secret_data(project_id, secret_name);
        let fetched = self
            .orchestrator
            .run_checked(ctx, &url, |data: &Option<SecretValue>| match data {
                Some(secret) if !secret.is_empty() => Ok(()),
                _ => Err(secret_not_found()),
            })
            .await?;

        let attempts = fetched.attempts;
        let data = fetched.data.ok_or_else(|| Error::Permanent {
            attempts,
            cause: secret_not_found(),
        })?;

        Ok(Fetched {
            data,
            message: fetched.message,
            status: fetched.status,
            attempts,
            request_id: fetched.request_id,
        })
    }
}

fn secret_not_found() -> AttemptError {
    AttemptError::Http {
        status: 404,
        message: "secret not found or empty".to_string(),
    }
}

/// Split `projectId:secretName` into its trimmed, non-empty halves
pub(crate) fn parse_secret_ref(secret_ref: &str) -> Result<(&str, &str)> {
    if secret_ref.is_empty() {
        return Err(Error::InvalidSecretRef("secretRef cannot be empty".to_string()));
    }

    let (project_id, secret_name) = secret_ref.split_once(':').ok_or_else(|| {
        Error::InvalidSecretRef(format!(
            "expected 'projectId:secretName', got: {}",
            secret_ref
        ))
    })?;

    let (project_id, secret_name) = (project_id.trim(), secret_name.trim());
    if project_id.is_empty() || secret_name.is_empty() {
        return Err(Error::InvalidSecretRef(format!(
            "projectId and secretName cannot be empty in secretRef: {}",
            secret_ref
        )));
    }

    Ok((project_id, secret_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::BearerAuth, ClientBuilder};
    use secrecy::ExposeSecret;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(base_url: &str) -> Client {
        ClientBuilder::new(base_url)
            .auth(BearerAuth::new("test-token"))
            .min_retry_delay_ms(10)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_secret_ref() {
        assert_eq!(parse_secret_ref("proj:name").unwrap(), ("proj", "name"));
        assert_eq!(parse_secret_ref(" proj : name ").unwrap(), ("proj", "name"));
        assert_eq!(parse_secret_ref("proj:a:b").unwrap(), ("proj", "a:b"));
    }

    #[test]
    fn test_parse_secret_ref_rejects_malformed() {
        for bad in ["", "nocolon", ":name", "proj:", "  :  "] {
            assert!(
                matches!(parse_secret_ref(bad), Err(Error::InvalidSecretRef(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_client_debug_hides_auth() {
        let client = create_test_client("https://grayskull.example.com");
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("grayskull.example.com"));
        assert!(!debug_str.contains("test-token"));
    }

    #[tokio::test]
    async fn test_get_secret_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/payments/secrets/db-password/data"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "dataVersion": 3,
                    "publicPart": "svc-payments",
                    "privatePart": "hunter2"
                },
                "message": "Secret retrieved"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let secret = client.get_secret("payments:db-password").await.unwrap();

        assert_eq!(secret.data_version, 3);
        assert_eq!(secret.public_part, "svc-payments");
        assert_eq!(secret.private_part.expose_secret(), "hunter2");
    }

    #[tokio::test]
    async fn test_empty_data_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": {}, "message": "" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_secret("payments:missing").await.unwrap_err();

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.attempts(), 1);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_null_data_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": null, "message": "missing" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_secret("payments:missing").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_invalid_ref_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_secret("no-separator").await.unwrap_err();
        assert!(matches!(err, Error::InvalidSecretRef(_)));
    }
}
