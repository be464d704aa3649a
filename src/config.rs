use crate::{
    auth::AuthHeaderProvider,
    backoff::RetryPolicy,
    errors::Result,
    telemetry::{MetricsSink, NoopMetrics, TelemetryConfig},
    Error,
};
use std::sync::Arc;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Grayskull service
    pub host: String,
    /// Authorization header provider
    pub auth: Arc<dyn AuthHeaderProvider>,
    /// Time allowed to establish a connection
    pub connection_timeout: Duration,
    /// Time allowed to receive the response once connected
    pub read_timeout: Duration,
    /// Idle connections kept per host
    pub max_connections: usize,
    /// Retry policy shared by every call
    pub retry_policy: RetryPolicy,
    /// Metrics sink shared by every call
    pub metrics: Arc<dyn MetricsSink>,
    /// User agent suffix
    pub user_agent_suffix: Option<String>,
}

/// Builder for creating a configured Client
#[derive(Debug)]
pub struct ClientBuilder {
    host: String,
    auth: Option<Arc<dyn AuthHeaderProvider>>,
    connection_timeout_ms: u64,
    read_timeout_ms: u64,
    max_connections: usize,
    max_attempts: u32,
    min_retry_delay_ms: u64,
    max_retry_delay: Duration,
    metrics: Option<Arc<dyn MetricsSink>>,
    telemetry_config: TelemetryConfig,
    user_agent_suffix: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder with the given host
    ///
    /// # Arguments
    ///
    /// * `host` - Base URL of the Grayskull service (e.g., `"https://grayskull.example.com"`)
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            auth: None,
            connection_timeout_ms: crate::DEFAULT_CONNECTION_TIMEOUT_MS,
            read_timeout_ms: crate::DEFAULT_READ_TIMEOUT_MS,
            max_connections: crate::DEFAULT_MAX_CONNECTIONS,
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
            min_retry_delay_ms: crate::DEFAULT_MIN_RETRY_DELAY_MS,
            max_retry_delay: crate::DEFAULT_MAX_DELAY,
            metrics: None,
            telemetry_config: TelemetryConfig::default(),
            user_agent_suffix: None,
        }
    }

    /// Set the authorization header provider
    pub fn auth(mut self, auth: impl AuthHeaderProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Set an already shared authorization header provider
    pub fn auth_provider(mut self, auth: Arc<dyn AuthHeaderProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the connection timeout in milliseconds
    pub fn connection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    /// Set the read timeout in milliseconds
    pub fn read_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// Set the number of idle connections kept per host
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the maximum number of attempts per call (0 falls back to the default)
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the wait before the first retry in milliseconds
    pub fn min_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.min_retry_delay_ms = delay_ms;
        self
    }

    /// Set the cap on the base wait between retries
    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    /// Inject a metrics sink
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Configure telemetry/metrics
    #[cfg(feature = "metrics")]
    pub fn with_telemetry(mut self, config: TelemetryConfig) -> Self {
        self.telemetry_config = config;
        self
    }

    /// Enable telemetry with default settings
    #[cfg(feature = "metrics")]
    pub fn enable_metrics(mut self) -> Self {
        self.telemetry_config.enabled = true;
        self
    }

    /// Add a custom user agent suffix
    pub fn user_agent_extra(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Build the client with the configured options
    pub fn build(self) -> Result<crate::Client> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::Config("Host cannot be empty".to_string()));
        }
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(Error::Config(
                "Host must start with http:// or https://".to_string(),
            ));
        }

        let auth = self.auth.ok_or_else(|| {
            Error::Config(
                "Authentication is required. Use .auth() to set an auth header provider"
                    .to_string(),
            )
        })?;

        if self.connection_timeout_ms == 0 {
            return Err(Error::Config("Connection timeout must be positive".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(Error::Config("Read timeout must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("Max connections must be positive".to_string()));
        }

        let metrics = match self.metrics {
            Some(sink) => sink,
            None => default_metrics(&self.telemetry_config),
        };

        let config = ClientConfig {
            host: host.to_string(),
            auth,
            connection_timeout: Duration::from_millis(self.connection_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            max_connections: self.max_connections,
            retry_policy: RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.min_retry_delay_ms),
                self.max_retry_delay,
            ),
            metrics,
            user_agent_suffix: self.user_agent_suffix,
        };

        crate::client::Client::new(config)
    }
}

#[cfg(feature = "metrics")]
fn default_metrics(config: &TelemetryConfig) -> Arc<dyn MetricsSink> {
    if config.enabled {
        Arc::new(crate::telemetry::OtelMetrics::new(config))
    } else {
        Arc::new(NoopMetrics)
    }
}

#[cfg(not(feature = "metrics"))]
fn default_metrics(_config: &TelemetryConfig) -> Arc<dyn MetricsSink> {
    Arc::new(NoopMetrics)
}
