//! Error types and handling for the Grayskull SDK
//!
//! Two layers of errors exist:
//!
//! - [`AttemptError`] is the raw cause of a single failed HTTP attempt. Every
//!   attempt error has a [`FailureKind`] that decides whether the call is
//!   retried.
//! - [`Error`] is what a logical call finally returns. It always tells the
//!   caller how many attempts were made and lets them distinguish "fix the
//!   input" from "transient, try again later" from "I canceled this myself".
//!
//! # Example
//!
//! ```no_run
//! # use grayskull_sdk::{Client, Error};
//! # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
//! match client.get_secret("payments:db-password").await {
//!     Ok(secret) => println!("Got secret v{}", secret.data_version),
//!     Err(e @ Error::Exhausted { .. }) => println!("Service unhealthy: {}", e),
//!     Err(Error::Canceled { .. }) => println!("Call canceled"),
//!     Err(e) if e.status_code() == Some(404) => println!("Secret not found"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use crate::classifier::{self, FailureKind};
use thiserror::Error;

/// Result type alias for the SDK
pub type Result<T> = std::result::Result<T, Error>;

/// Cause of a single failed attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Server answered with a non-2xx status
    #[error("http {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Diagnostic message, including the response body
        message: String,
    },

    /// Connection or other transport failure
    #[error("network: {0}")]
    Network(String),

    /// Transport timeout
    #[error("timeout")]
    Timeout,

    /// Response body could not be read
    #[error("read body: {0}")]
    Body(String),

    /// Auth header provider failed or returned nothing
    #[error("auth: {0}")]
    Auth(String),

    /// Request could not be built
    #[error("request: {0}")]
    Request(String),

    /// Successful response with an unparsable payload
    #[error("deserialize: {0}")]
    Deserialize(String),

    /// Cancellation was observed during the attempt
    #[error("canceled")]
    Canceled,
}

impl AttemptError {
    /// Classify this failure
    pub fn kind(&self) -> FailureKind {
        classifier::classify(self)
    }

    /// Get the HTTP status code if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AttemptError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            AttemptError::Request(err.to_string())
        } else if err.is_timeout() {
            AttemptError::Timeout
        } else if err.is_body() {
            AttemptError::Body(err.to_string())
        } else if err.is_decode() {
            AttemptError::Deserialize(err.to_string())
        } else {
            AttemptError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AttemptError {
    fn from(err: serde_json::Error) -> Self {
        AttemptError::Deserialize(err.to_string())
    }
}

/// Terminal error of a logical call
#[derive(Error, Debug)]
pub enum Error {
    /// Failure that retrying cannot fix
    #[error("permanent failure after {attempts} attempt(s): {cause}")]
    Permanent {
        /// Attempts executed
        attempts: u32,
        /// Cause of the last attempt
        #[source]
        cause: AttemptError,
    },

    /// Every allowed attempt failed with a retryable error
    #[error("failed after {attempts} attempts: {cause}")]
    Exhausted {
        /// Attempts executed
        attempts: u32,
        /// Cause of the last attempt
        #[source]
        cause: AttemptError,
    },

    /// Cancellation observed before or during an attempt
    #[error("canceled after {attempts} attempt(s)")]
    Canceled {
        /// Attempts executed, including an interrupted one
        attempts: u32,
    },

    /// Cancellation observed while waiting to retry
    #[error("canceled during retry after {attempts} attempt(s): {cause}")]
    CanceledDuringRetry {
        /// Attempts executed
        attempts: u32,
        /// Cause of the attempt that triggered the retry
        #[source]
        cause: AttemptError,
    },

    /// Secret reference not in `projectId:secretName` form
    #[error("invalid secret reference: {0}")]
    InvalidSecretRef(String),

    /// Configuration error
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Get the failure class of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Exhausted { .. } => FailureKind::Retryable,
            Error::Canceled { .. } | Error::CanceledDuringRetry { .. } => FailureKind::Canceled,
            Error::Permanent { .. } | Error::InvalidSecretRef(_) | Error::Config(_) => {
                FailureKind::Permanent
            }
        }
    }

    /// Check if the call may succeed if tried again later
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Retryable
    }

    /// Check if the call ended because of cancellation
    pub fn is_canceled(&self) -> bool {
        self.kind() == FailureKind::Canceled
    }

    /// Number of HTTP attempts made before the call ended
    pub fn attempts(&self) -> u32 {
        match self {
            Error::Permanent { attempts, .. }
            | Error::Exhausted { attempts, .. }
            | Error::Canceled { attempts }
            | Error::CanceledDuringRetry { attempts, .. } => *attempts,
            Error::InvalidSecretRef(_) | Error::Config(_) => 0,
        }
    }

    /// Get the HTTP status code of the last attempt, if any
    pub fn status_code(&self) -> Option<u16> {
        self.cause().and_then(AttemptError::status_code)
    }

    /// Get the cause of the last attempt, if any
    pub fn cause(&self) -> Option<&AttemptError> {
        match self {
            Error::Permanent { cause, .. }
            | Error::Exhausted { cause, .. }
            | Error::CanceledDuringRetry { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_error_kind() {
        let err = AttemptError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::Retryable);
        assert_eq!(err.status_code(), Some(503));

        let err = AttemptError::Http {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::Permanent);

        assert_eq!(AttemptError::Timeout.kind(), FailureKind::Retryable);
        assert_eq!(AttemptError::Timeout.status_code(), None);
        assert_eq!(AttemptError::Canceled.kind(), FailureKind::Canceled);
    }

    #[test]
    fn test_error_accessors() {
        let err = Error::Exhausted {
            attempts: 3,
            cause: AttemptError::Http {
                status: 502,
                message: "bad gateway".to_string(),
            },
        };
        assert!(err.is_retryable());
        assert!(!err.is_canceled());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.status_code(), Some(502));

        let err = Error::CanceledDuringRetry {
            attempts: 2,
            cause: AttemptError::Network("reset".to_string()),
        };
        assert!(err.is_canceled());
        assert_eq!(err.attempts(), 2);
        assert_eq!(err.status_code(), None);

        let err = Error::InvalidSecretRef("nocolon".to_string());
        assert_eq!(err.kind(), FailureKind::Permanent);
        assert_eq!(err.attempts(), 0);
    }

    #[test]
    fn test_error_display_mentions_attempts() {
        let err = Error::Exhausted {
            attempts: 4,
            cause: AttemptError::Timeout,
        };
        assert_eq!(err.to_string(), "failed after 4 attempts: timeout");

        let err = Error::Canceled { attempts: 0 };
        assert_eq!(err.to_string(), "canceled after 0 attempt(s)");
    }

    #[test]
    fn test_error_source_is_cause() {
        use std::error::Error as _;

        let err = Error::Permanent {
            attempts: 1,
            cause: AttemptError::Deserialize("expected value".to_string()),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("deserialize: expected value"));
    }
}
