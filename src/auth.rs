//! Authentication support for the Grayskull SDK
//!
//! Every attempt asks an [`AuthHeaderProvider`] for the value of the
//! `Authorization` header. A provider error or an empty value fails the call
//! permanently; it is never retried.
//!
//! # Examples
//!
//! ## Static Authentication
//!
//! ```
//! use grayskull_sdk::{BasicAuth, BearerAuth};
//!
//! // HTTP Basic
//! let auth = BasicAuth::new("service-account", "s3cr3t").unwrap();
//!
//! // Bearer token
//! let auth = BearerAuth::new("your-access-token");
//! ```
//!
//! ## Dynamic Provider
//!
//! ```
//! use grayskull_sdk::{AuthHeaderProvider, BoxError};
//! use async_trait::async_trait;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Debug)]
//! struct RotatingToken {
//!     current: Arc<Mutex<String>>,
//! }
//!
//! #[async_trait]
//! impl AuthHeaderProvider for RotatingToken {
//!     async fn auth_header(&self) -> Result<String, BoxError> {
//!         let token = self.current.lock().map_err(|_| "token lock poisoned")?;
//!         Ok(format!("Bearer {}", token))
//!     }
//! }
//! ```

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Boxed error returned by pluggable collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies the `Authorization` header value for each attempt
///
/// Implementations must be safe for concurrent calls; one provider is shared
/// by every in-flight call of a client.
#[async_trait]
pub trait AuthHeaderProvider: Send + Sync + fmt::Debug {
    /// Get the full header value, e.g. `Basic dXNlcjpwYXNz`
    async fn auth_header(&self) -> Result<String, BoxError>;
}

/// HTTP Basic authentication (RFC 7617)
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: SecretString,
}

impl BasicAuth {
    /// Create Basic credentials
    ///
    /// The username is trimmed. Returns an error if either part is empty.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> crate::Result<Self> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(crate::Error::Config(
                "username and password cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            username,
            password: SecretString::new(password),
        })
    }
}

#[async_trait]
impl AuthHeaderProvider for BasicAuth {
    async fn auth_header(&self) -> Result<String, BoxError> {
        let credentials = format!("{}:{}", self.username, self.password.expose_secret());
        Ok(format!("Basic {}", STANDARD.encode(credentials)))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BasicAuth({}:****)", self.username)
    }
}

/// Static bearer token authentication
#[derive(Clone)]
pub struct BearerAuth {
    token: SecretString,
}

impl BearerAuth {
    /// Create a bearer token authentication
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }
}

#[async_trait]
impl AuthHeaderProvider for BearerAuth {
    async fn auth_header(&self) -> Result<String, BoxError> {
        Ok(format!("Bearer {}", self.token.expose_secret()))
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerAuth(****)")
    }
}
