//! Data models for the Grayskull SDK
//!
//! * [`SecretValue`] - The secret payload returned by the service
//! * [`Envelope`] - The `{data, message}` wrapper around every response body
//! * [`Fetched`], [`CallResult`] - What a retried call hands back

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// A secret value with its version
///
/// The private part is protected using [`SecretString`] to prevent
/// accidental exposure in logs or debug output.
///
/// # Example
///
/// ```no_run
/// # use grayskull_sdk::Client;
/// # use secrecy::ExposeSecret;
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let secret = client.get_secret("payments:db-password").await?;
/// println!("user={} v{}", secret.public_part, secret.data_version);
/// let password = secret.private_part.expose_secret();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretValue {
    /// Version number of the secret data
    #[serde(default)]
    pub data_version: i32,
    /// Public part of the secret (e.g. a username)
    #[serde(default)]
    pub public_part: String,
    /// Private part of the secret (protected)
    #[serde(default = "empty_secret")]
    pub private_part: SecretString,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

impl SecretValue {
    /// Check if every field holds its zero value
    pub fn is_empty(&self) -> bool {
        self.data_version == 0
            && self.public_part.is_empty()
            && self.private_part.expose_secret().is_empty()
    }
}

/// Standard response wrapper of the Grayskull API
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Response payload
    pub data: T,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

/// Value produced by a call together with the number of attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    /// Produced value
    pub value: T,
    /// Attempts executed, in `1..=max_attempts`
    pub attempts: u32,
}

/// Decoded payload of a successful call
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    /// Decoded `data` field of the envelope
    pub data: T,
    /// `message` field of the envelope
    pub message: String,
    /// HTTP status of the successful attempt
    pub status: u16,
    /// Attempts executed, in `1..=max_attempts`
    pub attempts: u32,
    /// Correlation id sent with every attempt
    pub request_id: String,
}

/// Outcome of a logical call
pub type CallResult<T> = crate::Result<Fetched<T>>;
