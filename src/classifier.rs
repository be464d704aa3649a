//! Failure classification
//!
//! Maps the raw cause of a failed attempt to the class that drives the retry
//! decision. Pure functions, no side effects.

use crate::errors::AttemptError;

/// Retry class of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Retrying cannot help
    Permanent,
    /// A later attempt may succeed
    Retryable,
    /// The caller canceled the call
    Canceled,
}

impl FailureKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Permanent => "permanent",
            FailureKind::Retryable => "retryable",
            FailureKind::Canceled => "canceled",
        }
    }
}

/// Check if a non-2xx status code is worth retrying
///
/// 408, 429 and every 5xx are retryable, all other codes are permanent.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Classify a non-2xx status code
pub fn classify_status(status: u16) -> FailureKind {
    if is_retryable_status(status) {
        FailureKind::Retryable
    } else {
        FailureKind::Permanent
    }
}

/// Classify the cause of a failed attempt
pub fn classify(error: &AttemptError) -> FailureKind {
    match error {
        AttemptError::Canceled => FailureKind::Canceled,
        AttemptError::Http { status, .. } => classify_status(*status),
        AttemptError::Network(_) | AttemptError::Timeout | AttemptError::Body(_) => {
            FailureKind::Retryable
        }
        AttemptError::Auth(_) | AttemptError::Request(_) | AttemptError::Deserialize(_) => {
            FailureKind::Permanent
        }
    }
}
