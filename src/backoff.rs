//! Retry policy and backoff scheduling
//!
//! The wait before attempt `n + 1` is
//!
//! ```text
//! base  = min(initial_delay * 2^(n - 1), max_delay)
//! delay = base + uniform(0 ..= base / 4)
//! ```
//!
//! The cap is applied before jitter, so no wait ever exceeds
//! `max_delay * 1.25`.

use std::time::Duration;

/// Default number of attempts per logical call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Default cap on the base wait
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Immutable retry policy shared by every call of a client
///
/// Invalid values are normalized instead of rejected: `max_attempts == 0`
/// becomes [`DEFAULT_MAX_ATTEMPTS`], a zero `initial_delay` becomes
/// [`DEFAULT_INITIAL_DELAY`] and a `max_delay` below `initial_delay` is raised
/// to `max(DEFAULT_MAX_DELAY, initial_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy, normalizing invalid values
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        let max_attempts = if max_attempts == 0 {
            DEFAULT_MAX_ATTEMPTS
        } else {
            max_attempts
        };
        let initial_delay = if initial_delay.is_zero() {
            DEFAULT_INITIAL_DELAY
        } else {
            initial_delay
        };
        let max_delay = if max_delay < initial_delay {
            DEFAULT_MAX_DELAY.max(initial_delay)
        } else {
            max_delay
        };

        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    /// Maximum number of attempts, always at least 1
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the first retry
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Cap on the base wait
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Capped exponential wait before attempt `attempt + 1`, without jitter
    ///
    /// `attempt` is the 1-indexed attempt that just failed; 0 is treated as 1.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        2u32.checked_pow(exponent)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Jittered wait before attempt `attempt + 1`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let max_jitter = u64::try_from(base.as_nanos() / 4).unwrap_or(u64::MAX);
        let jitter = Duration::from_nanos(fastrand::u64(0..=max_jitter));
        base.saturating_add(jitter)
    }

    /// Upper bound of [`delay_for`](Self::delay_for) for any attempt
    pub fn delay_ceiling(&self) -> Duration {
        let quarter = u64::try_from(self.max_delay.as_nanos() / 4).unwrap_or(u64::MAX);
        self.max_delay.saturating_add(Duration::from_nanos(quarter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}
