//! Retry policies for transport-level failures.
//!
//! Only failures below the HTTP layer (connection errors, transport timeouts,
//! interceptor failures) are retried. A response with any status code ends the
//! call, and so does a request that cannot be built.

use std::time::Duration;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelayStrategy {
    /// The same delay before every retry.
    Constant,

    /// `initial_delay * attempt`.
    Linear,

    /// `initial_delay * 2^(attempt - 1)`.
    #[default]
    Exponential,
}

/// Defines how many times an endpoint is attempted and how long to wait in between.
///
/// # Examples
///
/// ```
/// use relaycall::{DelayStrategy, RetryPolicy};
/// use std::time::Duration;
///
/// // 1s, 2s, 4s between the four attempts
/// let policy = RetryPolicy::new(4, Duration::from_secs(1), DelayStrategy::Exponential);
///
/// assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
/// assert_eq!(policy.delay_after(3), Some(Duration::from_secs(4)));
/// assert_eq!(policy.delay_after(4), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    initial_delay: Duration,
    delay_strategy: DelayStrategy,
    wait_for_connectivity: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            delay_strategy: DelayStrategy::Exponential,
            wait_for_connectivity: false,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: usize, initial_delay: Duration, delay_strategy: DelayStrategy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            delay_strategy,
            wait_for_connectivity: false,
        }
    }

    /// A policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, DelayStrategy::Constant)
    }

    /// Sets whether calls under this policy wait for connectivity before each attempt.
    ///
    /// Only consulted when the client runs with
    /// [`ConnectivityWait::PerPolicy`](crate::ConnectivityWait::PerPolicy).
    pub fn with_wait_for_connectivity(mut self, wait: bool) -> Self {
        self.wait_for_connectivity = wait;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn delay_strategy(&self) -> DelayStrategy {
        self.delay_strategy
    }

    pub fn wait_for_connectivity(&self) -> bool {
        self.wait_for_connectivity
    }

    /// Returns the backoff that follows a failed `attempt`, or `None` when that was
    /// the last attempt.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed (1-indexed)
    pub fn delay_after(&self, attempt: usize) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.backoff(attempt))
    }

    /// The raw backoff formula, without the attempt bound.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let attempt = attempt.max(1);
        match self.delay_strategy {
            DelayStrategy::Constant => self.initial_delay,
            DelayStrategy::Linear => self
                .initial_delay
                .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX)),
            DelayStrategy::Exponential => {
                let exponent = u32::try_from(attempt - 1).unwrap_or(u32::MAX);
                let multiplier = 2u32.saturating_pow(exponent);
                self.initial_delay.saturating_mul(multiplier)
            }
        }
    }
}
