use std::time::Duration;

use rand::Rng;

use crate::constants::DEFAULT_MAX_ATTEMPTS;
use crate::transport::ErrorClass;

/// Default backoff base.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Upper bound (exclusive) of the random jitter added to each wait.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1000);
/// Rate-limit waits use `base * RATE_LIMIT_MULTIPLIER`.
pub const RATE_LIMIT_MULTIPLIER: u32 = 2;

// 2^20 s is already past any sane wait.
const MAX_EXPONENT: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
/// Retry budget and backoff curve for one unit.
pub struct RetryPolicy {
    /// Total attempts per unit, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub rate_limit_multiplier: u32,
    pub max_jitter: Duration,
    /// Whether `Unauthorized`/`Forbidden` are retried like transient errors.
    pub retry_auth_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            rate_limit_multiplier: RATE_LIMIT_MULTIPLIER,
            max_jitter: DEFAULT_MAX_JITTER,
            retry_auth_errors: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Policy with no waits at all. Useful for tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn with_retry_auth_errors(mut self, retry: bool) -> Self {
        self.retry_auth_errors = retry;
        self
    }

    /// Attempt budget, never below one.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Deterministic wait after the failed attempt `attempt` (0-based).
    ///
    /// `base * 2^attempt`, with the base multiplied for [`ErrorClass::RateLimited`].
    pub fn backoff(&self, attempt: u32, class: ErrorClass) -> Duration {
        let base = match class {
            ErrorClass::RateLimited => self.base_delay.saturating_mul(self.rate_limit_multiplier),
            _ => self.base_delay,
        };
        base.saturating_mul(1u32 << attempt.min(MAX_EXPONENT))
    }

    /// Uniform random jitter in `[0, max_jitter)`.
    pub fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }

    /// Backoff plus jitter.
    pub fn delay(&self, attempt: u32, class: ErrorClass) -> Duration {
        self.backoff(attempt, class) + self.jitter()
    }

    /// Whether a failure of `class` may be retried at all.
    pub fn is_retryable(&self, class: ErrorClass) -> bool {
        match class {
            ErrorClass::MalformedResponse => false,
            class if class.is_auth() => self.retry_auth_errors,
            _ => true,
        }
    }
}
