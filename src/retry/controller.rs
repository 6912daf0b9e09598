//! Per-unit execution with classified-error retries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::policy::RetryPolicy;
use crate::scoring::{ScoreResult, build_prompt, extract_detailed, synthesize_summary};
use crate::transcript::Chunk;
use crate::transport::{ErrorClass, Transport, TransportResponse};
use crate::usage::cost_for;

/// Lifecycle of one scoring unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    CacheHit,
    CacheMiss,
    InFlight,
    /// Waiting before retry number `n` (1-based).
    Retry(u32),
    Success,
    Exhausted,
    Done,
}

impl UnitState {
    /// State after a failed attempt number `attempt` (1-based) of class `class`.
    pub fn after_failure(policy: &RetryPolicy, attempt: u32, class: ErrorClass) -> Self {
        if attempt >= policy.attempts() || !policy.is_retryable(class) {
            UnitState::Exhausted
        } else {
            UnitState::Retry(attempt)
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Success | UnitState::Exhausted | UnitState::Done)
    }
}

/// What happened to one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    pub result: ScoreResult,
    pub state: UnitState,
    /// Retries consumed (attempts minus one).
    pub retries: u32,
    /// Attempts that failed with [`ErrorClass::RateLimited`].
    pub rate_limit_hits: u32,
    pub last_error: Option<ErrorClass>,
    /// Duration of the successful call.
    pub latency: Option<Duration>,
    /// No score pattern matched the reply, so the score defaulted to 0.
    pub unparsed: bool,
}

impl RetryOutcome {
    #[inline]
    pub fn exhausted(&self) -> bool {
        self.state == UnitState::Exhausted
    }
}

/// Runs one unit against the [`Transport`], retrying classified failures.
///
/// Never returns an error: exhaustion yields [`ScoreResult::sentinel`].
pub struct RetryController {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    rate_limit_noticed: AtomicBool,
}

impl RetryController {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            rate_limit_noticed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[inline]
    pub fn model(&self) -> &str {
        self.transport.model()
    }

    /// Scores `chunk` against `criterion`.
    pub async fn execute(&self, chunk: &Chunk, criterion: &str) -> RetryOutcome {
        let prompt = build_prompt(chunk, criterion);
        let mut attempt = 0u32;
        let mut rate_limit_hits = 0u32;
        let mut last_error = None;

        loop {
            attempt += 1;
            let started = Instant::now();
            let class = match self.transport.send(&prompt).await {
                Ok(response) => {
                    return self.succeeded(
                        response,
                        started.elapsed(),
                        attempt - 1,
                        rate_limit_hits,
                        last_error,
                    );
                }
                Err(err) => {
                    let class = err.class();
                    if class == ErrorClass::MalformedResponse {
                        debug!(
                            chunk_start = chunk.start(),
                            error = %err,
                            "malformed reply scored as 0"
                        );
                        return self.malformed(started.elapsed(), attempt - 1, rate_limit_hits);
                    }
                    if class == ErrorClass::RateLimited {
                        rate_limit_hits += 1;
                        self.notice_rate_limit();
                    }
                    debug!(
                        chunk_start = chunk.start(),
                        attempt,
                        class = %class,
                        error = %err,
                        "scoring attempt failed"
                    );
                    class
                }
            };
            last_error = Some(class);

            match UnitState::after_failure(&self.policy, attempt, class) {
                UnitState::Retry(n) => {
                    let delay = self.policy.delay(n - 1, class);
                    debug!(
                        chunk_start = chunk.start(),
                        retry = n,
                        delay_ms = delay.as_millis() as u64,
                        "backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    warn!(
                        chunk_start = chunk.start(),
                        attempts = attempt,
                        last_error = %class,
                        "scoring unit exhausted retries"
                    );
                    return RetryOutcome {
                        result: ScoreResult::sentinel().with_retries(attempt - 1),
                        state: UnitState::Exhausted,
                        retries: attempt - 1,
                        rate_limit_hits,
                        last_error,
                        latency: None,
                        unparsed: false,
                    };
                }
            }
        }
    }

    fn succeeded(
        &self,
        response: TransportResponse,
        latency: Duration,
        retries: u32,
        rate_limit_hits: u32,
        last_error: Option<ErrorClass>,
    ) -> RetryOutcome {
        let extraction = extract_detailed(&response.text);
        let unparsed = extraction.is_unparsed();
        let cost = cost_for(self.model(), response.input_tokens, response.output_tokens);
        let result = ScoreResult::success(
            extraction.score,
            extraction.summary,
            response.input_tokens,
            response.output_tokens,
            cost,
        )
        .with_retries(retries);

        RetryOutcome {
            result,
            state: UnitState::Success,
            retries,
            rate_limit_hits,
            last_error,
            latency: Some(latency),
            unparsed,
        }
    }

    fn malformed(&self, latency: Duration, retries: u32, rate_limit_hits: u32) -> RetryOutcome {
        let result = ScoreResult::success(0.0, synthesize_summary(0.0).to_string(), 0, 0, 0.0)
            .with_retries(retries);
        RetryOutcome {
            result,
            state: UnitState::Success,
            retries,
            rate_limit_hits,
            last_error: Some(ErrorClass::MalformedResponse),
            latency: Some(latency),
            unparsed: true,
        }
    }

    fn notice_rate_limit(&self) {
        if !self.rate_limit_noticed.swap(true, Ordering::Relaxed) {
            warn!(model = self.model(), "rate limited by provider; backing off");
        } else {
            debug!(model = self.model(), "rate limited");
        }
    }
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("model", &self.model())
            .field("policy", &self.policy)
            .finish()
    }
}
