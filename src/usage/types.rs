use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Point-in-time copy of the usage ledger.
pub struct UsageStats {
    /// Units that reached the transport (successes plus failures).
    pub total_requests: u64,
    /// Units that exhausted their retries.
    pub failed_requests: u64,
    /// Rate-limited attempts observed across all units.
    pub rate_limit_errors: u64,
    /// Units served from the request cache.
    pub cache_hits: u64,
    /// Successful replies with no recognizable score, recorded as 0.
    #[serde(default)]
    pub unparsed_responses: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// USD.
    pub total_cost: f64,
    /// Latency of each successful request.
    pub latencies: Vec<Duration>,
    /// Wall clock since the first recorded request, captured at snapshot time.
    pub elapsed: Duration,
}

impl UsageStats {
    /// `(total - failed) / max(1, total)`.
    pub fn success_rate(&self) -> f64 {
        let succeeded = self.total_requests.saturating_sub(self.failed_requests);
        succeeded as f64 / self.total_requests.max(1) as f64
    }

    /// Mean of the recorded latencies (zero when none were recorded).
    pub fn average_latency(&self) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.latencies.iter().sum();
        total / self.latencies.len() as u32
    }

    /// Requests per second since the first recorded request.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_requests as f64 / secs
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}

impl std::fmt::Display for UsageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requests={} failed={} rate_limited={} cache_hits={} unparsed={} tokens={}/{} cost=${:.4} \
             success_rate={:.1}% avg_latency={:.2}s throughput={:.2}/s",
            self.total_requests,
            self.failed_requests,
            self.rate_limit_errors,
            self.cache_hits,
            self.unparsed_responses,
            self.total_input_tokens,
            self.total_output_tokens,
            self.total_cost,
            self.success_rate() * 100.0,
            self.average_latency().as_secs_f64(),
            self.throughput(),
        )
    }
}
