use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::types::UsageStats;

#[derive(Debug, Default)]
struct Ledger {
    stats: UsageStats,
    first_request_at: Option<Instant>,
}

impl Ledger {
    #[inline]
    fn touch(&mut self) {
        self.first_request_at.get_or_insert_with(Instant::now);
    }
}

/// Thread-safe usage ledger shared by all workers of one dispatcher.
///
/// Every mutation takes the same lock, so each unit's outcome lands atomically.
#[derive(Debug, Default)]
pub struct UsageAggregator {
    ledger: Mutex<Ledger>,
}

impl UsageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the throughput clock if no request has been seen yet.
    pub fn note_request_start(&self) {
        self.ledger.lock().touch();
    }

    /// Records one successful request.
    pub fn record_success(
        &self,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
        latency: Duration,
    ) {
        let mut ledger = self.ledger.lock();
        ledger.touch();
        let stats = &mut ledger.stats;
        stats.total_requests += 1;
        stats.total_input_tokens += input_tokens;
        stats.total_output_tokens += output_tokens;
        stats.total_cost += cost.max(0.0);
        stats.latencies.push(latency);
    }

    /// Records one request that ultimately failed.
    pub fn record_failure(&self) {
        let mut ledger = self.ledger.lock();
        ledger.touch();
        ledger.stats.total_requests += 1;
        ledger.stats.failed_requests += 1;
    }

    /// Records one rate-limited attempt.
    pub fn record_rate_limit(&self) {
        let mut ledger = self.ledger.lock();
        ledger.touch();
        ledger.stats.rate_limit_errors += 1;
    }

    /// Records one reply that carried no recognizable score and was scored 0.
    ///
    /// Does not touch `total_requests`; the request itself is recorded as a success.
    pub fn record_unparsed(&self) {
        self.ledger.lock().stats.unparsed_responses += 1;
    }

    /// Records one unit served from cache (no request was made).
    pub fn record_cache_hit(&self) {
        self.ledger.lock().stats.cache_hits += 1;
    }

    /// Returns a copy of the ledger with `elapsed` filled in.
    pub fn snapshot(&self) -> UsageStats {
        let ledger = self.ledger.lock();
        let mut stats = ledger.stats.clone();
        stats.elapsed = ledger
            .first_request_at
            .map(|t| t.elapsed())
            .unwrap_or_default();
        stats
    }

    /// Clears all counters.
    pub fn reset(&self) {
        *self.ledger.lock() = Ledger::default();
    }
}
