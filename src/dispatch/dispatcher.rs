//! Bounded fan-out of a batch of chunks.
//!
//! Every unit runs in its own task, gated by a semaphore of `workers` permits.
//! A single collector loop writes results into their positional slot and drives
//! the progress callback, so progress calls never overlap.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::config::DispatcherConfig;
use crate::cache::RequestCache;
use crate::hashing::CacheKey;
use crate::retry::{RetryController, UnitState};
use crate::scoring::ScoreResult;
use crate::transcript::Chunk;
use crate::transport::{GenaiTransport, Transport};
use crate::usage::{UsageAggregator, UsageStats};

/// Called after each unit completes with `(completed, total, last_score)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize, f64) + Send + Sync>;

struct Shared {
    controller: RetryController,
    cache: Option<RequestCache>,
    usage: Arc<UsageAggregator>,
}

impl Shared {
    async fn score_unit(&self, index: usize, chunk: &Chunk, criterion: &str) -> ScoreResult {
        let key = CacheKey::derive(chunk, criterion, self.controller.model());

        if let Some(cache) = &self.cache
            && let Some(stored) = cache.get(&key)
        {
            self.usage.record_cache_hit();
            debug!(index, state = ?UnitState::CacheHit, "served from cache");
            return stored.as_cache_hit();
        }

        debug!(index, state = ?UnitState::CacheMiss, "dispatching unit");
        self.usage.note_request_start();
        let outcome = self.controller.execute(chunk, criterion).await;

        if !outcome.exhausted()
            && let Some(cache) = &self.cache
        {
            cache.store(key, &outcome.result);
        }

        // Ledger writes come last so a panic above leaves only the failure
        // recorded by the unit boundary.
        for _ in 0..outcome.rate_limit_hits {
            self.usage.record_rate_limit();
        }
        if outcome.exhausted() {
            self.usage.record_failure();
        } else {
            let result = &outcome.result;
            self.usage.record_success(
                result.input_tokens,
                result.output_tokens,
                result.cost,
                outcome.latency.unwrap_or_default(),
            );
            if outcome.unparsed {
                self.usage.record_unparsed();
            }
        }
        debug!(
            index,
            state = ?outcome.state,
            retries = outcome.retries,
            score = outcome.result.score,
            "unit finished"
        );
        outcome.result
    }
}

/// Scores batches of chunks with bounded concurrency.
///
/// The cache and usage ledger belong to the dispatcher and persist across
/// `run_batch` calls.
pub struct Dispatcher {
    shared: Arc<Shared>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Builds a dispatcher over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, config: DispatcherConfig) -> Self {
        let cache = config.cache_enabled.then(|| match config.cache_capacity {
            Some(capacity) => RequestCache::with_capacity(capacity),
            None => RequestCache::new(),
        });
        let controller = RetryController::new(transport, config.policy.clone());
        Self {
            shared: Arc::new(Shared {
                controller,
                cache,
                usage: Arc::new(UsageAggregator::new()),
            }),
            config,
        }
    }

    /// Builds a dispatcher that talks to `config.model` through `genai`.
    pub fn genai(config: DispatcherConfig) -> Self {
        let transport =
            Arc::new(GenaiTransport::new(config.model.clone()).max_tokens(config.max_tokens));
        Self::new(transport, config)
    }

    #[inline]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Model id the transport reports.
    #[inline]
    pub fn model(&self) -> &str {
        self.shared.controller.model()
    }

    /// Current usage ledger.
    pub fn usage(&self) -> UsageStats {
        self.shared.usage.snapshot()
    }

    /// The request cache, when caching is enabled.
    #[inline]
    pub fn cache(&self) -> Option<&RequestCache> {
        self.shared.cache.as_ref()
    }

    /// Scores every chunk; `result[i]` always corresponds to `chunks[i]`.
    pub async fn run_batch(&self, chunks: &[Chunk], criterion: &str) -> Vec<ScoreResult> {
        self.run_batch_with_progress(chunks, criterion, None).await
    }

    /// Like [`Self::run_batch`], calling `on_progress` after each unit completes.
    pub async fn run_batch_with_progress(
        &self,
        chunks: &[Chunk],
        criterion: &str,
        on_progress: Option<ProgressFn>,
    ) -> Vec<ScoreResult> {
        let total = chunks.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.config.effective_workers();
        info!(total, workers, model = self.model(), "scoring batch");
        let started = Instant::now();

        let semaphore = Arc::new(Semaphore::new(workers));
        let criterion: Arc<str> = Arc::from(criterion);
        let mut join_set = JoinSet::new();

        for (index, chunk) in chunks.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let shared = Arc::clone(&self.shared);
            let criterion = Arc::clone(&criterion);
            join_set.spawn(async move {
                // Never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let unit = shared.score_unit(index, &chunk, &criterion);
                let result = match AssertUnwindSafe(unit).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => {
                        error!(
                            index,
                            panic = %panic_message(panic.as_ref()),
                            "scoring unit panicked"
                        );
                        shared.usage.record_failure();
                        ScoreResult::sentinel()
                    }
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<ScoreResult>> = vec![None; total];
        let mut completed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    completed += 1;
                    let score = result.score;
                    if slots[index].is_none() {
                        slots[index] = Some(result);
                    }
                    if let Some(callback) = &on_progress {
                        callback(completed, total, score);
                    }
                }
                Err(e) => error!(error = %e, "scoring task failed to join"),
            }
        }

        let results: Vec<ScoreResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    error!(index, "unit produced no result");
                    self.shared.usage.record_failure();
                    ScoreResult::sentinel()
                })
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_sentinel()).count();
        info!(
            total,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        results
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("model", &self.model())
            .field("config", &self.config)
            .field("cache", &self.shared.cache)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
