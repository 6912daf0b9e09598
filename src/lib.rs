//! chatsift library crate (used by the CLI and integration tests).
//!
//! Scores windows of a chat transcript against a free-text criterion by fanning
//! them out to an LLM with bounded concurrency, retries and request caching.
//!
//! # Public API Surface
//!
//! ## Engine
//! - [`Dispatcher`], [`DispatcherConfig`] - Batch fan-out with positional fan-in
//! - [`RetryController`], [`RetryPolicy`] - Per-unit retries with classified backoff
//! - [`RequestCache`], [`CacheKey`] - Exact-match result memoization
//! - [`UsageAggregator`], [`UsageStats`] - Request, token and cost accounting
//! - [`CostEstimate`] - Pre-flight token and cost estimate for a batch
//!
//! ## Scoring
//! - [`extract`], [`extract_detailed`] - Reply text to `(score, summary)`
//! - [`ScoreResult`] - Per-chunk outcome (including the failure sentinel)
//!
//! ## Transport
//! - [`Transport`] - The remote scoring seam; [`GenaiTransport`] in production
//! - [`TransportError`], [`ErrorClass`] - Failure taxonomy
//!
//! ## Collaborators
//! - [`Message`], [`Chunk`], [`sliding_windows`] - Transcript loading and windowing
//! - [`AnalysisReport`] - Persisted results, threshold search and statistics
//! - [`Config`] - `CHATSIFT_*` environment configuration
//!
//! ## Test/Mock Support
//! [`MockTransport`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod hashing;
pub mod report;
pub mod retry;
pub mod scoring;
pub mod transcript;
pub mod transport;
pub mod usage;

pub use cache::RequestCache;
pub use config::{Config, ConfigError};
pub use dispatch::{Dispatcher, DispatcherConfig, ProgressFn};
pub use hashing::CacheKey;
pub use report::{
    AnalysisInfo, AnalysisReport, BlockResult, MessagePreview, ReportError, ReportResult,
    ReportStatistics,
};
pub use retry::{RetryController, RetryOutcome, RetryPolicy, UnitState};
pub use scoring::{
    Extraction, FAILED_SUMMARY, ScoreResult, build_prompt, extract, extract_detailed,
    synthesize_summary,
};
pub use transcript::{
    Chunk, Message, TranscriptError, TranscriptResult, WindowConfig, WindowError, filter_recent,
    load_csv, load_json, load_transcript, parse_csv, parse_json, parse_timestamp, sliding_windows,
};
#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
pub use transport::{
    ErrorClass, GenaiTransport, Transport, TransportError, TransportResponse, TransportResult,
};
pub use usage::{
    CostEstimate, ModelPricing, UsageAggregator, UsageStats, cost_for, estimate_tokens,
};
