//! Cross-cutting, shared constants.
//!
//! Defaults here are the values used when neither `CHATSIFT_*` environment
//! variables nor CLI flags override them.

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Default number of concurrent scoring workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Default number of transport attempts per unit (first call included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default messages per window.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Default overlap between consecutive windows.
pub const DEFAULT_WINDOW_OVERLAP: usize = 50;

/// Windows with fewer messages than this are not scored.
pub const DEFAULT_MIN_CHUNK_MESSAGES: usize = 10;

/// Completion budget for one scoring call.
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// Reply length assumed by the pre-flight cost estimate.
pub const ESTIMATED_REPLY_TOKENS: u64 = 50;

/// Characters per token assumed by the pre-flight cost estimate.
pub const CHARS_PER_TOKEN: usize = 4;

/// Sampling temperature for scoring calls.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Upper bound (in characters) of a result summary or message preview.
pub const SUMMARY_MAX_CHARS: usize = 100;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;
