//! Score extraction and prompt construction.
//!
//! The remote model answers in free text. [`extractor`] turns that text into a
//! clamped `[0, 100]` score plus a short summary. Extraction never fails: text with
//! no recognizable score yields 0. That silent zero is indistinguishable from a
//! genuine "unrelated" verdict in the final [`ScoreResult`]; use
//! [`extract_detailed`] when the difference matters.

pub mod extractor;
pub mod prompt;
pub mod types;


pub use extractor::{
    Pick, SCORE_PATTERNS, SUMMARY_PATTERNS, ScorePattern, SummaryPattern, extract,
    extract_detailed, synthesize_summary, truncate_summary,
};
pub use prompt::{build_prompt, render_chunk};
pub use types::{Extraction, FAILED_SUMMARY, ScoreResult, clamp_score};
