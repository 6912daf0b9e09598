use serde::{Deserialize, Serialize};

use crate::constants::{SCORE_MAX, SCORE_MIN};

/// Summary attached to the sentinel result of a failed unit.
pub const FAILED_SUMMARY: &str = "scoring failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Structured outcome of scoring one chunk.
pub struct ScoreResult {
    /// Relevance score in `[0, 100]`.
    pub score: f64,
    /// Short explanation, at most 100 characters.
    pub summary: String,
    /// Prompt tokens billed for this unit.
    pub input_tokens: u64,
    /// Completion tokens billed for this unit.
    pub output_tokens: u64,
    /// USD attributed to this unit.
    pub cost: f64,
    /// `true` when served from the request cache.
    pub cache_hit: bool,
    /// Retries consumed before the terminal outcome.
    #[serde(default)]
    pub retries: u32,
    /// `true` only for the sentinel of a unit that ultimately failed.
    #[serde(default)]
    pub failed: bool,
}

impl ScoreResult {
    /// Builds a successful result; the score is clamped into range.
    pub fn success(
        score: f64,
        summary: String,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
    ) -> Self {
        Self {
            score: clamp_score(score),
            summary,
            input_tokens,
            output_tokens,
            cost: cost.max(0.0),
            cache_hit: false,
            retries: 0,
            failed: false,
        }
    }

    /// The zero-valued result returned when a unit ultimately fails.
    pub fn sentinel() -> Self {
        Self {
            score: 0.0,
            summary: FAILED_SUMMARY.to_string(),
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            cache_hit: false,
            retries: 0,
            failed: true,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Copy served from cache: no tokens or cost are attributed to the hit.
    pub fn as_cache_hit(&self) -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            cache_hit: true,
            retries: 0,
            ..self.clone()
        }
    }

    /// Returns `true` if this is the failure sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.failed
    }
}

/// Clamps `score` into `[0, 100]`; NaN becomes 0.
#[inline]
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return SCORE_MIN;
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}

#[derive(Debug, Clone, PartialEq)]
/// Detailed output of the score extractor.
pub struct Extraction {
    /// Clamped score (0 when nothing matched).
    pub score: f64,
    /// Extracted or synthesized summary.
    pub summary: String,
    /// Name of the score pattern that matched, if any.
    pub score_pattern: Option<&'static str>,
    /// `true` when the summary was synthesized from the score.
    pub synthesized_summary: bool,
}

impl Extraction {
    /// Returns `true` when no score pattern matched and the score defaulted to 0.
    pub fn is_unparsed(&self) -> bool {
        self.score_pattern.is_none()
    }
}
