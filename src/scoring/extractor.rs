//! Free-form model text → (score, summary).
//!
//! Both extractions walk an ordered list of patterns, most specific first, and the
//! first pattern that matches wins. The lists are plain data so tests can cover them
//! as tables.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::types::{Extraction, clamp_score};
use crate::constants::SUMMARY_MAX_CHARS;

const ELLIPSIS: &str = "...";
const MIN_SUMMARY_CHARS: usize = 5;
const PLACEHOLDERS: &[&str] = &["none", "n/a", "na", "-", "--", "null", "nil", "없음"];

/// Which numeric match to use when a pattern matches more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
}

/// One entry of the score pattern chain.
#[derive(Debug)]
pub struct ScorePattern {
    pub name: &'static str,
    pub regex: Regex,
    pub pick: Pick,
}

impl ScorePattern {
    fn new(name: &'static str, pattern: &str, pick: Pick) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("score pattern is a valid regex"),
            pick,
        }
    }

    /// Returns the captured value and the byte offset of the match.
    fn find(&self, text: &str) -> Option<(f64, usize)> {
        let mut hits = self.regex.captures_iter(text).filter_map(|caps| {
            let m = caps.get(1)?;
            let value = m.as_str().parse::<f64>().ok()?;
            Some((value, m.start()))
        });
        match self.pick {
            Pick::First => hits.next(),
            Pick::Last => hits.last(),
        }
    }
}

/// Score patterns in priority order.
pub static SCORE_PATTERNS: LazyLock<Vec<ScorePattern>> = LazyLock::new(|| {
    vec![
        ScorePattern::new(
            "labeled",
            r"(?i)(?:match\s*rate|score|rating|relevance|점수|매칭률)\**\s*(?:is\s*)?[:=]\s*\**\s*(-?\d+(?:\.\d+)?)",
            Pick::First,
        ),
        ScorePattern::new(
            "fraction",
            r"(?i)(\d+(?:\.\d+)?)\s*(?:/|out\s+of)\s*100\b",
            Pick::First,
        ),
        ScorePattern::new("percentage", r"(\d+(?:\.\d+)?)\s*%", Pick::First),
        ScorePattern::new(
            "bare",
            r"(?m)^[\s*]*(\d+(?:\.\d+)?)[\s*.]*$",
            Pick::Last,
        ),
        // A short number closing the reply, e.g. "overall I'd say 60."
        ScorePattern::new(
            "trailing",
            r"(?:^|[^\d.])(\d{1,3}(?:\.\d+)?)\W*$",
            Pick::First,
        ),
    ]
});

/// One entry of the summary pattern chain.
#[derive(Debug)]
pub enum SummaryPattern {
    /// A `summary:`-style labeled line.
    Labeled(Regex),
    /// The first non-empty line after the line holding the score.
    LineAfterScore,
}

impl SummaryPattern {
    fn find<'a>(&self, text: &'a str, score_offset: Option<usize>) -> Option<&'a str> {
        match self {
            SummaryPattern::Labeled(regex) => regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            SummaryPattern::LineAfterScore => {
                let offset = score_offset?;
                let line_end = text[offset..].find('\n').map(|i| offset + i + 1)?;
                text[line_end..]
                    .lines()
                    .map(|line| line.trim().trim_start_matches(['-', '*', '>', '#']).trim())
                    .find(|line| !line.is_empty())
            }
        }
    }
}

/// Summary patterns in priority order.
pub static SUMMARY_PATTERNS: LazyLock<Vec<SummaryPattern>> = LazyLock::new(|| {
    vec![
        SummaryPattern::Labeled(
            Regex::new(
                r"(?im)^[\s*#>\-]*(?:summary|reason|요약|이유)\**\s*[:=]\s*\**\s*(.+?)\s*$",
            )
            .expect("summary pattern is a valid regex"),
        ),
        SummaryPattern::LineAfterScore,
    ]
});

/// Extracts `(score, summary)` from raw model text.
pub fn extract(text: &str) -> (f64, String) {
    let extraction = extract_detailed(text);
    (extraction.score, extraction.summary)
}

/// Like [`extract`], but also reports which score pattern matched.
pub fn extract_detailed(text: &str) -> Extraction {
    let found = SCORE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text).map(|hit| (pattern.name, hit)));

    let (score, score_pattern, score_offset) = match found {
        Some((name, (value, offset))) => (clamp_score(value), Some(name), Some(offset)),
        None => {
            debug!(response_len = text.len(), "No score pattern matched, defaulting to 0");
            (0.0, None, None)
        }
    };

    let candidate = SUMMARY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text, score_offset));

    match candidate.and_then(usable_summary) {
        Some(summary) => Extraction {
            score,
            summary: truncate_summary(summary),
            score_pattern,
            synthesized_summary: false,
        },
        None => Extraction {
            score,
            summary: synthesize_summary(score).to_string(),
            score_pattern,
            synthesized_summary: true,
        },
    }
}

/// Relevance label derived from fixed score thresholds.
pub fn synthesize_summary(score: f64) -> &'static str {
    if score >= 80.0 {
        "very high relevance"
    } else if score >= 60.0 {
        "high relevance"
    } else if score >= 40.0 {
        "medium relevance"
    } else if score >= 20.0 {
        "low relevance"
    } else {
        "no relevance"
    }
}

/// Truncates to at most 100 characters, ending in `...` when shortened.
pub fn truncate_summary(summary: &str) -> String {
    truncate_chars(summary, SUMMARY_MAX_CHARS)
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn usable_summary(candidate: &str) -> Option<&str> {
    let trimmed = candidate.trim().trim_matches('*').trim();
    if trimmed.chars().count() < MIN_SUMMARY_CHARS {
        return None;
    }
    let normalized = trimmed.trim_end_matches('.').to_lowercase();
    if PLACEHOLDERS.contains(&normalized.as_str()) {
        return None;
    }
    Some(trimmed)
}
