//! Persisted analysis results.
//!
//! An [`AnalysisReport`] pairs every scored window with its position in the
//! transcript and carries the run's usage ledger, so a saved report can be
//! searched later without re-scoring.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{ReportError, ReportResult};

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::scoring::{ScoreResult, truncate_summary};
use crate::transcript::{Chunk, Message, WindowConfig};
use crate::usage::UsageStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Abbreviated message shown next to a block.
pub struct MessagePreview {
    pub speaker: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl From<&Message> for MessagePreview {
    fn from(message: &Message) -> Self {
        Self {
            speaker: message.speaker.clone(),
            text: truncate_summary(&message.text),
            timestamp: message.timestamp.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One scored window.
pub struct BlockResult {
    /// 1-based.
    pub block_id: usize,
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub message_count: usize,
    pub match_rate: f64,
    pub summary: String,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub first_message: Option<MessagePreview>,
    #[serde(default)]
    pub last_message: Option<MessagePreview>,
}

impl BlockResult {
    pub fn new(block_id: usize, chunk: &Chunk, result: &ScoreResult) -> Self {
        Self {
            block_id,
            start_index: chunk.start(),
            end_index: chunk.end(),
            message_count: chunk.len(),
            match_rate: result.score,
            summary: result.summary.clone(),
            cache_hit: result.cache_hit,
            failed: result.failed,
            first_message: chunk.first().map(MessagePreview::from),
            last_message: chunk.last().map(MessagePreview::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Run metadata.
pub struct AnalysisInfo {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub criterion: String,
    pub model: String,
    pub total_blocks: usize,
    pub total_messages: usize,
    pub window_size: usize,
    pub overlap: usize,
    #[serde(default)]
    pub usage: UsageStats,
}

impl AnalysisInfo {
    pub fn new(
        criterion: impl Into<String>,
        model: impl Into<String>,
        window: &WindowConfig,
        total_messages: usize,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            criterion: criterion.into(),
            model: model.into(),
            total_blocks: 0,
            total_messages,
            window_size: window.size,
            overlap: window.overlap,
            usage: UsageStats::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Match-rate distribution of a report.
pub struct ReportStatistics {
    pub total_blocks: usize,
    pub average_match_rate: f64,
    pub max_match_rate: f64,
    pub min_match_rate: f64,
    pub blocks_above_50: usize,
    pub blocks_above_75: usize,
    pub failed_blocks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_info: AnalysisInfo,
    pub results: Vec<BlockResult>,
}

impl AnalysisReport {
    /// Pairs each chunk with its result; both slices must have the same length.
    pub fn from_batch(
        mut info: AnalysisInfo,
        chunks: &[Chunk],
        results: &[ScoreResult],
        usage: UsageStats,
    ) -> ReportResult<Self> {
        if chunks.len() != results.len() {
            return Err(ReportError::LengthMismatch {
                chunks: chunks.len(),
                results: results.len(),
            });
        }
        let blocks: Vec<BlockResult> = chunks
            .iter()
            .zip(results)
            .enumerate()
            .map(|(i, (chunk, result))| BlockResult::new(i + 1, chunk, result))
            .collect();
        info.total_blocks = blocks.len();
        info.usage = usage;
        Ok(Self {
            analysis_info: info,
            results: blocks,
        })
    }

    /// `analysis_results_<YYYYMMDD_HHMMSS>.json` for the report's timestamp.
    pub fn default_file_name(&self) -> String {
        format!(
            "analysis_results_{}.json",
            self.analysis_info.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn to_json_pretty(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ReportResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        info!(path = %path.display(), blocks = self.results.len(), "report saved");
        Ok(())
    }

    pub fn load(path: &Path) -> ReportResult<Self> {
        if !path.exists() {
            return Err(ReportError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path)?;
        let report: Self = serde_json::from_str(&raw)?;
        info!(path = %path.display(), blocks = report.results.len(), "report loaded");
        Ok(report)
    }

    /// The block with the given 1-based id.
    pub fn block(&self, block_id: usize) -> Option<&BlockResult> {
        self.results.iter().find(|b| b.block_id == block_id)
    }

    /// Blocks with `match_rate >= threshold`, best first.
    pub fn filter_by_threshold(&self, threshold: f64) -> Vec<&BlockResult> {
        let mut hits: Vec<&BlockResult> = self
            .results
            .iter()
            .filter(|b| !b.failed && b.match_rate >= threshold)
            .collect();
        hits.sort_by(|a, b| b.match_rate.total_cmp(&a.match_rate));
        hits
    }

    /// The `n` best-scoring blocks; ties keep transcript order.
    pub fn top_matches(&self, n: usize) -> Vec<&BlockResult> {
        let mut ranked: Vec<&BlockResult> = self.results.iter().filter(|b| !b.failed).collect();
        ranked.sort_by(|a, b| b.match_rate.total_cmp(&a.match_rate));
        ranked.truncate(n);
        ranked
    }

    /// `None` for an empty report.
    pub fn statistics(&self) -> Option<ReportStatistics> {
        if self.results.is_empty() {
            return None;
        }
        let rates: Vec<f64> = self.results.iter().map(|b| b.match_rate).collect();
        Some(ReportStatistics {
            total_blocks: rates.len(),
            average_match_rate: rates.iter().sum::<f64>() / rates.len() as f64,
            max_match_rate: rates.iter().copied().fold(f64::MIN, f64::max),
            min_match_rate: rates.iter().copied().fold(f64::MAX, f64::min),
            blocks_above_50: rates.iter().filter(|r| **r >= 50.0).count(),
            blocks_above_75: rates.iter().filter(|r| **r >= 75.0).count(),
            failed_blocks: self.results.iter().filter(|b| b.failed).count(),
        })
    }
}
