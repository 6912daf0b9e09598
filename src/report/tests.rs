use super::*;
use std::time::Duration;

use tempfile::TempDir;

use crate::scoring::ScoreResult;
use crate::transcript::{Chunk, Message, WindowConfig};
use crate::usage::UsageStats;

fn chunk(start: usize, len: usize) -> Chunk {
    let messages = (0..len)
        .map(|i| Message::new(format!("user{}", i % 2), format!("message {}", start + i)))
        .collect();
    Chunk::new(start, messages)
}

fn scored(score: f64) -> ScoreResult {
    ScoreResult::success(score, format!("scored {score}"), 100, 10, 0.001)
}

fn report(scores: &[f64]) -> AnalysisReport {
    let chunks: Vec<Chunk> = (0..scores.len()).map(|i| chunk(i * 50, 100)).collect();
    let results: Vec<ScoreResult> = scores.iter().map(|s| scored(*s)).collect();
    let info = AnalysisInfo::new("travel plans", "claude-3-haiku-20240307", &WindowConfig::default(), 1000);
    AnalysisReport::from_batch(info, &chunks, &results, UsageStats::default()).unwrap()
}

#[test]
fn test_from_batch_builds_blocks() {
    let report = report(&[10.0, 80.0]);
    let info = &report.analysis_info;

    assert_eq!(info.total_blocks, 2);
    assert_eq!(info.total_messages, 1000);
    assert_eq!(info.window_size, 100);
    assert_eq!(info.overlap, 50);
    assert_eq!(info.criterion, "travel plans");
    assert!(!info.run_id.is_empty());

    let second = &report.results[1];
    assert_eq!(second.block_id, 2);
    assert_eq!(second.start_index, 50);
    assert_eq!(second.end_index, 150);
    assert_eq!(second.message_count, 100);
    assert_eq!(second.match_rate, 80.0);
    assert_eq!(second.first_message.as_ref().unwrap().text, "message 50");
    assert_eq!(second.last_message.as_ref().unwrap().text, "message 149");
}

#[test]
fn test_from_batch_rejects_length_mismatch() {
    let info = AnalysisInfo::new("c", "m", &WindowConfig::default(), 10);
    let err = AnalysisReport::from_batch(info, &[chunk(0, 10)], &[], UsageStats::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ReportError::LengthMismatch {
            chunks: 1,
            results: 0
        }
    ));
}

#[test]
fn test_previews_truncated() {
    let long = "x".repeat(250);
    let chunk = Chunk::new(0, vec![Message::new("alice", long)]);
    let block = BlockResult::new(1, &chunk, &scored(5.0));

    let preview = block.first_message.unwrap();
    assert_eq!(preview.text.chars().count(), 100);
    assert!(preview.text.ends_with("..."));
}

#[test]
fn test_sentinel_block_is_flagged() {
    let block = BlockResult::new(1, &chunk(0, 10), &ScoreResult::sentinel());
    assert!(block.failed);
    assert_eq!(block.match_rate, 0.0);
}

#[test]
fn test_filter_by_threshold_sorted_desc() {
    let report = report(&[40.0, 90.0, 75.0, 74.9]);
    let hits = report.filter_by_threshold(75.0);

    let ids: Vec<usize> = hits.iter().map(|b| b.block_id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert!(report.filter_by_threshold(95.0).is_empty());
    assert_eq!(report.filter_by_threshold(0.0).len(), 4);
}

#[test]
fn test_top_matches() {
    let report = report(&[40.0, 90.0, 75.0, 90.0]);
    let top = report.top_matches(3);

    let ids: Vec<usize> = top.iter().map(|b| b.block_id).collect();
    assert_eq!(ids, vec![2, 4, 3]);
    assert_eq!(report.top_matches(10).len(), 4);
    assert!(report.top_matches(0).is_empty());
}

#[test]
fn test_block_lookup_by_id() {
    let scored = report(&[15.0, 55.0, 95.0]);

    let block = scored.block(2).unwrap();
    assert_eq!(block.match_rate, 55.0);
    assert_eq!(block.start_index, 50);
    assert_eq!(block.end_index, 150);
    assert_eq!(block.first_message.as_ref().unwrap().text, "message 50");
    assert!(scored.block(0).is_none());
    assert!(scored.block(4).is_none());
}

#[test]
fn test_statistics() {
    let full = report(&[20.0, 50.0, 80.0, 90.0]);
    let stats = full.statistics().unwrap();

    assert_eq!(stats.total_blocks, 4);
    assert!((stats.average_match_rate - 60.0).abs() < 1e-9);
    assert_eq!(stats.max_match_rate, 90.0);
    assert_eq!(stats.min_match_rate, 20.0);
    assert_eq!(stats.blocks_above_50, 3);
    assert_eq!(stats.blocks_above_75, 2);
    assert_eq!(stats.failed_blocks, 0);

    assert!(report(&[]).statistics().is_none());
}

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("report.json");
    let mut original = report(&[33.0, 66.0]);
    original.analysis_info.usage.total_requests = 2;
    original.analysis_info.usage.latencies = vec![Duration::from_millis(120)];

    original.save(&path).unwrap();
    let loaded = AnalysisReport::load(&path).unwrap();

    assert_eq!(loaded, original);
}

#[test]
fn test_saved_layout() {
    let json = report(&[12.0]).to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["analysis_info"]["run_id"].is_string());
    assert_eq!(value["analysis_info"]["total_blocks"], 1);
    assert_eq!(value["results"][0]["block_id"], 1);
    assert_eq!(value["results"][0]["match_rate"], 12.0);
    assert_eq!(value["results"][0]["first_message"]["speaker"], "user0");
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = AnalysisReport::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ReportError::NotFound { .. }));
}

#[test]
fn test_load_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        AnalysisReport::load(&path).unwrap_err(),
        ReportError::Json(_)
    ));
}

#[test]
fn test_default_file_name() {
    let name = report(&[1.0]).default_file_name();
    assert!(name.starts_with("analysis_results_"));
    assert!(name.ends_with(".json"));
    assert_eq!(name.len(), "analysis_results_20240101_000000.json".len());
}
