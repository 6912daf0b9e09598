//! End-to-end batch behavior against a scripted transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chatsift::{
    Chunk, Dispatcher, DispatcherConfig, FAILED_SUMMARY, Message, MockTransport, ProgressFn,
    RetryPolicy, TransportError, TransportResponse,
};

const MODEL: &str = "claude-3-haiku-20240307";
const CRITERION: &str = "conversations about weekend plans";

fn chunk(label: &str) -> Chunk {
    Chunk::new(
        0,
        vec![
            Message::new("alice", format!("{label} first line")),
            Message::new("bob", format!("{label} second line")),
        ],
    )
}

fn batch(labels: &[&str]) -> Vec<Chunk> {
    labels.iter().map(|l| chunk(l)).collect()
}

fn dispatcher(mock: &Arc<MockTransport>, workers: usize) -> Dispatcher {
    let config = DispatcherConfig::default()
        .with_workers(workers)
        .with_policy(RetryPolicy::immediate(3));
    Dispatcher::new(mock.clone(), config)
}

fn reply(score: u32) -> TransportResponse {
    TransportResponse::new(
        format!("Score: {score}\nSummary: Weekend plans discussed at length."),
        1000,
        100,
    )
}

#[tokio::test]
async fn test_five_chunks_one_rate_limit() {
    let mock = Arc::new(
        MockTransport::new(MODEL)
            .respond("alpha", reply(10))
            .respond("bravo", reply(20))
            .respond("charlie", reply(30))
            .respond("delta", reply(40))
            .respond("echo", reply(50))
            .fail_first("bravo", vec![TransportError::RateLimited("429".into())]),
    );
    let dispatcher = dispatcher(&mock, 2);

    let results = dispatcher
        .run_batch(&batch(&["alpha", "bravo", "charlie", "delta", "echo"]), CRITERION)
        .await;

    assert_eq!(results.len(), 5);
    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    assert!(!results[1].is_sentinel());
    assert_eq!(results[1].retries, 1);

    let usage = dispatcher.usage();
    assert_eq!(usage.rate_limit_errors, 1);
    assert_eq!(usage.total_requests, 5);
    assert_eq!(usage.failed_requests, 0);
    assert_eq!(usage.success_rate(), 1.0);
    assert_eq!(mock.calls_for("bravo"), 2);
}

#[tokio::test]
async fn test_exhausted_unit_yields_sentinel() {
    let mock = Arc::new(
        MockTransport::new(MODEL)
            .always_fail("bravo", TransportError::ServerError("502 bad gateway".into())),
    );
    let dispatcher = dispatcher(&mock, 3);

    let results = dispatcher
        .run_batch(&batch(&["alpha", "bravo", "charlie"]), CRITERION)
        .await;

    assert_eq!(results.len(), 3);
    let failed = &results[1];
    assert!(failed.is_sentinel());
    assert_eq!(failed.score, 0.0);
    assert_eq!(failed.input_tokens, 0);
    assert_eq!(failed.output_tokens, 0);
    assert_eq!(failed.cost, 0.0);
    assert_eq!(failed.summary, FAILED_SUMMARY);
    assert!(!results[0].is_sentinel());
    assert!(!results[2].is_sentinel());

    let usage = dispatcher.usage();
    assert_eq!(usage.failed_requests, 1);
    assert_eq!(usage.total_requests, 3);
    assert_eq!(mock.calls_for("bravo"), 3);
}

#[tokio::test]
async fn test_retry_then_succeed_reports_one_retry() {
    let mock = Arc::new(MockTransport::new(MODEL).fail_first(
        "alpha",
        vec![TransportError::Network("connection reset".into())],
    ));
    let dispatcher = dispatcher(&mock, 1);

    let results = dispatcher.run_batch(&batch(&["alpha"]), CRITERION).await;

    assert_eq!(results[0].retries, 1);
    assert_eq!(results[0].score, 50.0);
    assert_eq!(dispatcher.usage().failed_requests, 0);
}

#[tokio::test]
async fn test_second_run_served_from_cache() {
    let mock = Arc::new(MockTransport::new(MODEL).respond("alpha", reply(70)));
    let dispatcher = dispatcher(&mock, 2);
    let chunks = batch(&["alpha", "bravo"]);

    let first = dispatcher.run_batch(&chunks, CRITERION).await;
    let after_first = dispatcher.usage();
    let calls_after_first = mock.calls();

    let second = dispatcher.run_batch(&chunks, CRITERION).await;
    let after_second = dispatcher.usage();

    assert_eq!(mock.calls(), calls_after_first);
    for (a, b) in first.iter().zip(&second) {
        assert!(!a.cache_hit);
        assert!(b.cache_hit);
        assert_eq!(a.score, b.score);
        assert_eq!(a.summary, b.summary);
        assert_eq!(b.input_tokens, 0);
        assert_eq!(b.output_tokens, 0);
        assert_eq!(b.cost, 0.0);
    }
    assert_eq!(after_second.total_input_tokens, after_first.total_input_tokens);
    assert_eq!(after_second.total_cost, after_first.total_cost);
    assert_eq!(after_second.total_requests, after_first.total_requests);
    assert_eq!(after_second.cache_hits, 2);
}

#[tokio::test]
async fn test_different_criterion_misses_cache() {
    let mock = Arc::new(MockTransport::new(MODEL));
    let dispatcher = dispatcher(&mock, 2);
    let chunks = batch(&["alpha"]);

    dispatcher.run_batch(&chunks, CRITERION).await;
    let second = dispatcher.run_batch(&chunks, "arguments about money").await;

    assert!(!second[0].cache_hit);
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_every_chunk_gets_a_result() {
    let labels: Vec<String> = (0..37).map(|i| format!("unit-{i:02}")).collect();
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let mock = Arc::new(
        MockTransport::new(MODEL)
            .always_fail("unit-07", TransportError::Unknown("boom".into()))
            .always_fail("unit-21", TransportError::Unauthorized("401".into())),
    );
    let dispatcher = dispatcher(&mock, 5);
    let completed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed);
    let progress: ProgressFn = Arc::new(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let results = dispatcher
        .run_batch_with_progress(&batch(&refs), CRITERION, Some(progress))
        .await;

    assert_eq!(results.len(), 37);
    assert_eq!(completed.load(Ordering::SeqCst), 37);
    let sentinels: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_sentinel())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(sentinels, vec![7, 21]);
    assert_eq!(dispatcher.usage().failed_requests, 2);
}

#[tokio::test]
async fn test_panicking_unit_is_isolated() {
    let mock = Arc::new(MockTransport::new(MODEL).panic_on("charlie", "provider SDK bug"));
    let dispatcher = dispatcher(&mock, 2);

    let results = dispatcher
        .run_batch(&batch(&["alpha", "bravo", "charlie", "delta"]), CRITERION)
        .await;

    assert_eq!(results.len(), 4);
    assert!(results[2].is_sentinel());
    assert_eq!(results[2].score, 0.0);
    for i in [0, 1, 3] {
        assert!(!results[i].is_sentinel());
        assert_eq!(results[i].score, 50.0);
    }

    let usage = dispatcher.usage();
    assert_eq!(usage.failed_requests, 1);
    assert_eq!(usage.total_requests, 4);
}

#[tokio::test]
async fn test_malformed_reply_is_silent_zero() {
    let mock = Arc::new(
        MockTransport::new(MODEL)
            .always_fail("alpha", TransportError::MalformedResponse("no text".into()))
            .respond("bravo", TransportResponse::new("Looks unrelated to me.", 900, 12)),
    );
    let dispatcher = dispatcher(&mock, 2);

    let results = dispatcher.run_batch(&batch(&["alpha", "bravo"]), CRITERION).await;

    for result in &results {
        assert_eq!(result.score, 0.0);
        assert!(!result.is_sentinel());
        assert_eq!(result.summary, "no relevance");
    }
    assert_eq!(mock.calls_for("alpha"), 1);

    let usage = dispatcher.usage();
    assert_eq!(usage.failed_requests, 0);
    assert_eq!(usage.total_requests, 2);
    assert_eq!(usage.unparsed_responses, 2);
}

#[tokio::test]
async fn test_cost_accumulates_per_success() {
    let mock = Arc::new(MockTransport::new(MODEL).with_default_response(reply(60)));
    let dispatcher = dispatcher(&mock, 4);

    let results = dispatcher
        .run_batch(&batch(&["a1", "b2", "c3", "d4", "e5", "f6"]), CRITERION)
        .await;

    let per_unit = 1.0 * 0.000_25 + 0.1 * 0.001_25;
    for result in &results {
        assert!((result.cost - per_unit).abs() < 1e-12);
    }
    let usage = dispatcher.usage();
    assert!((usage.total_cost - 6.0 * per_unit).abs() < 1e-9);
    assert_eq!(usage.total_input_tokens, 6000);
    assert_eq!(usage.total_output_tokens, 600);
    assert_eq!(usage.latencies.len(), 6);
}
