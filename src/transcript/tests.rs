use super::*;
use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;

fn numbered(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| Message::new(format!("user{}", i % 3), format!("message {}", i)))
        .collect()
}

fn spans(chunks: &[Chunk]) -> Vec<(usize, usize)> {
    chunks.iter().map(|c| (c.start(), c.end())).collect()
}

#[test]
fn test_windows_exact_multiple_emits_last_full_window_once() {
    let messages = numbered(250);
    let chunks = sliding_windows(&messages, &WindowConfig::new(100, 50)).unwrap();

    assert_eq!(
        spans(&chunks),
        vec![(0, 100), (50, 150), (100, 200), (150, 250)]
    );
}

#[test]
fn test_windows_include_trailing_short_window_above_minimum() {
    let messages = numbered(120);
    let chunks = sliding_windows(&messages, &WindowConfig::new(100, 50)).unwrap();

    assert_eq!(spans(&chunks), vec![(0, 100), (50, 120)]);
    assert_eq!(chunks[1].len(), 70);
}

#[test]
fn test_windows_drop_trailing_window_below_minimum() {
    let messages = numbered(105);
    let chunks = sliding_windows(&messages, &WindowConfig::new(100, 0)).unwrap();

    assert_eq!(spans(&chunks), vec![(0, 100)]);
}

#[test]
fn test_windows_transcript_shorter_than_minimum() {
    let messages = numbered(5);
    let chunks = sliding_windows(&messages, &WindowConfig::new(100, 50)).unwrap();
    assert!(chunks.is_empty());

    let chunks =
        sliding_windows(&messages, &WindowConfig::new(100, 50).min_messages(1)).unwrap();
    assert_eq!(spans(&chunks), vec![(0, 5)]);
}

#[test]
fn test_windows_transcript_equal_to_window_size() {
    let messages = numbered(100);
    let chunks = sliding_windows(&messages, &WindowConfig::new(100, 50)).unwrap();
    assert_eq!(spans(&chunks), vec![(0, 100)]);
}

#[test]
fn test_windows_empty_transcript() {
    let chunks = sliding_windows(&[], &WindowConfig::default()).unwrap();
    assert!(chunks.is_empty());
}

#[test]
fn test_windows_preserve_message_order() {
    let messages = numbered(30);
    let chunks =
        sliding_windows(&messages, &WindowConfig::new(10, 5).min_messages(1)).unwrap();

    for chunk in &chunks {
        assert_eq!(chunk.messages(), &messages[chunk.start()..chunk.end()]);
    }
}

#[test]
fn test_window_config_validation() {
    assert_eq!(
        WindowConfig::new(0, 0).validate(),
        Err(WindowError::ZeroSize)
    );
    assert_eq!(
        WindowConfig::new(10, 10).validate(),
        Err(WindowError::OverlapTooLarge {
            size: 10,
            overlap: 10
        })
    );
    assert_eq!(WindowConfig::new(10, 3).step(), Ok(7));
    assert!(sliding_windows(&numbered(20), &WindowConfig::new(10, 12)).is_err());
}

#[test]
fn test_parse_json_accepts_column_aliases() {
    let raw = r#"[
        {"date": "2024-03-01 09:00", "user": "alice", "message": "  hello  "},
        {"speaker": "bob", "text": "hi"},
        {"user": "carol", "message": "   "}
    ]"#;

    let messages = parse_json(raw).unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].speaker, "alice");
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[0].timestamp.as_deref(), Some("2024-03-01 09:00"));
    assert_eq!(messages[1], Message::new("bob", "hi"));
}

#[test]
fn test_load_json_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"[{{"user": "a", "message": "one"}}, {{"user": "b", "message": "two"}}]"#)
        .unwrap();

    let messages = load_json(file.path()).unwrap();
    assert_eq!(messages.len(), 2);
}

#[test]
fn test_load_json_errors() {
    let missing = std::path::Path::new("/definitely/not/here.json");
    assert!(matches!(
        load_json(missing),
        Err(TranscriptError::NotFound { .. })
    ));

    let mut empty = NamedTempFile::new().unwrap();
    write!(empty, r#"[{{"user": "a", "message": ""}}]"#).unwrap();
    assert!(matches!(
        load_json(empty.path()),
        Err(TranscriptError::Empty { .. })
    ));

    let mut garbage = NamedTempFile::new().unwrap();
    write!(garbage, "not json").unwrap();
    assert!(matches!(
        load_json(garbage.path()),
        Err(TranscriptError::Parse(_))
    ));
}

#[test]
fn test_parse_csv_with_capitalized_headers() {
    let raw = "Date,User,Message\n\
               2024-03-01 09:00,alice,  hello  \n\
               2024-03-01 09:01,bob,\"hi, all\"\n\
               2024-03-01 09:02,carol,\n";

    let messages = parse_csv(raw).unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].speaker, "alice");
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[0].timestamp.as_deref(), Some("2024-03-01 09:00"));
    assert_eq!(messages[1].text, "hi, all");
}

#[test]
fn test_parse_csv_lowercase_headers_and_extra_columns() {
    let raw = "user,message,channel\nalice,one,general\nbob,two,random\n";

    let messages = parse_csv(raw).unwrap();

    assert_eq!(
        messages,
        vec![Message::new("alice", "one"), Message::new("bob", "two")]
    );
}

#[test]
fn test_parse_csv_missing_message_column() {
    assert!(matches!(
        parse_csv("Date,User\n2024-03-01,alice\n"),
        Err(TranscriptError::Csv(_))
    ));
}

#[test]
fn test_load_transcript_dispatches_on_extension() {
    let mut csv_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(csv_file, "Date,User,Message\n2024-03-01,a,one\n2024-03-02,b,two\n").unwrap();
    let messages = load_transcript(csv_file.path()).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].timestamp.as_deref(), Some("2024-03-02"));

    let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(json_file, r#"[{{"user": "a", "message": "one"}}]"#).unwrap();
    assert_eq!(load_transcript(json_file.path()).unwrap().len(), 1);

    let mut empty_csv = tempfile::Builder::new().suffix(".CSV").tempfile().unwrap();
    write!(empty_csv, "Date,User,Message\n2024-03-01,a,\n").unwrap();
    assert!(matches!(
        load_transcript(empty_csv.path()),
        Err(TranscriptError::Empty { .. })
    ));
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    for raw in [
        "2024-03-01 09:30:00",
        "2024-03-01T09:30:00",
        "2024-03-01 09:30",
        "2024/03/01 09:30",
        "2024-03-01T09:30:00+09:00",
        " 2024.03.01 09:30 ",
    ] {
        assert_eq!(parse_timestamp(raw), Some(expected), "{raw:?}");
    }

    let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0);
    assert_eq!(parse_timestamp("2024-03-01"), midnight);
    assert_eq!(parse_timestamp("yesterday"), None);
    assert_eq!(parse_timestamp(""), None);
}

#[test]
fn test_filter_recent_keeps_window_and_undated() {
    let now = NaiveDate::from_ymd_opt(2024, 3, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let messages = vec![
        Message::new("a", "old").with_timestamp("2024-02-01 08:00"),
        Message::new("b", "edge").with_timestamp("2024-03-03 12:00"),
        Message::new("c", "new").with_timestamp("2024-03-09"),
        Message::new("d", "undated"),
        Message::new("e", "garbled").with_timestamp("sometime"),
    ];

    let kept: Vec<String> = filter_recent(messages, 7, now)
        .into_iter()
        .map(|m| m.text)
        .collect();

    assert_eq!(kept, vec!["edge", "new", "undated", "garbled"]);
}
