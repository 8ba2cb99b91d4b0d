//! Durable event log tests

use simplesync_core::{Event, EventDraft, EventLog, EventQuery, JsonlEventLog, LogError};
use std::io::Write;
use tempfile::TempDir;

fn event(id: &str, timestamp: u64) -> Event {
    EventDraft::new(id, timestamp, "user-123", "doc1", "edit")
        .with_payload(r#"{"cursor":1}"#)
        .into_event()
}

#[tokio::test]
async fn test_append_and_reopen_preserves_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");

    {
        let log = JsonlEventLog::open(&path).unwrap();
        assert_eq!(log.append(event("b", 20)).await.unwrap(), 1);
        assert_eq!(log.append(event("a", 10)).await.unwrap(), 2);
        assert_eq!(log.append(event("c", 30)).await.unwrap(), 3);
    }

    let reopened = JsonlEventLog::open(&path).unwrap();
    let ids: Vec<_> = reopened.events().await.unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
    assert_eq!(reopened.append(event("d", 40)).await.unwrap(), 4);
}

#[tokio::test]
async fn test_record_on_disk_when_append_returns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    let log = JsonlEventLog::open(&path).unwrap();

    assert_eq!(log.append(event("a", 10)).await.unwrap(), 1);

    // Read through a separate handle while the log is still open
    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(r#"{"seq":1,"event":{"id":"a""#));
    assert!(contents.ends_with('\n'));
}

#[tokio::test]
async fn test_duplicate_rejected_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");

    {
        let log = JsonlEventLog::open(&path).unwrap();
        log.append(event("a", 10)).await.unwrap();
    }

    let log = JsonlEventLog::open(&path).unwrap();
    let err = log.append(event("a", 99)).await.unwrap_err();
    assert!(matches!(err, LogError::DuplicateId(ref id) if id == "a"));
    assert_eq!(log.len().await.unwrap(), 1);
    assert!(log.contains("a").await.unwrap());
}

#[tokio::test]
async fn test_torn_tail_is_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");

    {
        let log = JsonlEventLog::open(&path).unwrap();
        log.append(event("a", 10)).await.unwrap();
    }

    // Simulate a crash in the middle of writing the second record
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(br#"{"seq":2,"event":{"id":"b","times"#).unwrap();
    drop(file);

    let log = JsonlEventLog::open(&path).unwrap();
    assert_eq!(log.len().await.unwrap(), 1);

    // The slot is reusable after truncation
    assert_eq!(log.append(event("b", 20)).await.unwrap(), 2);
    drop(log);

    let log = JsonlEventLog::open(&path).unwrap();
    assert_eq!(log.len().await.unwrap(), 2);
}

#[tokio::test]
async fn test_interior_corruption_fails_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");

    {
        let log = JsonlEventLog::open(&path).unwrap();
        log.append(event("a", 10)).await.unwrap();
    }

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"not json\n").unwrap();
    drop(file);

    match JsonlEventLog::open(&path) {
        Err(LogError::Corrupt { line, .. }) => assert_eq!(line, 2),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("corrupt log should not open"),
    }
}

#[tokio::test]
async fn test_query_by_timestamp() {
    let dir = TempDir::new().unwrap();
    let log = JsonlEventLog::open(dir.path().join("nested/events.jsonl")).unwrap();

    for (id, ts) in [("1", 100), ("2", 200), ("3", 300)] {
        log.append(event(id, ts)).await.unwrap();
    }

    let ids: Vec<_> = log
        .query(&EventQuery::since(150))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["2", "3"]);

    let ids: Vec<_> = log
        .query(&EventQuery::since(100).until(200))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
}
