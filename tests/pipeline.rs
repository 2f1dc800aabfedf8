//! End-to-end pipeline scenarios against a mocked remote host.

use std::sync::{Arc, Mutex};

use regex::Regex;

use picbed::config::Config;
use picbed::error::UploadError;
use picbed::history::HistoryStore;
use picbed::pipeline::{upload_batch, EventSink, LocalFile, NullSink, UploadEvent};
use picbed::storage::MemoryStore;
use picbed::uploader::MockRemoteHost;

fn config() -> Config {
    Config {
        token: "abc".to_string(),
        owner: "alice".to_string(),
        repo: "imgs".to_string(),
        branch: "main".to_string(),
        path: "images".to_string(),
    }
}

fn history() -> HistoryStore {
    HistoryStore::new(Arc::new(MemoryStore::new()))
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Records every event so tests can assert on ordering and cardinality.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<UploadEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UploadEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test]
async fn successful_upload_records_history_with_cdn_link() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_file(&dir, "photo.PNG", b"\x89PNG\r\n\x1a\nfake");
    let history = history();

    let mut host = MockRemoteHost::new();
    host.expect_create_file()
        .withf(|req| {
            req.branch == "main"
                && req.path.starts_with("images/")
                && req.path.ends_with(".PNG")
                && req.message.starts_with("Upload image: ")
                && !req.content_base64.is_empty()
        })
        .times(1)
        .returning(|_| Ok(()));

    let report = upload_batch(
        &[LocalFile::from_path(&img)],
        Some(&config()),
        &host,
        &history,
        &NullSink,
    )
    .await
    .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);

    let records = history.load().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];

    let path_shape = Regex::new(r"^images/\d+_[0-9a-z]{6}\.PNG$").unwrap();
    assert!(
        path_shape.is_match(&record.path),
        "unexpected path: {}",
        record.path
    );
    assert_eq!(record.path, format!("images/{}", record.name));
    assert_eq!(
        record.links.cdn,
        format!("https://cdn.jsdelivr.net/gh/alice/imgs@main/{}", record.path)
    );
    assert!(record.links.markdown.contains(&record.links.cdn));
}

#[tokio::test]
async fn missing_config_short_circuits_without_network_or_history() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_file(&dir, "photo.png", b"data");
    let history = history();

    let mut host = MockRemoteHost::new();
    host.expect_create_file().times(0);

    let err = upload_batch(
        &[LocalFile::from_path(&img)],
        None,
        &host,
        &history,
        &NullSink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, UploadError::ConfigIncomplete));
    assert!(history.load().unwrap().is_empty());
}

#[tokio::test]
async fn incomplete_config_short_circuits_too() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_file(&dir, "photo.png", b"data");
    let history = history();

    let mut host = MockRemoteHost::new();
    host.expect_create_file().times(0);

    let incomplete = Config {
        token: "  ".to_string(),
        ..config()
    };
    let err = upload_batch(
        &[LocalFile::from_path(&img)],
        Some(&incomplete),
        &host,
        &history,
        &NullSink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, UploadError::ConfigIncomplete));
}

#[tokio::test]
async fn remote_rejection_surfaces_message_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_file(&dir, "a.png", b"one");
    let second = write_file(&dir, "b.png", b"two");
    let history = history();

    let mut host = MockRemoteHost::new();
    // Both files must still be attempted.
    host.expect_create_file()
        .times(2)
        .returning(|_| Err(UploadError::RemoteRejected("Bad credentials".to_string())));

    let report = upload_batch(
        &[LocalFile::from_path(&first), LocalFile::from_path(&second)],
        Some(&config()),
        &host,
        &history,
        &NullSink,
    )
    .await
    .unwrap();

    assert_eq!(report.failed(), 2);
    for outcome in &report.outcomes {
        match &outcome.result {
            Err(UploadError::RemoteRejected(msg)) => assert_eq!(msg, "Bad credentials"),
            other => panic!("expected RemoteRejected, got {other:?}"),
        }
    }
    assert!(history.load().unwrap().is_empty());
}

#[tokio::test]
async fn non_image_is_skipped_but_image_still_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_file(&dir, "notes.txt", b"text");
    let img = write_file(&dir, "photo.png", b"pixels");
    let history = history();

    let mut host = MockRemoteHost::new();
    host.expect_create_file()
        .withf(|req| req.path.ends_with(".png"))
        .times(1)
        .returning(|_| Ok(()));

    let report = upload_batch(
        &[LocalFile::from_path(&notes), LocalFile::from_path(&img)],
        Some(&config()),
        &host,
        &history,
        &NullSink,
    )
    .await
    .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(
        report.outcomes[0].result,
        Err(UploadError::UnsupportedType(_))
    ));
    assert!(report.outcomes[1].result.is_ok());
    assert_eq!(history.load().unwrap().len(), 1);
}

#[tokio::test]
async fn unreadable_file_fails_alone() {
    let dir = tempfile::tempdir().unwrap();
    let ghost = dir.path().join("ghost.png");
    let img = write_file(&dir, "real.png", b"pixels");
    let history = history();

    let mut host = MockRemoteHost::new();
    host.expect_create_file().times(1).returning(|_| Ok(()));

    let report = upload_batch(
        &[LocalFile::from_path(&ghost), LocalFile::from_path(&img)],
        Some(&config()),
        &host,
        &history,
        &NullSink,
    )
    .await
    .unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        Err(UploadError::Read { .. })
    ));
    assert!(report.outcomes[1].result.is_ok());
}

#[tokio::test]
async fn events_hit_fixed_checkpoints_with_one_terminal_event_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_file(&dir, "photo.png", b"pixels");
    let history = history();
    let sink = RecordingSink::default();

    let mut host = MockRemoteHost::new();
    host.expect_create_file().times(1).returning(|_| Ok(()));

    upload_batch(
        &[LocalFile::from_path(&img)],
        Some(&config()),
        &host,
        &history,
        &sink,
    )
    .await
    .unwrap();

    let events = sink.events.lock().unwrap();
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            UploadEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![0, 20, 40, 80, 100]);

    let terminal: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, UploadEvent::Uploaded { .. } | UploadEvent::Failed { .. }))
        .collect();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(terminal[0], UploadEvent::Uploaded { .. }));
}

#[tokio::test]
async fn failed_file_emits_failure_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_file(&dir, "notes.txt", b"text");
    let history = history();
    let sink = RecordingSink::default();

    let mut host = MockRemoteHost::new();
    host.expect_create_file().times(0);

    upload_batch(
        &[LocalFile::from_path(&notes)],
        Some(&config()),
        &host,
        &history,
        &sink,
    )
    .await
    .unwrap();

    let events = sink.events.lock().unwrap();
    let failures = events
        .iter()
        .filter(|e| matches!(e, UploadEvent::Failed { .. }))
        .count();
    assert_eq!(failures, 1);
    assert!(!events
        .iter()
        .any(|e| matches!(e, UploadEvent::Uploaded { .. })));
}
