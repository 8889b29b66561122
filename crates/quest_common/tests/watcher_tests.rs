//! Live tail and replay through the async event source.

use quest_common::watcher::encode_project_dir;
use quest_common::{Event, EventKind, EventSource, WatcherConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::timeout;

const READ_LINE: &str = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"r1","name":"Grep","input":{"pattern":"fn"}}]}}"#;
const BASH_LINE: &str = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"b1","name":"Bash","input":{"command":"cargo fmt"}}]}}"#;
const WRITE_LINE: &str = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"w1","name":"Edit","input":{}}]}}"#;
const TOOL_RESULT_LINE: &str = r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"b1","content":"ok"}]}}"#;

fn append(path: &Path, text: &str) {
    let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.sync_all().unwrap();
}

async fn next(source: &mut EventSource) -> Event {
    timeout(Duration::from_secs(2), source.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event source closed")
}

fn fast_config(root: &Path) -> WatcherConfig {
    WatcherConfig {
        poll_interval_ms: 10,
        rescan_every_polls: 3,
        transcripts_root: Some(root.to_path_buf()),
        ..WatcherConfig::default()
    }
}

fn project_dir(root: &Path, project: &Path) -> PathBuf {
    let dir = root.join(encode_project_dir(project));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn test_live_watch_only_emits_terminated_lines() {
    let root = tempdir().unwrap();
    let project = PathBuf::from("/work/demo");
    let transcript = project_dir(root.path(), &project).join("session.jsonl");
    // history before the watch starts is not replayed
    fs::write(&transcript, format!("{}\n", READ_LINE)).unwrap();

    let mut source = EventSource::start_live_watch(&project, &fast_config(root.path())).unwrap();
    let first = next(&mut source).await;
    assert_eq!(first.kind, EventKind::SessionStart);
    assert_eq!(first.details, "Watching: session.jsonl");

    append(&transcript, &format!("{}\n{}", BASH_LINE, &WRITE_LINE[..15]));
    assert_eq!(next(&mut source).await.kind, EventKind::Bash);
    assert!(timeout(Duration::from_millis(200), source.recv()).await.is_err());

    append(&transcript, &format!("{}\n", &WRITE_LINE[15..]));
    assert_eq!(next(&mut source).await.kind, EventKind::Writing);

    // tool results never produce events
    append(&transcript, &format!("{}\n", TOOL_RESULT_LINE));
    assert!(timeout(Duration::from_millis(200), source.recv()).await.is_err());
}

#[tokio::test]
async fn test_live_watch_switches_to_newer_transcript() {
    let root = tempdir().unwrap();
    let project = PathBuf::from("/work/switch");
    let dir = project_dir(root.path(), &project);
    fs::write(dir.join("old.jsonl"), "").unwrap();

    let mut source = EventSource::start_live_watch(&project, &fast_config(root.path())).unwrap();
    assert_eq!(next(&mut source).await.details, "Watching: old.jsonl");

    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(dir.join("new.jsonl"), format!("{}\n", READ_LINE)).unwrap();
    // sub-agent transcripts never win
    fs::write(dir.join("agent-9.jsonl"), format!("{}\n", BASH_LINE)).unwrap();

    let switched = next(&mut source).await;
    assert_eq!(switched.kind, EventKind::SessionStart);
    assert_eq!(switched.details, "Switched: new.jsonl");
    assert_eq!(next(&mut source).await.kind, EventKind::Reading);
}

#[tokio::test]
async fn test_live_watch_without_transcripts_is_not_found() {
    let root = tempdir().unwrap();
    let project = PathBuf::from("/work/empty");
    project_dir(root.path(), &project);

    let err = EventSource::start_live_watch(&project, &fast_config(root.path()))
        .err()
        .unwrap();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_replay_emits_every_line_then_completes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.jsonl");
    fs::write(
        &path,
        format!("{}\nthis is not json\n{}\n{}\n", READ_LINE, TOOL_RESULT_LINE, BASH_LINE),
    )
    .unwrap();

    let mut source = EventSource::start_replay(&path, Duration::ZERO, 100).unwrap();
    let mut events = Vec::new();
    while let Some(event) = timeout(Duration::from_secs(2), source.recv()).await.unwrap() {
        events.push(event);
    }

    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::SessionStart, EventKind::Reading, EventKind::Bash, EventKind::Success]
    );
    assert_eq!(events[0].details, "Replaying: s.jsonl");
    assert_eq!(events[3].details, "Replay complete");

    for _ in 0..100 {
        if source.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(source.is_finished());
}

#[tokio::test]
async fn test_replay_skips_lines_with_invalid_utf8() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.jsonl");
    let mut content = format!("{}\n", READ_LINE).into_bytes();
    content.extend_from_slice(b"\xff\xfe garbage\n");
    content.extend_from_slice(format!("{}\n", READ_LINE).as_bytes());
    fs::write(&path, content).unwrap();

    let mut source = EventSource::start_replay(&path, Duration::ZERO, 100).unwrap();
    let mut events = Vec::new();
    while let Some(event) = timeout(Duration::from_secs(2), source.recv()).await.unwrap() {
        events.push(event);
    }

    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::SessionStart,
            EventKind::Reading,
            EventKind::Reading,
            EventKind::Success
        ]
    );
    assert_eq!(events[3].details, "Replay complete");
}

#[tokio::test]
async fn test_replay_is_paced() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.jsonl");
    fs::write(&path, format!("{}\n{}\n", READ_LINE, BASH_LINE)).unwrap();

    let mut source = EventSource::start_replay(&path, Duration::from_millis(300), 100).unwrap();
    assert_eq!(next(&mut source).await.kind, EventKind::SessionStart);
    assert_eq!(next(&mut source).await.kind, EventKind::Reading);
    // the bash event waits for the delay
    assert!(source.try_next().is_none());
}

#[tokio::test]
async fn test_replay_missing_file() {
    let dir = tempdir().unwrap();
    let err = EventSource::start_replay(dir.path().join("nope.jsonl"), Duration::ZERO, 10)
        .err()
        .unwrap();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_stop_ends_the_task() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.jsonl");
    fs::write(&path, "").unwrap();

    let source = EventSource::start_live_file(&path, &WatcherConfig::default()).unwrap();
    source.stop();
    for _ in 0..100 {
        if source.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(source.is_finished());
}
