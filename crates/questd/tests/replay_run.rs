//! End-to-end: replay a transcript through the frame loop.

use quest_common::{
    AnimationSystem, CompanionConfig, CompanionSession, EventSource, ItemRegistry, ProfileStore,
    RewardEngine,
};
use questd::{run, FrameLoop};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::timeout;

const TRANSCRIPT: &str = r#"{"type":"system","subtype":"init"}
{"type":"user","message":{"content":"please think hard about the parser"}}
{"type":"assistant","message":{"content":[{"type":"tool_use","id":"a","name":"Read","input":{"file_path":"src/lib.rs"}}],"usage":{"input_tokens":1200,"output_tokens":80}}}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"a","content":"..."}]}}
{"type":"assistant","message":{"content":[{"type":"tool_use","id":"b","name":"Edit","input":{}}]}}
{"type":"assistant","message":{"content":[{"type":"tool_use","id":"c","name":"Bash","input":{"command":"cargo test"}}]}}
{"type":"result","subtype":"success"}
"#;

#[tokio::test]
async fn test_replay_runs_to_completion_and_saves() {
    let dir = tempdir().unwrap();
    let transcript = dir.path().join("session.jsonl");
    fs::write(&transcript, TRANSCRIPT).unwrap();
    let profile_path = dir.path().join("profile.json");

    let registry = ItemRegistry::builtin();
    let store = ProfileStore::new(&profile_path);
    let session = CompanionSession::start(
        store,
        RewardEngine::with_seed(registry.clone(), 5),
        &CompanionConfig::default(),
    );
    let frame_loop = FrameLoop::new(AnimationSystem::new(), session);
    let source = EventSource::start_replay(&transcript, Duration::ZERO, 100).unwrap();

    let frame_loop = timeout(
        Duration::from_secs(10),
        run(source, frame_loop, Duration::from_millis(5), true),
    )
    .await
    .expect("replay did not finish")
    .unwrap();

    // think hard 25, read 5, edit 10, bash 15
    let profile = frame_loop.session().profile();
    assert_eq!(profile.xp, 55);
    assert_eq!(profile.total_thinking.get("hard"), Some(&1));
    assert_eq!(profile.tokens_consumed, 1200);
    // two session starts, the prompt, three tool uses, two successes
    assert_eq!(frame_loop.session().stats().total_tool_calls, 8);

    let saved = ProfileStore::new(&profile_path).load(&registry);
    assert_eq!(saved.xp, 55);
    assert_eq!(saved.sessions_started, 1);
}
