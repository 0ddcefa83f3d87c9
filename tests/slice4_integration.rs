//! Integration tests for Slice 4
//!
//! Tests replaying a recorded script through the full event loop

use shakeball::core::{AnswerSelector, OracleRuntime, Script, VolumeSource, BINARY_ANSWERS};
use shakeball::types::{AnswerMode, OracleConfig, OracleStatus};
use std::time::Duration;

const SESSION: &str = r#"
# phone at rest
{"kind":"sample","x":0.0,"y":0.0,"z":9.8}
# shake: deltas of 4 at 50, 100, 150ms
{"kind":"sample","x":0.0,"y":0.0,"z":13.8}
{"kind":"sample","x":0.0,"y":0.0,"z":9.8}
{"kind":"sample","x":0.0,"y":0.0,"z":13.8}
{"kind":"sample","x":0.0,"y":0.0,"z":9.8}
# tap while the ball is still spinning
{"kind":"tap","at_ms":1000}
# hold volume-down after the first reveal
{"kind":"volume","at_ms":3000,"level":0.5}
{"kind":"volume","at_ms":3000,"level":0.4,"direction":"down"}
"#;

fn spawn(script: &Script, seed: u64) -> OracleRuntime {
    let volume = script
        .volume_source()
        .map(|source| Box::new(source) as Box<dyn VolumeSource>);
    OracleRuntime::builder(OracleConfig::default())
        .selector(AnswerSelector::seeded(seed))
        .motion_source(script.motion_source())
        .volume_source(volume)
        .spawn()
}

/// Collect every published status until the script has played out
async fn replay(script: &Script, seed: u64) -> Vec<OracleStatus> {
    let runtime = spawn(script, seed);
    let handle = runtime.handle();
    let mut rx = handle.subscribe();

    for at in script.taps.iter().copied() {
        let tap_handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(at).await;
            let _ = tap_handle.tap();
        });
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    runtime.shutdown().await;

    let mut seen = Vec::new();
    while let Ok(status) = rx.try_recv() {
        seen.push(status);
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_replay_session() {
    let script = Script::parse(SESSION).unwrap();
    let seen = replay(&script, 99).await;

    // shake reveal, commit, binary reveal, mode reset, commit
    let revealing: Vec<bool> = seen.iter().map(|s| s.is_revealing).collect();
    assert_eq!(revealing, vec![true, false, true, true, false]);

    let first = &seen[1];
    assert_eq!(first.reveal_count, 1);
    assert_eq!(first.mode, AnswerMode::Normal);

    assert_eq!(seen[2].mode, AnswerMode::Binary);
    assert_eq!(seen[3].mode, AnswerMode::Normal);

    let last = seen.last().unwrap();
    assert_eq!(last.reveal_count, 2);
    assert!(BINARY_ANSWERS.contains(&last.current_answer.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_replay_is_deterministic_for_a_seed() {
    let script = Script::parse(SESSION).unwrap();
    let a = replay(&script, 7).await;
    let b = replay(&script, 7).await;

    let answers = |v: &[OracleStatus]| {
        v.iter().map(|s| s.current_answer.clone()).collect::<Vec<_>>()
    };
    assert_eq!(answers(&a), answers(&b));
}

#[test]
fn test_session_script_shape() {
    let script = Script::parse(SESSION).unwrap();
    assert_eq!(script.readings.len(), 5);
    assert_eq!(script.taps, vec![Duration::from_millis(1000)]);
    assert_eq!(script.volume.len(), 2);
    assert_eq!(script.duration(Duration::from_millis(50)), Duration::from_millis(3000));
}
