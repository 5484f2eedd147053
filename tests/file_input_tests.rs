// SPDX-License-Identifier: Apache-2.0

//! File Input Integration Tests
//!
//! End-to-end tests of the file input against real files: late creation,
//! rotation, truncation, backpressure and lifecycle behavior.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde_json::json;
use sluice::bounded_channel::{BoundedReceiver, bounded};
use sluice::event::Event;
use sluice::inputs::file::{FileInput, FileInputConfig, StartAt};
use sluice::inputs::output::EventOutput;
use sluice::inputs::{Input, InputRegistry, LifecycleState};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

fn test_config(path: &Path) -> FileInputConfig {
    let mut config = FileInputConfig::new(path);
    config.poll_interval = Duration::from_millis(10);
    config.open_retry_cooldown = Duration::from_millis(50);
    config
}

fn append(path: &Path, data: &str) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(data.as_bytes()).unwrap();
}

async fn recv(rx: &mut BoundedReceiver<Event>) -> Event {
    timeout(RECV_TIMEOUT, rx.next())
        .await
        .expect("timed out waiting for an event")
        .expect("output channel closed unexpectedly")
}

#[tokio::test]
async fn emits_lines_from_a_file_created_after_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");

    let (tx, mut rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();
    assert_eq!(input.state(), LifecycleState::Running);

    append(&path, "a\n");
    append(&path, "b\n");

    assert_eq!(recv(&mut rx).await.payload(), "a");
    assert_eq!(recv(&mut rx).await.payload(), "b");

    timeout(CLOSE_TIMEOUT, input.close())
        .await
        .expect("close did not return")
        .unwrap();
    assert_eq!(input.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn emits_lines_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");

    for i in 0..50 {
        append(&path, &format!("before {}\n", i));
    }

    let (tx, mut rx) = bounded(256);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    for i in 0..50 {
        append(&path, &format!("after {}\n", i));
    }

    for i in 0..50 {
        assert_eq!(recv(&mut rx).await.payload(), format!("before {}", i));
    }
    for i in 0..50 {
        assert_eq!(recv(&mut rx).await.payload(), format!("after {}", i));
    }

    input.close().await.unwrap();
}

#[tokio::test]
async fn terminator_only_lines_are_empty_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "\n\n");

    let (tx, mut rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    assert_eq!(recv(&mut rx).await.payload(), "");
    assert_eq!(recv(&mut rx).await.payload(), "");

    input.close().await.unwrap();
}

#[tokio::test]
async fn resumes_after_truncation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "x\n");

    let (tx, mut rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    assert_eq!(recv(&mut rx).await.payload(), "x");

    // Truncate in place and give the poll a chance to observe the shrink
    // before new content lands.
    std::fs::File::create(&path).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    append(&path, "y\n");

    assert_eq!(recv(&mut rx).await.payload(), "y");

    input.close().await.unwrap();
}

#[tokio::test]
async fn resumes_after_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "old\n");

    let (tx, mut rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    assert_eq!(recv(&mut rx).await.payload(), "old");

    std::fs::rename(&path, dir.path().join("app.log.1")).unwrap();
    append(&path, "new\n");

    assert_eq!(recv(&mut rx).await.payload(), "new");

    input.close().await.unwrap();
}

#[tokio::test]
async fn recovers_once_an_unopenable_path_becomes_openable() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("logs");
    let path = sub.join("app.log");

    let (tx, mut rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    // Opens fail while the parent directory is missing; the input keeps
    // retrying on its cooldown.
    tokio::time::sleep(Duration::from_millis(150)).await;
    std::fs::create_dir_all(&sub).unwrap();
    append(&path, "ok\n");

    assert_eq!(recv(&mut rx).await.payload(), "ok");

    input.close().await.unwrap();
}

#[tokio::test]
async fn start_at_end_skips_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "existing\n");

    let mut config = test_config(&path);
    config.start_at = StartAt::End;

    let (tx, mut rx) = bounded(16);
    let mut input = FileInput::new(config);
    input.start(EventOutput::new(tx)).unwrap();

    append(&path, "appended\n");
    assert_eq!(recv(&mut rx).await.payload(), "appended");

    input.close().await.unwrap();
}

#[tokio::test]
async fn close_returns_even_when_nothing_drains_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    for i in 0..10 {
        append(&path, &format!("line {}\n", i));
    }

    // Capacity of one and no consumer: the task fills the channel and then
    // blocks sending the second event.
    let (tx, rx) = bounded(1);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    timeout(CLOSE_TIMEOUT, input.close())
        .await
        .expect("close must not be held up by a stalled consumer")
        .unwrap();

    assert!(rx.len() <= 1);
}

#[tokio::test]
async fn close_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");

    let (tx, _rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    input.close().await.unwrap();
    // Repeat calls return the same terminal result without blocking.
    input.close().await.unwrap();
    assert_eq!(input.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn close_before_start_reports_not_started() {
    let mut input = FileInput::new(test_config(Path::new("/tmp/app.log")));
    let err = input.close().await.err().expect("close must not succeed");
    assert!(err.to_string().contains("never started"));
}

#[tokio::test]
async fn second_start_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");

    let (tx, _rx) = bounded(16);
    let output = EventOutput::new(tx);

    let mut input = FileInput::new(test_config(&path));
    input.start(output.clone()).unwrap();
    assert!(input.start(output).is_err());

    input.close().await.unwrap();
}

#[tokio::test]
async fn stops_gracefully_when_the_output_channel_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");

    let (tx, rx) = bounded(16);
    let mut input = FileInput::new(test_config(&path));
    input.start(EventOutput::new(tx)).unwrap();

    drop(rx);
    append(&path, "into the void\n");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The task already exited on its own; close just reaps it.
    timeout(CLOSE_TIMEOUT, input.close())
        .await
        .expect("close did not return")
        .unwrap();
}

#[tokio::test]
async fn registry_built_input_tails_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "from the registry\n");

    let settings = json!({
        "path": path.to_str().unwrap(),
        "poll_interval_ms": 10,
        "open_retry_cooldown_ms": 50,
    });

    let registry = InputRegistry::with_builtins();
    let mut input = registry.create("file", &settings).unwrap();

    let (tx, mut rx) = bounded(16);
    input.start(EventOutput::new(tx)).unwrap();

    assert_eq!(recv(&mut rx).await.payload(), "from the registry");

    input.close().await.unwrap();
}
