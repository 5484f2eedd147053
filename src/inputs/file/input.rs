// SPDX-License-Identifier: Apache-2.0

//! The file input: a lifecycle supervisor wrapped around the tail loop.
//!
//! `start` launches the loop as an independent task; `close` cancels it and
//! waits for it to exit. The loop itself never fails the component: open
//! errors retry after a cooldown, lost sessions reopen immediately, and the
//! only terminal error a caller can see is a task panic.

use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use serde::Deserialize;
use tokio::select;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tracing::{debug, info, warn};

use crate::event::Event;
use crate::inputs::file::config::{FileInputConfig, StartAt};
use crate::inputs::file::error::Error;
use crate::inputs::file::tail::{TailItem, TailSession};
use crate::inputs::output::{EventOutput, SendError};
use crate::inputs::{Input, LifecycleState, get_meter};

/// Host-validated settings for the file input.
#[derive(Debug, Deserialize)]
struct FileSettings {
    path: String,
    #[serde(default)]
    start_at: Option<StartAt>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    open_retry_cooldown_ms: Option<u64>,
}

/// Build a file input from a settings object. Registered under `"file"` in
/// [`InputRegistry::with_builtins`](crate::inputs::InputRegistry::with_builtins).
pub fn factory(settings: &serde_json::Value) -> Result<Box<dyn Input>, BoxError> {
    let settings: FileSettings = serde_json::from_value(settings.clone())?;

    let mut config = FileInputConfig::new(settings.path);
    if let Some(start_at) = settings.start_at {
        config.start_at = start_at;
    }
    if let Some(ms) = settings.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = settings.open_retry_cooldown_ms {
        config.open_retry_cooldown = Duration::from_millis(ms);
    }
    config.validate()?;

    Ok(Box::new(FileInput::new(config)))
}

/// Counters shared by the tail loop.
struct InputMetrics {
    accepted: Counter<u64>,
    refused: Counter<u64>,
    open_failures: Counter<u64>,
    tags: [KeyValue; 1],
}

impl InputMetrics {
    fn new() -> Self {
        Self {
            accepted: get_meter()
                .u64_counter("sluice_input_accepted_events")
                .with_description("Number of events successfully pushed into the pipeline.")
                .with_unit("events")
                .build(),
            refused: get_meter()
                .u64_counter("sluice_input_refused_events")
                .with_description("Number of events that could not be pushed into the pipeline.")
                .with_unit("events")
                .build(),
            open_failures: get_meter()
                .u64_counter("sluice_input_open_failures")
                .with_description("Number of failed attempts to open the tailed path.")
                .with_unit("attempts")
                .build(),
            tags: [KeyValue::new("input", "file")],
        }
    }
}

/// Result of the first `close`, kept so repeat calls can answer the same way.
#[derive(Debug, Clone)]
enum Terminal {
    Clean,
    Panicked(String),
}

impl Terminal {
    fn to_result(&self) -> Result<(), BoxError> {
        match self {
            Terminal::Clean => Ok(()),
            Terminal::Panicked(msg) => Err(Error::TaskPanicked(msg.clone()).into()),
        }
    }
}

/// Tails a single file, emitting one event per line.
pub struct FileInput {
    config: FileInputConfig,
    cancel: CancellationToken,
    state: LifecycleState,
    task: Option<JoinHandle<()>>,
    terminal: Option<Terminal>,
}

impl FileInput {
    pub fn new(config: FileInputConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            state: LifecycleState::NotStarted,
            task: None,
            terminal: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }
}

#[async_trait]
impl Input for FileInput {
    fn start(&mut self, output: EventOutput) -> Result<(), BoxError> {
        if self.state != LifecycleState::NotStarted {
            return Err(Error::AlreadyStarted.into());
        }

        info!(path = ?self.config.path, "file input starting");

        let config = self.config.clone();
        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(run(config, output, cancel)));
        self.state = LifecycleState::Running;

        Ok(())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        let task = match self.task.take() {
            Some(task) => task,
            None => {
                return match &self.terminal {
                    Some(terminal) => terminal.to_result(),
                    None => Err(Error::NotStarted.into()),
                };
            }
        };

        self.cancel.cancel();
        let terminal = match task.await {
            Ok(()) => Terminal::Clean,
            Err(e) if e.is_panic() => Terminal::Panicked(panic_message(e.into_panic())),
            Err(e) => Terminal::Panicked(e.to_string()),
        };
        self.state = LifecycleState::Stopped;
        debug!(path = ?self.config.path, "file input stopped");

        let result = terminal.to_result();
        self.terminal = Some(terminal);
        result
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The tail loop: (re)open the file and follow it until cancellation.
async fn run(config: FileInputConfig, output: EventOutput, cancel: CancellationToken) {
    let metrics = InputMetrics::new();
    let mut start_at = config.start_at;

    loop {
        if cancel.is_cancelled() {
            return;
        }

        let mut session =
            match TailSession::open(&config.path, start_at, config.poll_interval).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(path = ?config.path, error = %e, "failed to open file, retrying");
                    metrics.open_failures.add(1, &metrics.tags);
                    select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(config.open_retry_cooldown) => {}
                    }
                    continue;
                }
            };

        // Anything readable after a reopen is new content, so only the
        // first open honors the configured start position.
        start_at = StartAt::Beginning;
        debug!(path = ?config.path, offset = session.offset(), "following file");

        loop {
            let item = select! {
                biased;
                _ = cancel.cancelled() => return,
                item = session.next() => item,
            };

            match item {
                Ok(TailItem::Line(text)) => {
                    match output.send(Event::new(text), &cancel).await {
                        Ok(()) => metrics.accepted.add(1, &metrics.tags),
                        Err(SendError::Cancelled) => {
                            metrics.refused.add(1, &metrics.tags);
                            return;
                        }
                        Err(SendError::Closed) => {
                            metrics.refused.add(1, &metrics.tags);
                            warn!(path = ?config.path, "output channel closed, stopping file input");
                            return;
                        }
                    }
                }
                Ok(TailItem::ReadError(e)) => {
                    warn!(path = ?config.path, error = %e, "failed to read line, skipping");
                }
                Err(e) => {
                    debug!(path = ?config.path, reason = %e, "tail session ended, reopening");
                    break;
                }
            }
        }
        // The session drops here, releasing the descriptor before the reopen.
    }
}
