// SPDX-License-Identifier: Apache-2.0

//! Configuration for the file input.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::inputs::file::error::{Error, Result};

/// How often an idle tail session re-checks the file for new data.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Delay between failed attempts to open the tailed path. Bounds the retry
/// rate when the file is missing or unreadable.
pub const DEFAULT_OPEN_RETRY_COOLDOWN: Duration = Duration::from_millis(500);

/// Where the first successful open positions the read cursor.
///
/// Applies to the first open only; after a rotation or recreation the new
/// file is always read from the beginning, since all of its content is new.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartAt {
    /// Read the file from the start, emitting content that already exists.
    #[default]
    Beginning,
    /// Skip existing content and emit only what is appended afterwards.
    End,
}

/// Configuration for the file input.
#[derive(Debug, Clone)]
pub struct FileInputConfig {
    /// Path of the file to tail. The file does not have to exist yet.
    pub path: PathBuf,
    /// Where to start reading on the first successful open.
    pub start_at: StartAt,
    /// How often an idle session checks the file for new data.
    pub poll_interval: Duration,
    /// Delay between failed attempts to open the path.
    pub open_retry_cooldown: Duration,
}

impl FileInputConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start_at: StartAt::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            open_retry_cooldown: DEFAULT_OPEN_RETRY_COOLDOWN,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("path must not be empty".to_string()));
        }
        Ok(())
    }
}
