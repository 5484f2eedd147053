// SPDX-License-Identifier: Apache-2.0

//! Follow-mode reading of a single file.
//!
//! A [`TailSession`] is one open-and-follow attempt: it owns the descriptor,
//! assembles complete lines as the file grows, and notices when the path no
//! longer refers to the file it opened. Rotation, truncation and removal all
//! end the session; the caller decides how to reopen.

use std::mem;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tracing::trace;

use crate::inputs::file::config::StartAt;
use crate::inputs::file::error::{Error, Result};
use crate::inputs::file::identity::FileIdentity;

/// Outcome of one wait on [`TailSession::next`].
#[derive(Debug)]
pub enum TailItem {
    /// A complete line with its terminator stripped.
    Line(String),
    /// A single line could not be read; the session is still usable.
    ReadError(std::io::Error),
}

/// One open-and-follow attempt on a file.
pub struct TailSession {
    path: PathBuf,
    reader: BufReader<File>,
    identity: FileIdentity,
    /// Bytes consumed from the file so far; a length below this means the
    /// file was truncated underneath us.
    offset: u64,
    /// Partial line carried across polls until its terminator arrives.
    pending: Vec<u8>,
    /// Session end observed while a partial line was still buffered.
    ended: Option<Error>,
    poll_interval: Duration,
}

impl TailSession {
    /// Open the file and position the read cursor.
    pub async fn open(path: &Path, start_at: StartAt, poll_interval: Duration) -> Result<Self> {
        let mut file = File::open(path).await?;
        let meta = file.metadata().await?;
        let identity = FileIdentity::of(&meta);

        let mut offset = 0;
        if start_at == StartAt::End {
            offset = meta.len();
            file.seek(SeekFrom::Start(offset)).await?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            identity,
            offset,
            pending: Vec::new(),
            ended: None,
            poll_interval,
        })
    }

    /// Bytes consumed so far, counted from the start of the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Wait for the next complete line.
    ///
    /// Returns `Err` once the session is over: the path is gone, refers to a
    /// different file, or the file shrank below the consumed offset. A
    /// partial line buffered at that point is flushed first, since the
    /// session ending is what completes it, and the end is reported on the
    /// next call.
    pub async fn next(&mut self) -> Result<TailItem> {
        if let Some(ended) = self.ended.take() {
            return Err(ended);
        }

        loop {
            let n = self.reader.read_until(b'\n', &mut self.pending).await?;

            if n > 0 {
                self.offset += n as u64;
                if self.pending.ends_with(b"\n") {
                    return Ok(self.take_line());
                }
                // Terminator not seen yet; keep reading.
                continue;
            }

            // EOF. Before waiting for more data, make sure the path still
            // refers to the file this session opened.
            if let Err(ended) = self.verify_still_current().await {
                if !self.pending.is_empty() {
                    self.ended = Some(ended);
                    return Ok(self.take_line());
                }
                return Err(ended);
            }

            trace!(path = ?self.path, offset = self.offset, "at EOF, waiting for new data");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn take_line(&mut self) -> TailItem {
        let mut raw = mem::take(&mut self.pending);
        if raw.ends_with(b"\n") {
            raw.pop();
            if raw.ends_with(b"\r") {
                raw.pop();
            }
        }
        match String::from_utf8(raw) {
            Ok(text) => TailItem::Line(text),
            Err(e) => {
                TailItem::ReadError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            }
        }
    }

    /// Stat the path and compare it against the file this session opened.
    async fn verify_still_current(&self) -> Result<()> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::Removed),
            Err(e) => return Err(Error::Io(e)),
        };

        if FileIdentity::of(&meta) != self.identity {
            return Err(Error::Rotated);
        }
        if meta.len() < self.offset {
            return Err(Error::Truncated {
                len: meta.len(),
                offset: self.offset,
            });
        }
        Ok(())
    }
}
