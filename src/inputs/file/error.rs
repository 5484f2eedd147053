// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("input was already started")]
    AlreadyStarted,

    #[error("input was never started")]
    NotStarted,

    #[error("input task panicked: {0}")]
    TaskPanicked(String),

    #[error("file was removed")]
    Removed,

    #[error("file was replaced by a different file")]
    Rotated,

    #[error("file was truncated to {len} bytes, below read offset {offset}")]
    Truncated { len: u64, offset: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
