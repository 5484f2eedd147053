// SPDX-License-Identifier: Apache-2.0

//! File input: tails a single file and emits one event per line.
//!
//! Survives rotation, truncation and removal of the path: a session that
//! loses its file is torn down and the path is reopened immediately, with a
//! cooldown only when the open itself fails.

pub mod config;
pub mod error;
pub mod identity;
pub mod input;
pub mod tail;

pub use config::{FileInputConfig, StartAt};
pub use error::{Error, Result};
pub use input::{FileInput, factory};
