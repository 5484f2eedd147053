// SPDX-License-Identifier: Apache-2.0

//! Streaming inputs for an event-processing pipeline.
//!
//! The crate currently ships a single input: a file tailer that follows a
//! named path, emits one [`event::Event`] per line, and rides out rotation,
//! truncation and recreation of the file. See [`inputs::file`].

pub mod bounded_channel;
pub mod event;
pub mod inputs;
