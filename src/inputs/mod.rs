// SPDX-License-Identifier: Apache-2.0

//! Pipeline inputs.
//!
//! An input produces [`Event`](crate::event::Event)s onto a caller-owned
//! channel. Instances are built by name through an [`InputRegistry`], an
//! explicit constructor table owned by the host process; nothing registers
//! itself through global state.

pub mod file;
pub mod output;

use std::collections::HashMap;

use async_trait::async_trait;
use opentelemetry::global;
use opentelemetry::metrics::Meter;
use serde_json::Value;
use tower::BoxError;

use crate::inputs::output::EventOutput;

pub fn get_meter() -> Meter {
    global::meter("inputs")
}

/// Lifecycle of an input instance.
///
/// An input starts at most once and cannot be restarted after stopping; a
/// fresh instance is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
}

/// A source of events.
#[async_trait]
pub trait Input: Send {
    /// Launch the input's background task and return immediately. The task
    /// reports only through the output channel and [`close`](Input::close).
    fn start(&mut self, output: EventOutput) -> Result<(), BoxError>;

    /// Signal cancellation and wait for the background task to exit.
    ///
    /// Returns `Ok(())` on a graceful stop; only unrecoverable internal
    /// faults surface as errors. Safe to call after the task has already
    /// exited, and repeat calls return the same terminal result.
    async fn close(&mut self) -> Result<(), BoxError>;
}

/// Constructor for an input, from host-validated settings.
pub type InputFactory = fn(&Value) -> Result<Box<dyn Input>, BoxError>;

/// Constructor table mapping input names to factories.
#[derive(Default)]
pub struct InputRegistry {
    factories: HashMap<&'static str, InputFactory>,
}

impl InputRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every input this crate ships.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("file", file::factory);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: InputFactory) {
        self.factories.insert(name, factory);
    }

    /// Instantiate an input by name.
    pub fn create(&self, name: &str, settings: &Value) -> Result<Box<dyn Input>, BoxError> {
        match self.factories.get(name) {
            Some(factory) => factory(settings),
            None => Err(format!("unknown input: {}", name).into()),
        }
    }
}
