// SPDX-License-Identifier: Apache-2.0

use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::bounded_channel::BoundedSender;
use crate::event::Event;

/// Error type for send operations with cancellation support.
#[derive(Debug, PartialEq, Eq)]
pub enum SendError {
    /// The operation was cancelled via the cancellation token.
    Cancelled,
    /// The channel was disconnected.
    Closed,
}

/// Send-only handle an input uses to push events into the pipeline.
///
/// The channel is owned by the pipeline; inputs never close it.
#[derive(Clone)]
pub struct EventOutput {
    tx: BoundedSender<Event>,
}

impl EventOutput {
    pub fn new(tx: BoundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Send one event, racing the cancellation token so a stalled consumer
    /// cannot delay shutdown.
    pub async fn send(&self, event: Event, cancel: &CancellationToken) -> Result<(), SendError> {
        let send_fut = self.tx.send_async(event);
        tokio::pin!(send_fut);

        select! {
            result = send_fut => match result {
                Ok(()) => Ok(()),
                Err(_) => Err(SendError::Closed),
            },
            _ = cancel.cancelled() => Err(SendError::Cancelled),
        }
    }
}
