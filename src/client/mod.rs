//! Relay client channel
//!
//! Owns a background task that keeps a WebSocket connection to the relay,
//! reconnecting after a delay whenever it closes or fails. The frame loop
//! talks to it only through queues: [`CursorChannel::send`] enqueues an
//! update and [`CursorChannel::try_recv`] drains received events without
//! blocking.
//!
//! ```text
//! Scene ──send()──> outbound mpsc ──> WebSocket ──> relay
//! Scene <─try_recv()── events mpsc <── WebSocket <── relay
//! ```

mod connection;

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::protocol::{CursorUpdate, ProtocolError, ServerMessage};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client channel error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// URL is not a ws:// or wss:// URL
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),

    /// Background task has stopped
    #[error("Channel closed")]
    Closed,

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Frame could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Event delivered by the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection was established
    Connected,
    /// Message received from the relay
    Message(ServerMessage),
    /// The connection closed or failed; a reconnect is scheduled
    Disconnected,
}

/// Handle to the background connection task
///
/// Dropping the handle stops the task.
pub struct CursorChannel {
    outbound: mpsc::UnboundedSender<CursorUpdate>,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    task: JoinHandle<()>,
}

impl CursorChannel {
    /// Start connecting to `url` on the current tokio runtime
    pub fn connect(url: impl Into<String>, reconnect_delay: Duration) -> Result<Self> {
        let url = url.into();
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(ClientError::InvalidUrl(url));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        debug!("Starting relay channel to {}", url);
        let task = tokio::spawn(connection::connection_loop(
            url,
            reconnect_delay,
            outbound_rx,
            events_tx,
        ));

        Ok(Self {
            outbound: outbound_tx,
            events: events_rx,
            task,
        })
    }

    /// Queue an update; sent on the current or next connection
    pub fn send(&self, update: CursorUpdate) -> Result<()> {
        self.outbound.send(update).map_err(|_| ClientError::Closed)
    }

    /// Next event, if one is waiting
    pub fn try_recv(&mut self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event; `None` once the task has stopped
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Stop the background task
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for CursorChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}
