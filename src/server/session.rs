//! Per-connection WebSocket session

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::RelayState;
use crate::protocol::{CursorUpdate, ServerMessage};
use crate::utils::{metric_names, MetricsCollector};

/// Length of connection ids
pub const ID_LENGTH: usize = 8;

/// Fresh 8-character id not used by any connected client
pub(super) fn generate_id(state: &RelayState) -> String {
    loop {
        let id: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(ID_LENGTH)
            .collect();
        if !state.contains(&id) {
            return id;
        }
    }
}

/// Drive one client from handshake to close
pub(super) async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<RelayState>,
    metrics: MetricsCollector,
    queue_size: usize,
) -> anyhow::Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    let id = generate_id(&state);
    let init = ServerMessage::Init { id: id.clone() }.encode()?;
    let (tx, mut rx) = mpsc::channel::<String>(queue_size);
    if !state.register(&id, tx) {
        anyhow::bail!("Connection id collision: {}", id);
    }

    // Broadcasts queue up behind init until the writer starts
    if let Err(e) = sink.send(Message::Text(init)).await {
        state.unregister(&id);
        return Err(e.into());
    }
    info!("Client {} connected from {}", id, peer);
    metrics.increment_counter(metric_names::CONNECTIONS_TOTAL, 1);
    metrics.set_gauge(metric_names::CONNECTIONS_ACTIVE, state.client_count() as f64);

    let writer_id = id.clone();
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Send to {} failed: {}", writer_id, e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => match CursorUpdate::decode(&text) {
                Ok(update) => {
                    state.update(&id, update);
                    metrics.increment_counter(metric_names::MESSAGES_RECEIVED, 1);
                }
                Err(e) => {
                    warn!("Ignoring message from {}: {}", id, e);
                    metrics.increment_counter(metric_names::MESSAGES_INVALID, 1);
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Connection {} error: {}", id, e);
                break;
            }
        }
    }

    state.unregister(&id);
    writer.abort();
    metrics.set_gauge(metric_names::CONNECTIONS_ACTIVE, state.client_count() as f64);
    info!("Client {} disconnected", id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let state = RelayState::new();
        let id = generate_id(&state);
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_id_unique() {
        let state = RelayState::new();
        let mut receivers = Vec::new();
        for _ in 0..64 {
            let id = generate_id(&state);
            let (tx, rx) = mpsc::channel(1);
            assert!(state.register(&id, tx));
            receivers.push(rx);
        }
        assert_eq!(state.client_count(), 64);
    }
}
