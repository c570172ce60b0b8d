//! Connect / reconnect loop

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use super::{ChannelEvent, ClientError, Result};
use crate::protocol::{CursorUpdate, ServerMessage};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connected session ended
enum SessionEnd {
    /// Server closed the socket
    Closed,
    /// The channel handle was dropped
    HandleDropped,
}

/// Keep a connection to `url` alive until the handle goes away
pub(super) async fn connection_loop(
    url: String,
    reconnect_delay: Duration,
    mut outbound: mpsc::UnboundedReceiver<CursorUpdate>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    loop {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!("Connected to {}", url);
                if events.send(ChannelEvent::Connected).is_err() {
                    return;
                }

                let result = run_session(socket, &mut outbound, &events).await;
                let _ = events.send(ChannelEvent::Disconnected);

                match result {
                    Ok(SessionEnd::HandleDropped) => {
                        debug!("Channel handle dropped, leaving {}", url);
                        return;
                    }
                    Ok(SessionEnd::Closed) => info!("Connection to {} closed", url),
                    Err(e) => warn!("Connection to {} failed: {}", url, e),
                }
            }
            Err(e) => warn!("Could not connect to {}: {}", url, e),
        }

        if events.is_closed() {
            return;
        }
        debug!("Reconnecting in {:?}", reconnect_delay);
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn run_session(
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<CursorUpdate>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> Result<SessionEnd> {
    let (mut sink, mut source) = socket.split();

    // Updates queued while disconnected: only the newest matters
    let mut latest = None;
    while let Ok(update) = outbound.try_recv() {
        latest = Some(update);
    }
    if let Some(update) = latest {
        sink.send(Message::Text(update.encode()?)).await?;
    }

    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerMessage::decode(&text) {
                    Ok(message) => {
                        trace!("Received {:?}", message);
                        if events.send(ChannelEvent::Message(message)).is_err() {
                            let _ = sink.close().await;
                            return Ok(SessionEnd::HandleDropped);
                        }
                    }
                    Err(e) => warn!("Ignoring relay message: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Closed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(ClientError::WebSocket(e)),
            },

            update = outbound.recv() => match update {
                Some(update) => sink.send(Message::Text(update.encode()?)).await?,
                None => {
                    let _ = sink.close().await;
                    return Ok(SessionEnd::HandleDropped);
                }
            },
        }
    }
}
