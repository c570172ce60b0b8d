//! Cursor Relay Server
//!
//! WebSocket relay that assigns each connection an id, keeps the latest
//! normalized position per id, and periodically fans the full table out to
//! every client.
//!
//! # Architecture
//!
//! ```text
//! RelayServer
//!   ├─> Accept loop        (one semaphore permit per open connection)
//!   │     └─> Session task per connection
//!   │           ├─> init {id}
//!   │           ├─> reader:  null | [x, y]  ─> RelayState::update()
//!   │           └─> writer:  bounded mpsc   ─> WebSocket
//!   └─> Broadcast task     (interval, only when clients exist and the table changed)
//!         └─> RelayState::broadcast_if_dirty()
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cursor_tether::config::Config;
//! use cursor_tether::server::RelayServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!     RelayServer::new(config).run().await
//! }
//! ```

mod session;
mod state;

pub use session::ID_LENGTH;
pub use state::{BroadcastStats, RelayState};

use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::utils::{metric_names, MetricsCollector};

/// Cursor relay server
pub struct RelayServer {
    config: Arc<Config>,
    state: Arc<RelayState>,
    metrics: MetricsCollector,
}

impl RelayServer {
    /// Create a relay from validated configuration
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RelayState::new()),
            metrics: MetricsCollector::new(),
        }
    }

    /// Shared cursor table
    pub fn state(&self) -> Arc<RelayState> {
        self.state.clone()
    }

    /// Relay metrics
    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Bind the configured address and serve until Ctrl+C
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .context("Invalid listen address")?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("╔════════════════════════════════════════════════════════════╗");
        info!("║          Cursor Relay is Starting                          ║");
        info!("╚════════════════════════════════════════════════════════════╝");
        info!("  Listen Address: {}", addr);
        info!("  Max Connections: {}", self.config.server.max_connections);
        info!(
            "  Broadcast Interval: {}ms",
            self.config.server.broadcast_interval_ms
        );
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let metrics = self.metrics.clone();
        let log_metrics = self.config.logging.metrics;

        let result = self
            .serve(listener, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("Shutdown requested");
            })
            .await;

        if log_metrics {
            match metrics.export_json() {
                Ok(json) => info!("Final metrics:\n{}", json),
                Err(e) => warn!("Failed to export metrics: {}", e),
            }
        }

        info!("Cursor relay shutdown complete");
        result
    }

    /// Serve connections from `listener` until `shutdown` completes
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr().context("Listener has no address")?;
        info!("Relay listening on ws://{}", local_addr);

        let broadcaster = tokio::spawn(broadcast_loop(
            self.state.clone(),
            self.metrics.clone(),
            Duration::from_millis(self.config.server.broadcast_interval_ms),
        ));

        // One permit per connection, held from accept until the session ends
        let slots = Arc::new(Semaphore::new(self.config.server.max_connections));
        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                            continue;
                        }
                    };

                    let Ok(permit) = slots.clone().try_acquire_owned() else {
                        warn!(
                            "Refusing connection from {}: {} connections open",
                            peer,
                            self.config.server.max_connections
                        );
                        self.metrics
                            .increment_counter(metric_names::CONNECTIONS_REJECTED, 1);
                        continue;
                    };

                    let state = self.state.clone();
                    let metrics = self.metrics.clone();
                    let queue_size = self.config.server.client_queue_size;
                    sessions.spawn(async move {
                        let _permit = permit;
                        if let Err(e) =
                            session::handle_connection(stream, peer, state, metrics, queue_size)
                                .await
                        {
                            debug!("Session with {} ended with error: {:#}", peer, e);
                        }
                    });
                }

                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
            }
        }

        broadcaster.abort();
        sessions.shutdown().await;
        info!("Relay on {} stopped", local_addr);
        Ok(())
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        debug!("RelayServer dropped");
    }
}

async fn broadcast_loop(state: Arc<RelayState>, metrics: MetricsCollector, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Some(stats) = state.broadcast_if_dirty() {
            metrics.increment_counter(metric_names::BROADCASTS, 1);
            if stats.dropped > 0 {
                metrics.increment_counter(metric_names::BROADCASTS_DROPPED, stats.dropped as u64);
            }
        }
    }
}
