//! Shared relay state
//!
//! The cursor table and the outbound queue of every connected client. All
//! locks are `parking_lot` locks held only for short synchronous sections,
//! never across an `.await`.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use crate::protocol::{CursorEntry, CursorUpdate, ServerMessage};

/// Outcome of one broadcast tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Clients the table was queued for
    pub sent: usize,
    /// Clients whose queue was full
    pub dropped: usize,
}

/// Cursor table plus connected clients
pub struct RelayState {
    /// Latest position per id; ids appear after their first update
    cursors: RwLock<BTreeMap<String, Option<[f32; 2]>>>,

    /// Outbound queue per connected client
    clients: RwLock<HashMap<String, mpsc::Sender<String>>>,

    /// Table changed since the last broadcast
    dirty: AtomicBool,
}

impl RelayState {
    /// Create an empty state
    pub fn new() -> Self {
        Self {
            cursors: RwLock::new(BTreeMap::new()),
            clients: RwLock::new(HashMap::new()),
            dirty: AtomicBool::new(true),
        }
    }

    /// Add a client queue under `id`; returns false if the id is taken
    ///
    /// Marks the table dirty so the newcomer receives it on the next tick.
    pub fn register(&self, id: &str, tx: mpsc::Sender<String>) -> bool {
        let mut clients = self.clients.write();
        if clients.contains_key(id) {
            return false;
        }
        clients.insert(id.to_string(), tx);
        self.dirty.store(true, Ordering::Release);
        debug!("Client {} registered ({} connected)", id, clients.len());
        true
    }

    /// Remove a client and its cursor
    pub fn unregister(&self, id: &str) {
        let remaining = {
            let mut clients = self.clients.write();
            clients.remove(id);
            clients.len()
        };
        if self.cursors.write().remove(id).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
        debug!("Client {} unregistered ({} connected)", id, remaining);
    }

    /// Whether `id` is in use
    pub fn contains(&self, id: &str) -> bool {
        self.clients.read().contains_key(id)
    }

    /// Store the latest update from `id`
    pub fn update(&self, id: &str, update: CursorUpdate) {
        trace!("Cursor {} -> {:?}", id, update.position());
        self.cursors.write().insert(id.to_string(), update.position());
        self.dirty.store(true, Ordering::Release);
    }

    /// Number of connected clients
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Current table, ordered by id
    pub fn snapshot(&self) -> Vec<CursorEntry> {
        self.cursors
            .read()
            .iter()
            .map(|(id, xy)| (id.clone(), *xy))
            .collect()
    }

    /// Whether the table changed since the last broadcast
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Queue the table for every client if anyone is connected and it changed
    ///
    /// Full client queues drop this frame; the next tick carries the newest
    /// table anyway.
    pub fn broadcast_if_dirty(&self) -> Option<BroadcastStats> {
        if self.client_count() == 0 || !self.dirty.swap(false, Ordering::AcqRel) {
            return None;
        }

        let message = ServerMessage::Cursors {
            cursors: self.snapshot(),
        };
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode cursor table: {}", e);
                return None;
            }
        };

        let mut stats = BroadcastStats::default();
        for (id, tx) in self.clients.read().iter() {
            match tx.try_send(text.clone()) {
                Ok(()) => stats.sent += 1,
                Err(TrySendError::Full(_)) => {
                    trace!("Queue full for {}, dropping broadcast", id);
                    stats.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        Some(stats)
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_broadcast_without_clients() {
        let state = RelayState::new();
        state.update("a", CursorUpdate::at([0.5, 0.5]));
        assert_eq!(state.broadcast_if_dirty(), None);
        // Still pending for the first client
        assert!(state.is_dirty());
    }

    #[test]
    fn test_broadcast_only_when_dirty() {
        let state = RelayState::new();
        let (tx, mut rx) = mpsc::channel(4);
        assert!(state.register("a", tx));

        let stats = state.broadcast_if_dirty().unwrap();
        assert_eq!(stats.sent, 1);
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"cursors","cursors":[]}"#);

        assert_eq!(state.broadcast_if_dirty(), None);

        state.update("a", CursorUpdate::at([0.5, 0.25]));
        state.broadcast_if_dirty().unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            r#"{"type":"cursors","cursors":[["a",[0.5,0.25]]]}"#
        );
    }

    #[test]
    fn test_hidden_cursor_broadcast_as_null() {
        let state = RelayState::new();
        let (tx, mut rx) = mpsc::channel(4);
        state.register("a", tx);
        state.update("a", CursorUpdate::hidden());

        state.broadcast_if_dirty().unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            r#"{"type":"cursors","cursors":[["a",null]]}"#
        );
    }

    #[test]
    fn test_unregister_removes_cursor_and_marks_dirty() {
        let state = RelayState::new();
        let (tx_a, _rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        state.register("a", tx_a);
        state.register("b", tx_b);
        state.update("a", CursorUpdate::at([0.1, 0.1]));
        state.broadcast_if_dirty();
        rx_b.try_recv().unwrap();

        state.unregister("a");
        assert!(!state.contains("a"));
        assert!(state.snapshot().is_empty());

        state.broadcast_if_dirty().unwrap();
        assert_eq!(rx_b.try_recv().unwrap(), r#"{"type":"cursors","cursors":[]}"#);
    }

    #[test]
    fn test_full_queue_drops_frame() {
        let state = RelayState::new();
        let (tx, mut rx) = mpsc::channel(1);
        state.register("slow", tx);

        state.update("slow", CursorUpdate::at([0.5, 0.5]));
        assert_eq!(state.broadcast_if_dirty().unwrap().sent, 1);

        state.update("slow", CursorUpdate::at([0.25, 0.5]));
        let stats = state.broadcast_if_dirty().unwrap();
        assert_eq!(stats.dropped, 1);

        assert!(rx.try_recv().unwrap().contains("0.5,0.5"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_new_client_receives_current_table() {
        let state = RelayState::new();
        let (tx_a, _rx_a) = mpsc::channel(4);
        state.register("a", tx_a);
        state.update("a", CursorUpdate::at([0.5, 0.5]));
        state.broadcast_if_dirty().unwrap();
        assert!(!state.is_dirty());

        let (tx_b, mut rx_b) = mpsc::channel(4);
        state.register("b", tx_b);
        assert_eq!(state.broadcast_if_dirty().unwrap().sent, 2);
        assert!(rx_b.try_recv().unwrap().contains(r#"["a",[0.5,0.5]]"#));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let state = RelayState::new();
        let (tx1, _rx1) = mpsc::channel(1);
        let (tx2, _rx2) = mpsc::channel(1);
        assert!(state.register("a", tx1));
        assert!(!state.register("a", tx2));
        assert_eq!(state.client_count(), 1);
    }
}
