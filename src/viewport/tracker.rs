//! Observable viewport state
//!
//! Holds the latest [`Viewport`] and notifies subscribers on every update.
//! Subscriptions are RAII handles: dropping one removes its listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::error::Result;
use super::mapping::Viewport;

type Listener = Box<dyn Fn(&Viewport) + Send + Sync>;

struct TrackerInner {
    current: RwLock<Viewport>,
    listeners: RwLock<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

/// Shared handle to the current viewport
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct ViewportTracker {
    inner: Arc<TrackerInner>,
}

impl ViewportTracker {
    /// Create a tracker holding `initial`
    pub fn new(initial: Viewport) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                current: RwLock::new(initial),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Latest viewport
    pub fn current(&self) -> Viewport {
        *self.inner.current.read()
    }

    /// Replace the viewport and notify subscribers
    ///
    /// Invalid viewports are rejected and the previous value is kept.
    /// Listeners must not subscribe or unsubscribe from inside the callback.
    pub fn update(&self, viewport: Viewport) -> Result<()> {
        viewport.validate()?;

        {
            let mut current = self.inner.current.write();
            if *current == viewport {
                return Ok(());
            }
            *current = viewport;
        }

        let listeners = self.inner.listeners.read();
        trace!(
            "Viewport updated to {}x{} (scroll {}), notifying {} listeners",
            viewport.canvas_width,
            viewport.canvas_height,
            viewport.scroll_y,
            listeners.len()
        );
        for (_, listener) in listeners.iter() {
            listener(&viewport);
        }
        Ok(())
    }

    /// Update only the scroll offset
    pub fn scroll_to(&self, scroll_y: f32) -> Result<()> {
        let viewport = self.current();
        self.update(viewport.with_document(viewport.document_height, scroll_y)?)
    }

    /// Register a listener
    ///
    /// The listener is called once immediately with the current viewport and
    /// again after every change, until the returned handle is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Viewport) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        listener(&self.current());
        self.inner.listeners.write().push((id, Box::new(listener)));
        debug!("Viewport listener {} subscribed", id);

        Subscription {
            id,
            tracker: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

/// Listener registration returned by [`ViewportTracker::subscribe`]
#[must_use = "dropping a Subscription removes the listener"]
pub struct Subscription {
    id: u64,
    tracker: Weak<TrackerInner>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.tracker.upgrade() {
            inner.listeners.write().retain(|(id, _)| *id != self.id);
            debug!("Viewport listener {} unsubscribed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn viewport(width: f32) -> Viewport {
        Viewport::new(width, 1080.0, width / 120.0, 9.0).unwrap()
    }

    #[test]
    fn test_subscribe_receives_current_and_updates() {
        let tracker = ViewportTracker::new(viewport(1920.0));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(RwLock::new(0.0f32));

        let calls_clone = calls.clone();
        let seen_clone = seen.clone();
        let _sub = tracker.subscribe(move |v| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            *seen_clone.write() = v.canvas_width;
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tracker.update(viewport(1280.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.read(), 1280.0);
    }

    #[test]
    fn test_unchanged_update_does_not_notify() {
        let tracker = ViewportTracker::new(viewport(1920.0));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _sub = tracker.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        tracker.update(viewport(1920.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let tracker = ViewportTracker::new(viewport(1920.0));
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        let sub = tracker.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(tracker.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(tracker.listener_count(), 0);

        tracker.update(viewport(1280.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outlives_tracker() {
        let tracker = ViewportTracker::new(viewport(1920.0));
        let sub = tracker.subscribe(|_| {});
        drop(tracker);
        drop(sub);
    }

    #[test]
    fn test_invalid_update_keeps_previous() {
        let tracker = ViewportTracker::new(viewport(1920.0));
        let mut bad = viewport(1280.0);
        bad.canvas_height = 0.0;

        assert!(tracker.update(bad).is_err());
        assert_eq!(tracker.current().canvas_width, 1920.0);
    }

    #[test]
    fn test_scroll_to() {
        let tracker = ViewportTracker::new(viewport(1920.0).with_document(3000.0, 0.0).unwrap());
        tracker.scroll_to(500.0).unwrap();
        assert_eq!(tracker.current().scroll_y, 500.0);
        assert_eq!(tracker.current().document_height, 3000.0);
    }
}
