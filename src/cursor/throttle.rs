//! Leading + trailing rate limiter for outbound updates
//!
//! The first message after a quiet period goes out immediately. Messages
//! offered inside the interval replace each other, and the newest one is
//! released by [`Throttle::poll`] once the interval has elapsed.

use std::time::{Duration, Instant};

/// Default send interval (ms)
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Rate limiter holding at most one pending message
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_sent: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    /// Create a throttle sending at most once per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
            pending: None,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_sent
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Offer a message; returns it if it may be sent now
    pub fn offer(&mut self, message: T, now: Instant) -> Option<T> {
        if self.ready(now) {
            self.last_sent = Some(now);
            self.pending = None;
            Some(message)
        } else {
            self.pending = Some(message);
            None
        }
    }

    /// Release the pending message once the interval has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.ready(now) {
            self.last_sent = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Whether a message is waiting
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Throttle<T> {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_THROTTLE_MS))
    }
}
