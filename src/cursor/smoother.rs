//! Cursor Position Smoother
//!
//! Turns sparse, jittery network samples (~10 Hz) into a continuous position
//! that can be read every frame.
//!
//! # Interpolation Model
//!
//! Each new sample enqueues a linear segment from the previous sample to the
//! new one. Its duration is the gap between the two arrivals, clamped:
//!
//! ```text
//! duration = clamp(arrival(n) - arrival(n-1), min_interval, max_interval)
//! start    = max(end of previous segment, arrival(n))
//! ```
//!
//! Output therefore trails the newest sample by about one interval and never
//! overshoots it.
//!
//! # States
//!
//! ```text
//! Never ──push(Some)──> Visible ──push(None)──> Hidden
//!                          ^                       │
//!                          └──────push(Some)───────┘  (snaps)
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

/// Configuration for the cursor smoother
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Maximum number of pending segments before they are collapsed
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Shortest segment duration (ms)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Longest segment duration (ms)
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

fn default_history_size() -> usize {
    8
}
fn default_min_interval_ms() -> u64 {
    16
}
fn default_max_interval_ms() -> u64 {
    300
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

/// Smoothed output at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothedPosition {
    /// No sample has ever been received
    Never,
    /// Latest sample was explicitly hidden
    Hidden,
    /// Interpolated position
    At(Vec2),
}

impl SmoothedPosition {
    /// Position if visible
    pub fn position(&self) -> Option<Vec2> {
        match self {
            SmoothedPosition::At(p) => Some(*p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Never,
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    from: Vec2,
    to: Vec2,
    start: Instant,
    duration: Duration,
}

impl Segment {
    fn end(&self) -> Instant {
        self.start + self.duration
    }

    fn at(&self, now: Instant) -> Vec2 {
        if now <= self.start {
            return self.from;
        }
        let t = now.duration_since(self.start).as_secs_f32() / self.duration.as_secs_f32();
        self.from.lerp(self.to, t.min(1.0))
    }
}

/// Per-cursor interpolation state machine
pub struct CursorSmoother {
    /// Configuration
    config: SmootherConfig,

    phase: Phase,

    /// Position at the end of the last completed segment (or the snap point)
    settled: Vec2,

    /// Pending segments, oldest first
    segments: VecDeque<Segment>,

    /// Newest sample and its arrival time
    latest: Option<(Vec2, Instant)>,

    /// End of the newest queued segment
    tail_end: Option<Instant>,

    disposed: bool,
}

impl CursorSmoother {
    /// Create a smoother that has not received any sample
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            segments: VecDeque::with_capacity(config.history_size),
            config,
            phase: Phase::Never,
            settled: Vec2::ZERO,
            latest: None,
            tail_end: None,
            disposed: false,
        }
    }

    /// Add a sample that arrived at `at` (`None` hides the cursor)
    pub fn push(&mut self, sample: Option<Vec2>, at: Instant) {
        if self.disposed {
            return;
        }

        let Some(point) = sample else {
            self.segments.clear();
            self.latest = None;
            self.tail_end = None;
            self.phase = Phase::Hidden;
            trace!("Smoother hidden");
            return;
        };

        let Some((previous, previous_at)) = self.latest.filter(|_| self.phase == Phase::Visible)
        else {
            self.snap(point, at);
            return;
        };

        let duration = at.saturating_duration_since(previous_at).clamp(
            Duration::from_millis(self.config.min_interval_ms),
            Duration::from_millis(self.config.max_interval_ms),
        );
        let start = self.tail_end.map_or(at, |end| end.max(at));

        self.segments.push_back(Segment {
            from: previous,
            to: point,
            start,
            duration,
        });
        self.tail_end = Some(start + duration);
        self.latest = Some((point, at));

        if self.segments.len() > self.config.history_size {
            self.collapse(point, at, duration);
        }
    }

    /// Smoothed position at `now`
    pub fn sample(&mut self, now: Instant) -> SmoothedPosition {
        match self.phase {
            Phase::Never => return SmoothedPosition::Never,
            Phase::Hidden => return SmoothedPosition::Hidden,
            Phase::Visible => {}
        }

        while let Some(front) = self.segments.front() {
            if front.end() > now {
                break;
            }
            self.settled = front.to;
            self.segments.pop_front();
        }

        match self.segments.front() {
            Some(segment) => SmoothedPosition::At(segment.at(now)),
            None => SmoothedPosition::At(self.settled),
        }
    }

    /// Release buffered state; later pushes are ignored
    pub fn dispose(&mut self) {
        self.segments = VecDeque::new();
        self.latest = None;
        self.tail_end = None;
        self.phase = Phase::Never;
        self.disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) was called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of queued segments
    pub fn pending(&self) -> usize {
        self.segments.len()
    }

    fn snap(&mut self, point: Vec2, at: Instant) {
        self.segments.clear();
        self.settled = point;
        self.latest = Some((point, at));
        self.tail_end = Some(at);
        self.phase = Phase::Visible;
        trace!("Smoother snapped to ({:.1}, {:.1})", point.x, point.y);
    }

    /// Replace all pending segments with one from the current output to `point`
    fn collapse(&mut self, point: Vec2, at: Instant, duration: Duration) {
        let current = self.sample(at).position().unwrap_or(point);
        trace!(
            "Smoother history overflow ({} segments), collapsing",
            self.segments.len()
        );

        self.segments.clear();
        self.settled = current;
        self.segments.push_back(Segment {
            from: current,
            to: point,
            start: at,
            duration,
        });
        self.tail_end = Some(at + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn at(p: SmoothedPosition) -> Vec2 {
        match p {
            SmoothedPosition::At(v) => v,
            other => panic!("expected visible position, got {:?}", other),
        }
    }

    #[test]
    fn test_never_before_first_sample() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        assert_eq!(smoother.sample(Instant::now()), SmoothedPosition::Never);
    }

    #[test]
    fn test_first_sample_snaps() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        let t0 = Instant::now();
        smoother.push(Some(Vec2::new(100.0, 50.0)), t0);
        assert_eq!(at(smoother.sample(t0)), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_interpolates_strictly_between_samples() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        let t0 = Instant::now();
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, 40.0);

        smoother.push(Some(a), t0);
        smoother.push(Some(b), t0 + ms(100));

        // Segment runs from t0+100 to t0+200
        assert_eq!(at(smoother.sample(t0 + ms(100))), a);

        let mut last = a;
        for step in 1..10 {
            let p = at(smoother.sample(t0 + ms(100 + step * 10)));
            assert!(p.x > 0.0 && p.x < 100.0, "x = {}", p.x);
            assert!(p.y > 0.0 && p.y < 40.0, "y = {}", p.y);
            assert!(p.x > last.x, "not monotone at step {}", step);
            last = p;
        }

        assert_eq!(at(smoother.sample(t0 + ms(200))), b);
        assert_eq!(at(smoother.sample(t0 + ms(500))), b);
    }

    #[test]
    fn test_no_jump_between_frames() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        let t0 = Instant::now();
        smoother.push(Some(Vec2::ZERO), t0);
        smoother.push(Some(Vec2::new(300.0, 0.0)), t0 + ms(100));
        smoother.push(Some(Vec2::new(600.0, 0.0)), t0 + ms(200));

        let mut previous = at(smoother.sample(t0));
        for frame in 1..30 {
            let p = at(smoother.sample(t0 + ms(frame * 16)));
            // 300 px per 100 ms ⇒ at most ~48 px per 16 ms frame
            assert!(p.distance(previous) <= 48.5, "jump at frame {}", frame);
            previous = p;
        }
    }

    #[test]
    fn test_duration_is_clamped() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        let t0 = Instant::now();
        smoother.push(Some(Vec2::ZERO), t0);
        smoother.push(Some(Vec2::new(100.0, 0.0)), t0 + ms(5000));

        // Gap of 5 s is clamped to 300 ms
        let mid = at(smoother.sample(t0 + ms(5150)));
        assert!((mid.x - 50.0).abs() < 1.0);
        assert_eq!(at(smoother.sample(t0 + ms(5300))).x, 100.0);
    }

    #[test]
    fn test_hidden_then_snap() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        let t0 = Instant::now();
        smoother.push(Some(Vec2::ZERO), t0);
        smoother.push(Some(Vec2::new(100.0, 0.0)), t0 + ms(100));
        smoother.push(None, t0 + ms(150));

        assert_eq!(smoother.sample(t0 + ms(160)), SmoothedPosition::Hidden);
        assert_eq!(smoother.sample(t0 + ms(400)), SmoothedPosition::Hidden);
        assert_eq!(smoother.pending(), 0);

        smoother.push(Some(Vec2::new(500.0, 500.0)), t0 + ms(450));
        assert_eq!(at(smoother.sample(t0 + ms(450))), Vec2::new(500.0, 500.0));
    }

    #[test]
    fn test_overflow_collapses_without_jump() {
        let config = SmootherConfig {
            history_size: 3,
            ..Default::default()
        };
        let mut smoother = CursorSmoother::new(config);
        let t0 = Instant::now();

        // Burst of samples faster than the minimum interval builds a backlog
        smoother.push(Some(Vec2::ZERO), t0);
        for i in 1..=3u64 {
            smoother.push(Some(Vec2::new(i as f32 * 10.0, 0.0)), t0 + ms(i));
        }
        assert_eq!(smoother.pending(), 3);
        let before = at(smoother.sample(t0 + ms(3)));

        smoother.push(Some(Vec2::new(40.0, 0.0)), t0 + ms(3));
        assert_eq!(smoother.pending(), 1);

        let after = at(smoother.sample(t0 + ms(3)));
        assert!(after.distance(before) < 1e-4);
        assert_eq!(at(smoother.sample(t0 + ms(1000))), Vec2::new(40.0, 0.0));
    }

    #[test]
    fn test_dispose() {
        let mut smoother = CursorSmoother::new(SmootherConfig::default());
        let t0 = Instant::now();
        smoother.push(Some(Vec2::ONE), t0);
        smoother.dispose();

        assert!(smoother.is_disposed());
        smoother.push(Some(Vec2::ZERO), t0 + ms(10));
        assert_eq!(smoother.sample(t0 + ms(20)), SmoothedPosition::Never);
    }
}
