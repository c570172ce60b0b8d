//! Local and remote cursor state

use glam::Vec2;
use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::time::{Duration, Instant};
use tracing::debug;

use super::smoother::{CursorSmoother, SmoothedPosition, SmootherConfig};
use super::throttle::Throttle;
use crate::protocol::{CursorEntry, CursorUpdate};
use crate::viewport::Viewport;

/// Local pointer input in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer moved inside the canvas
    Move(Vec2),
    /// Pointer entered the canvas
    Enter(Vec2),
    /// Pointer left the canvas
    Leave,
}

/// Cursor yaw (radians) for a world x position
///
/// Cursors on the left edge face right and vice versa.
pub fn heading(world_x: f32, world_width: f32) -> f32 {
    let t = world_x / world_width + 0.5;
    0.75 * PI + (0.25 * PI - 0.75 * PI) * t
}

/// The cursor driven by local input
pub struct SelfCursor {
    /// Sample enqueued by input, applied at frame time
    pending: Option<Option<Vec2>>,

    /// Applied position in canvas pixels, `None` when hidden
    position: Option<Vec2>,

    throttle: Throttle<CursorUpdate>,
}

impl SelfCursor {
    /// Create a hidden self cursor sending at most once per `send_interval`
    pub fn new(send_interval: Duration) -> Self {
        Self {
            pending: None,
            position: None,
            throttle: Throttle::new(send_interval),
        }
    }

    /// Record an input event; returns an update if one may be sent now
    pub fn handle(
        &mut self,
        event: PointerEvent,
        viewport: &Viewport,
        now: Instant,
    ) -> Option<CursorUpdate> {
        let update = match event {
            PointerEvent::Move(p) | PointerEvent::Enter(p) => {
                self.pending = Some(Some(p));
                CursorUpdate::at(viewport.normalize(p))
            }
            PointerEvent::Leave => {
                self.pending = Some(None);
                CursorUpdate::hidden()
            }
        };
        self.throttle.offer(update, now)
    }

    /// Trailing update whose throttle interval has elapsed
    pub fn poll_outbound(&mut self, now: Instant) -> Option<CursorUpdate> {
        self.throttle.poll(now)
    }

    /// Apply the pending input sample and return the current position
    pub fn apply_pending(&mut self) -> Option<Vec2> {
        if let Some(sample) = self.pending.take() {
            self.position = sample;
        }
        self.position
    }

    /// Current position in canvas pixels
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Whether the cursor is shown
    pub fn is_visible(&self) -> bool {
        self.position.is_some()
    }
}

/// Visible remote cursor at a frame
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    /// Connection id
    pub id: String,
    /// Smoothed position in document pixels
    pub document_position: Vec2,
}

/// Remote cursors keyed by connection id
pub struct CursorRegistry {
    config: SmootherConfig,
    self_id: Option<String>,
    cursors: BTreeMap<String, CursorSmoother>,
}

impl CursorRegistry {
    /// Create an empty registry
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            config,
            self_id: None,
            cursors: BTreeMap::new(),
        }
    }

    /// Id assigned to this client by the relay
    pub fn set_self_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if let Some(mut smoother) = self.cursors.remove(&id) {
            smoother.dispose();
        }
        self.self_id = Some(id);
    }

    /// Our own id, once known
    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    /// Apply a full cursor table received at `now`
    ///
    /// Cursors missing from the table are disposed and removed.
    pub fn apply(&mut self, entries: &[CursorEntry], viewport: &Viewport, now: Instant) {
        let self_id = self.self_id.as_deref();
        let incoming: Vec<&CursorEntry> = entries
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != self_id)
            .collect();

        self.cursors.retain(|id, smoother| {
            let keep = incoming.iter().any(|(other, _)| other == id);
            if !keep {
                smoother.dispose();
                debug!("Remote cursor {} left", id);
            }
            keep
        });

        for (id, xy) in incoming {
            let smoother = self.cursors.entry(id.clone()).or_insert_with(|| {
                debug!("Remote cursor {} joined", id);
                CursorSmoother::new(self.config.clone())
            });
            smoother.push(xy.map(|xy| viewport.denormalize(xy)), now);
        }
    }

    /// Cursors with a visible smoothed position at `now`
    pub fn visible(&mut self, now: Instant) -> Vec<RemoteCursor> {
        self.cursors
            .iter_mut()
            .filter_map(|(id, smoother)| match smoother.sample(now) {
                SmoothedPosition::At(p) => Some(RemoteCursor {
                    id: id.clone(),
                    document_position: p,
                }),
                _ => None,
            })
            .collect()
    }

    /// Ids of every known remote cursor, hidden ones included
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cursors.keys().map(String::as_str)
    }

    /// Number of known remote cursors
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Whether no remote cursor is known
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Dispose every smoother and forget all cursors
    pub fn clear(&mut self) {
        for smoother in self.cursors.values_mut() {
            smoother.dispose();
        }
        self.cursors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 500.0, 10.0, 5.0)
            .unwrap()
            .with_document(2000.0, 0.0)
            .unwrap()
    }

    fn entry(id: &str, xy: Option<[f32; 2]>) -> CursorEntry {
        (id.to_string(), xy)
    }

    #[test]
    fn test_heading_edges() {
        assert!((heading(-5.0, 10.0) - 0.75 * PI).abs() < 1e-6);
        assert!((heading(0.0, 10.0) - 0.5 * PI).abs() < 1e-6);
        assert!((heading(5.0, 10.0) - 0.25 * PI).abs() < 1e-6);
    }

    #[test]
    fn test_self_cursor_throttles_and_hides() {
        let mut cursor = SelfCursor::new(Duration::from_millis(100));
        let t0 = Instant::now();
        let vp = viewport();

        let first = cursor.handle(PointerEvent::Enter(Vec2::new(500.0, 100.0)), &vp, t0);
        assert_eq!(first, Some(CursorUpdate::at([0.5, 0.05])));
        assert_eq!(cursor.apply_pending(), Some(Vec2::new(500.0, 100.0)));

        let left = cursor.handle(PointerEvent::Leave, &vp, t0 + Duration::from_millis(10));
        assert_eq!(left, None);
        assert_eq!(cursor.apply_pending(), None);
        assert!(!cursor.is_visible());

        assert_eq!(
            cursor.poll_outbound(t0 + Duration::from_millis(100)),
            Some(CursorUpdate::hidden())
        );
    }

    #[test]
    fn test_pending_sample_waits_for_frame() {
        let mut cursor = SelfCursor::new(Duration::from_millis(100));
        let vp = viewport();
        cursor.handle(PointerEvent::Move(Vec2::new(1.0, 2.0)), &vp, Instant::now());

        assert_eq!(cursor.position(), None);
        cursor.apply_pending();
        assert_eq!(cursor.position(), Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_apply_denormalizes_into_document_pixels() {
        let mut registry = CursorRegistry::new(SmootherConfig::default());
        let now = Instant::now();
        registry.apply(&[entry("a", Some([0.5, 0.5]))], &viewport(), now);

        let visible = registry.visible(now);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "a");
        assert_eq!(visible[0].document_position, Vec2::new(500.0, 1000.0));
    }

    #[test]
    fn test_self_id_skipped() {
        let mut registry = CursorRegistry::new(SmootherConfig::default());
        registry.set_self_id("me");
        registry.apply(
            &[entry("me", Some([0.1, 0.1])), entry("b", Some([0.2, 0.2]))],
            &viewport(),
            Instant::now(),
        );

        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_hidden_cursor_excluded_until_visible_again() {
        let mut registry = CursorRegistry::new(SmootherConfig::default());
        let t0 = Instant::now();
        let vp = viewport();

        registry.apply(&[entry("a", Some([0.5, 0.5]))], &vp, t0);
        registry.apply(&[entry("a", None)], &vp, t0 + Duration::from_millis(100));
        assert!(registry.visible(t0 + Duration::from_millis(150)).is_empty());
        assert_eq!(registry.len(), 1);

        registry.apply(
            &[entry("a", Some([0.25, 0.25]))],
            &vp,
            t0 + Duration::from_millis(200),
        );
        let visible = registry.visible(t0 + Duration::from_millis(200));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].document_position, Vec2::new(250.0, 500.0));
    }

    #[test]
    fn test_missing_cursors_removed() {
        let mut registry = CursorRegistry::new(SmootherConfig::default());
        let now = Instant::now();
        let vp = viewport();

        registry.apply(
            &[entry("a", Some([0.5, 0.5])), entry("b", None)],
            &vp,
            now,
        );
        assert_eq!(registry.len(), 2);

        registry.apply(&[entry("b", None)], &vp, now);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["b"]);

        registry.clear();
        assert!(registry.is_empty());
    }
}
