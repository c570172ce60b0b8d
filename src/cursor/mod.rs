//! Cursor presence
//!
//! Local pointer handling, outbound throttling and smoothing of remote
//! cursors received from the relay.
//!
//! # Architecture
//!
//! ```text
//! Pointer events
//!   └─> SelfCursor
//!       ├─> pending sample   (applied at frame time)
//!       └─> Throttle         (≤ 1 update per interval, trailing edge kept)
//!
//! Relay "cursors" table
//!   └─> CursorRegistry::apply()
//!       └─> CursorSmoother per remote id
//!           └─> visible(now)  (interpolated document pixels)
//! ```
//!
//! Remote samples arrive at roughly 10 Hz; the smoother interpolates
//! between them so rendered cursors move continuously at frame rate.

mod registry;
mod smoother;
mod throttle;

pub use registry::{heading, CursorRegistry, PointerEvent, RemoteCursor, SelfCursor};
pub use smoother::{CursorSmoother, SmoothedPosition, SmootherConfig};
pub use throttle::{Throttle, DEFAULT_THROTTLE_MS};

/// Depth of the local cursor in world space
pub const SELF_CURSOR_DEPTH: f32 = 0.0;

/// Depth of remote cursors, behind the local one
pub const REMOTE_CURSOR_DEPTH: f32 = -0.1;
