//! # cursor-tether
//!
//! Shared cursor presence with rope-tethered characters.
//!
//! Every connected client shows its own pointer plus the pointers of all
//! other clients. A small character follows the local cursor on a
//! Verlet-simulated rope. Positions travel through a thin WebSocket relay as
//! normalized `[x, y]` pairs.
//!
//! # Architecture
//!
//! ```text
//! cursor-tether
//!   ├─> viewport   (canvas px <-> world units, observable metrics)
//!   ├─> cursor     (self cursor, remote registry, smoother, throttle)
//!   ├─> rope       (Verlet solver + curve sampler)
//!   ├─> character  (seek/repel controller, tether = character + rope)
//!   ├─> scene      (per-frame orchestration, render snapshots)
//!   ├─> protocol   (JSON wire messages)
//!   ├─> client     (reconnecting WebSocket channel)
//!   └─> server     (relay: ids, cursor table, periodic fan-out)
//! ```
//!
//! # Data Flow
//!
//! **Outbound:** pointer → `Scene::handle_pointer` → throttle → `CursorChannel` → relay
//!
//! **Inbound:** relay → `CursorChannel` → `Scene::handle_server_message` → smoother → frame
//!
//! **Frame:** `Scene::frame` → controller → `RopePhysics::update` → `RopeCurve` samples

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Tethered character controller
pub mod character;

/// Relay client channel
pub mod client;

/// Configuration
pub mod config;

/// Cursor state, smoothing and throttling
pub mod cursor;

/// Wire protocol
pub mod protocol;

/// Verlet rope simulation
pub mod rope;

/// Frame-driven scene
pub mod scene;

/// Relay server
pub mod server;

/// Utility functions
pub mod utils;

/// Viewport and coordinate mapping
pub mod viewport;
