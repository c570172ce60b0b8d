//! Frame-driven presence scene
//!
//! Ties the viewport, cursors and tethers together. Input handlers and the
//! network channel only enqueue samples; all simulation happens in
//! [`Scene::frame`], which the host calls once per displayed frame.
//!
//! # Frame
//!
//! ```text
//! frame(now, dt)
//!   ├─> SelfCursor::apply_pending()        canvas px ─> world (z = 0)
//!   ├─> CursorRegistry::visible(now)       document px ─> world (z = -0.1)
//!   ├─> Tether::step() per tethered cursor
//!   └─> FrameSnapshot                      cursors + tube samples
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::character::{CharacterConfig, Tether};
use crate::cursor::{
    heading, CursorRegistry, PointerEvent, SelfCursor, SmootherConfig, REMOTE_CURSOR_DEPTH,
    SELF_CURSOR_DEPTH,
};
use crate::protocol::{CursorUpdate, ServerMessage};
use crate::rope::{self, RopeConfig};
use crate::viewport::{self, CoordinateMapper, Subscription, Viewport, ViewportTracker};

/// Label used for the local cursor before the relay assigned an id
pub const SELF_LABEL: &str = "self";

/// Scene behaviour options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Attach a tether to every remote cursor, not only the local one
    #[serde(default)]
    pub tether_remote: bool,

    /// Minimum interval between outbound cursor updates (ms)
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
}

fn default_send_interval_ms() -> u64 {
    crate::cursor::DEFAULT_THROTTLE_MS
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tether_remote: false,
            send_interval_ms: default_send_interval_ms(),
        }
    }
}

/// Cursor state at a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorSnapshot {
    /// Connection id ([`SELF_LABEL`] for the local cursor before init)
    pub id: String,
    /// Whether this is the local cursor
    pub is_self: bool,
    /// World position
    pub position: Vec3,
    /// Yaw in radians
    pub heading: f32,
}

/// Tether state at a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TetherSnapshot {
    /// Id of the cursor the tether is attached to
    pub cursor_id: String,
    /// Character world position
    pub character: Vec3,
    /// One sample per rope point, for tube geometry
    pub rope: Vec<Vec3>,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Visible cursors, local first
    pub cursors: Vec<CursorSnapshot>,
    /// Tethers of visible cursors
    pub tethers: Vec<TetherSnapshot>,
}

/// Presence scene for one client
pub struct Scene {
    config: SceneConfig,
    rope_config: RopeConfig,
    character_config: CharacterConfig,

    tracker: ViewportTracker,
    mapper: CoordinateMapper,

    /// `scale_ratio` of the latest viewport, as f32 bits
    scale_ratio: Arc<AtomicU32>,
    _viewport_subscription: Subscription,

    self_cursor: SelfCursor,
    registry: CursorRegistry,

    self_tether: Tether,
    remote_tethers: BTreeMap<String, Tether>,

    connected: bool,
}

impl Scene {
    /// Create a scene for `viewport`
    ///
    /// Fails when the rope configuration cannot produce a valid rope.
    pub fn new(
        config: SceneConfig,
        rope_config: RopeConfig,
        character_config: CharacterConfig,
        smoother_config: SmootherConfig,
        viewport: Viewport,
    ) -> rope::Result<Self> {
        let self_tether = Tether::new(&rope_config, character_config.clone(), Vec3::ZERO)?;
        let tracker = ViewportTracker::new(viewport);
        let mapper = CoordinateMapper::new(tracker.clone());

        let scale_ratio = Arc::new(AtomicU32::new(viewport.scale_ratio().to_bits()));
        let cached = scale_ratio.clone();
        let viewport_subscription = tracker.subscribe(move |viewport| {
            let ratio = viewport.scale_ratio();
            cached.store(ratio.to_bits(), Ordering::Relaxed);
            debug!(
                "Viewport {}x{} px (scroll {}), scale ratio {:.3}",
                viewport.canvas_width, viewport.canvas_height, viewport.scroll_y, ratio
            );
        });

        info!(
            "Scene created: {}x{} px, tether_remote={}",
            viewport.canvas_width, viewport.canvas_height, config.tether_remote
        );

        Ok(Self {
            self_cursor: SelfCursor::new(Duration::from_millis(config.send_interval_ms)),
            registry: CursorRegistry::new(smoother_config),
            config,
            rope_config,
            character_config,
            tracker,
            mapper,
            scale_ratio,
            _viewport_subscription: viewport_subscription,
            self_tether,
            remote_tethers: BTreeMap::new(),
            connected: false,
        })
    }

    /// Viewport subject; hosts push resizes and scrolls here
    pub fn tracker(&self) -> &ViewportTracker {
        &self.tracker
    }

    /// Replace the viewport
    pub fn resize(&self, viewport: Viewport) -> viewport::Result<()> {
        self.tracker.update(viewport)
    }

    /// Record local pointer input; returns an update to send now, if any
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) -> Option<CursorUpdate> {
        let viewport = self.mapper.viewport();
        self.self_cursor.handle(event, &viewport, now)
    }

    /// Trailing outbound update whose throttle interval has elapsed
    pub fn poll_outbound(&mut self, now: Instant) -> Option<CursorUpdate> {
        self.self_cursor.poll_outbound(now)
    }

    /// Apply a relay message received at `now`
    pub fn handle_server_message(&mut self, message: ServerMessage, now: Instant) {
        match message {
            ServerMessage::Init { id } => {
                info!("Assigned cursor id {}", id);
                self.connected = true;
                self.remote_tethers.remove(&id);
                self.registry.set_self_id(id);
            }
            ServerMessage::Cursors { cursors } => {
                let viewport = self.mapper.viewport();
                self.registry.apply(&cursors, &viewport, now);
            }
        }
    }

    /// Note that the connection dropped
    ///
    /// Remote cursors keep their last known positions until the next table
    /// after reconnecting hides or removes them.
    pub fn handle_disconnect(&mut self) {
        if self.connected {
            info!(
                "Disconnected, keeping {} remote cursors",
                self.registry.len()
            );
        }
        self.connected = false;
    }

    /// Whether an init message arrived since the last disconnect
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Id assigned by the relay
    pub fn self_id(&self) -> Option<&str> {
        self.registry.self_id()
    }

    /// Number of known remote cursors
    pub fn remote_count(&self) -> usize {
        self.registry.len()
    }

    /// World units per hundred canvas pixels for the current viewport
    pub fn scale_ratio(&self) -> f32 {
        f32::from_bits(self.scale_ratio.load(Ordering::Relaxed))
    }

    /// Advance one frame
    pub fn frame(&mut self, now: Instant, dt: f32) -> FrameSnapshot {
        let viewport = self.mapper.viewport();
        let scale_ratio = self.scale_ratio();
        let mut snapshot = FrameSnapshot::default();

        let self_id = self.registry.self_id().unwrap_or(SELF_LABEL).to_string();
        let self_world = self.self_cursor.apply_pending().map(|px| {
            let world = self.mapper.to_world(px);
            Vec3::new(world.x, world.y, SELF_CURSOR_DEPTH)
        });

        self.self_tether.step(self_world, dt, scale_ratio);
        if let Some(position) = self_world {
            snapshot.cursors.push(CursorSnapshot {
                id: self_id.clone(),
                is_self: true,
                position,
                heading: heading(position.x, viewport.world_width),
            });
            snapshot.tethers.push(snapshot_tether(self_id, &self.self_tether));
        }

        let remotes = self.registry.visible(now);

        if self.config.tether_remote {
            let registry = &self.registry;
            self.remote_tethers
                .retain(|id, _| registry.ids().any(|known| known == id.as_str()));
        }

        for remote in remotes {
            let world = self.mapper.document_to_world(remote.document_position);
            let position = Vec3::new(world.x, world.y, REMOTE_CURSOR_DEPTH);

            snapshot.cursors.push(CursorSnapshot {
                id: remote.id.clone(),
                is_self: false,
                position,
                heading: heading(position.x, viewport.world_width),
            });

            if !self.config.tether_remote {
                continue;
            }
            let Some(tether) = self.remote_tether(&remote.id, position) else {
                continue;
            };
            tether.step(Some(position), dt, scale_ratio);
            snapshot.tethers.push(snapshot_tether(remote.id, tether));
        }

        snapshot
    }

    fn remote_tether(&mut self, id: &str, spawn: Vec3) -> Option<&mut Tether> {
        if !self.remote_tethers.contains_key(id) {
            match Tether::new(&self.rope_config, self.character_config.clone(), spawn) {
                Ok(tether) => {
                    debug!("Tether attached to remote cursor {}", id);
                    self.remote_tethers.insert(id.to_string(), tether);
                }
                Err(e) => {
                    warn!("Failed to create tether for {}: {}", id, e);
                    return None;
                }
            }
        }
        self.remote_tethers.get_mut(id)
    }
}

fn snapshot_tether(cursor_id: String, tether: &Tether) -> TetherSnapshot {
    TetherSnapshot {
        cursor_id,
        character: tether.character().position(),
        rope: tether.curve().tube_samples(),
    }
}
