//! Seek/flee steering for the tethered character
//!
//! The character drifts toward the cursor when it is far away and backs off
//! when it gets too close. Thresholds are expressed in hundreds of canvas
//! pixels and scaled by the viewport's `scale_ratio`, so behaviour does not
//! depend on window size.
//!
//! ```text
//! distance > seek  × ratio:  v += dir × distance × dt × seek_gain
//! distance < repel × ratio:  v -= dir × (repel × ratio − distance) × dt
//!                            v.y -= drift × dt
//! always:                    v *= damping;  p += v;  p.z = depth
//! ```

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration for the character controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Distance (×100 px) beyond which the character seeks the cursor
    #[serde(default = "default_seek_threshold")]
    pub seek_threshold: f32,

    /// Velocity gain per unit of distance per second while seeking
    #[serde(default = "default_seek_gain")]
    pub seek_gain: f32,

    /// Distance (×100 px) below which the character is pushed away
    #[serde(default = "default_repel_threshold")]
    pub repel_threshold: f32,

    /// Downward velocity added per second while repelled
    #[serde(default = "default_drift")]
    pub drift: f32,

    /// Per-frame velocity retention (0.0-1.0)
    #[serde(default = "default_damping")]
    pub damping: f32,

    /// Fixed z of the character
    #[serde(default = "default_depth")]
    pub depth: f32,

    /// Offset added to the cursor position before steering
    #[serde(default = "default_cursor_offset")]
    pub cursor_offset: Vec3,
}

fn default_seek_threshold() -> f32 {
    1.5
}
fn default_seek_gain() -> f32 {
    0.06
}
fn default_repel_threshold() -> f32 {
    0.5
}
fn default_drift() -> f32 {
    0.05
}
fn default_damping() -> f32 {
    0.98
}
fn default_depth() -> f32 {
    -1.0
}
fn default_cursor_offset() -> Vec3 {
    Vec3::new(0.0, -0.1, 0.0)
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            seek_threshold: default_seek_threshold(),
            seek_gain: default_seek_gain(),
            repel_threshold: default_repel_threshold(),
            drift: default_drift(),
            damping: default_damping(),
            depth: default_depth(),
            cursor_offset: default_cursor_offset(),
        }
    }
}

/// Free-floating anchor with damped velocity
#[derive(Debug, Clone)]
pub struct CharacterController {
    config: CharacterConfig,
    position: Vec3,
    velocity: Vec3,
}

impl CharacterController {
    /// Create a resting character at `position` (z is pinned to the configured depth)
    pub fn new(config: CharacterConfig, position: Vec3) -> Self {
        let position = Vec3::new(position.x, position.y, config.depth);
        Self {
            config,
            position,
            velocity: Vec3::ZERO,
        }
    }

    /// Advance one frame toward or away from `cursor`
    pub fn update(&mut self, cursor: Vec3, dt: f32, scale_ratio: f32) {
        if !dt.is_finite() || dt < 0.0 || !cursor.is_finite() {
            return;
        }

        let target = cursor + self.config.cursor_offset;
        let delta = Vec2::new(target.x - self.position.x, target.y - self.position.y);
        let distance = delta.length();
        let direction = delta.normalize_or_zero().extend(0.0);

        let seek_radius = self.config.seek_threshold * scale_ratio;
        let repel_radius = self.config.repel_threshold * scale_ratio;

        if distance > seek_radius {
            self.velocity += direction * distance * dt * self.config.seek_gain;
        }
        if distance < repel_radius {
            self.velocity -= direction * (repel_radius - distance) * dt;
            self.velocity.y -= self.config.drift * dt;
        }

        self.velocity *= self.config.damping;
        self.position += self.velocity;
        self.position.z = self.config.depth;

        trace!(
            "Character at ({:.3}, {:.3}), distance={:.3}",
            self.position.x,
            self.position.y,
            distance
        );
    }

    /// Current position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity (world units per frame)
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Move without changing velocity
    pub fn teleport(&mut self, position: Vec3) {
        self.position = Vec3::new(position.x, position.y, self.config.depth);
    }

    /// Controller configuration
    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }
}
