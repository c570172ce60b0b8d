//! Character + rope pair attached to a cursor

use glam::Vec3;
use tracing::debug;

use super::controller::{CharacterConfig, CharacterController};
use crate::rope::{self, RopeConfig, RopeCurve, RopePhysics};

/// A character tethered to a cursor by a rope
///
/// Each [`step`](Tether::step) moves the character, pins the rope ends to
/// the character and the cursor, then advances the rope.
#[derive(Debug, Clone)]
pub struct Tether {
    character: CharacterController,
    rope: RopePhysics,
    start_offset: Vec3,
    end_offset: Vec3,
}

impl Tether {
    /// Create a tether with the character resting at `spawn`
    ///
    /// The rope initially hangs straight down from the character.
    pub fn new(
        rope_config: &RopeConfig,
        character_config: CharacterConfig,
        spawn: Vec3,
    ) -> rope::Result<Self> {
        let character = CharacterController::new(character_config, spawn);
        let start = character.position() + rope_config.start_offset;
        let points = RopePhysics::generate(
            start,
            start - Vec3::new(0.0, rope_config.length, 0.0),
            rope_config.resolution,
            rope_config.mass,
            rope_config.damping,
        )?;
        let rope = RopePhysics::new(points, rope_config.solver_iterations, rope_config.gravity)?;

        debug!("Tether created with {} rope points", rope.len());

        Ok(Self {
            character,
            rope,
            start_offset: rope_config.start_offset,
            end_offset: rope_config.end_offset,
        })
    }

    /// Advance one frame; no-op while the cursor is absent
    pub fn step(&mut self, cursor: Option<Vec3>, dt: f32, scale_ratio: f32) {
        let Some(cursor) = cursor else {
            return;
        };
        if !cursor.is_finite() {
            return;
        }

        self.character.update(cursor, dt, scale_ratio);
        self.rope.set_endpoints(
            self.character.position() + self.start_offset,
            cursor + self.end_offset,
        );
        self.rope.update(dt);
    }

    /// Character state
    pub fn character(&self) -> &CharacterController {
        &self.character
    }

    /// Rope state
    pub fn rope(&self) -> &RopePhysics {
        &self.rope
    }

    /// Curve view of the rope for tube rendering
    pub fn curve(&self) -> RopeCurve<'_> {
        RopeCurve::new(&self.rope)
    }
}
