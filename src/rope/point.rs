//! Rope point state and the two per-point solver steps.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Fraction of the distance error corrected per relaxation step.
pub const RELAXATION_FACTOR: f32 = 0.25;

/// A single mass point in a rope chain
///
/// Velocity is never stored; it is implied by `pos - old_pos`
/// (Störmer–Verlet).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RopePoint {
    /// Current position
    pub pos: Vec3,

    /// Position at the previous tick
    pub old_pos: Vec3,

    /// Rest length of the links to this point's neighbours
    pub distance_to_next_point: f32,

    /// Mass bias added to every acceleration axis
    pub mass: f32,

    /// Velocity retention per tick (1.0 = none lost)
    pub damping: f32,

    /// Fixed points are positioned externally and skipped by the solver
    pub is_fixed: bool,
}

impl RopePoint {
    /// Create a resting, free point
    pub fn new(pos: Vec3, distance_to_next_point: f32) -> Self {
        Self {
            pos,
            old_pos: pos,
            distance_to_next_point,
            mass: 1.0,
            damping: 1.0,
            is_fixed: false,
        }
    }

    /// Implicit velocity from position history
    pub fn velocity(&self) -> Vec3 {
        self.pos - self.old_pos
    }

    /// Place the point without introducing velocity
    pub fn teleport(&mut self, pos: Vec3) {
        self.pos = pos;
        self.old_pos = pos;
    }

    /// Damped Verlet step, ignoring neighbours
    ///
    /// `time_correction` is `dt / previous_dt` (0 on the first tick).
    pub(crate) fn integrate(&mut self, gravity: Vec3, dt: f32, time_correction: f32) {
        let velocity = self.velocity();
        self.old_pos = self.pos;

        let accel = gravity + Vec3::splat(self.mass);
        let vel_coef = time_correction * self.damping;
        let accel_coef = dt * dt;

        self.pos += velocity * vel_coef + accel * accel_coef;
    }
}

/// Correction that moves `point` toward satisfying the rest length to `neighbor`
///
/// Apply `+correction` to the point and `-correction` to the neighbour.
pub(crate) fn link_correction(point: Vec3, neighbor: Vec3, rest: f32) -> Vec3 {
    let delta = neighbor - point;
    let diff = delta.length() - rest;
    delta.normalize_or_zero() * (diff * RELAXATION_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_point_is_at_rest() {
        let point = RopePoint::new(Vec3::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(point.velocity(), Vec3::ZERO);
        assert!(!point.is_fixed);
        assert_eq!(point.mass, 1.0);
    }

    #[test]
    fn test_integrate_first_tick_ignores_velocity() {
        let mut point = RopePoint::new(Vec3::ZERO, 0.25);
        point.mass = 0.0;
        point.old_pos = Vec3::new(-1.0, 0.0, 0.0);

        // time_correction = 0 on the first tick
        point.integrate(Vec3::new(0.0, -10.0, 0.0), 0.1, 0.0);

        assert!((point.pos.x).abs() < 1e-6);
        assert!((point.pos.y + 0.1).abs() < 1e-6);
        assert_eq!(point.old_pos, Vec3::ZERO);
    }

    #[test]
    fn test_integrate_carries_damped_velocity() {
        let mut point = RopePoint::new(Vec3::new(1.0, 0.0, 0.0), 0.25);
        point.mass = 0.0;
        point.damping = 0.5;
        point.old_pos = Vec3::ZERO;

        point.integrate(Vec3::ZERO, 0.016, 1.0);

        assert!((point.pos.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_mass_bias_applies_to_every_axis() {
        let mut point = RopePoint::new(Vec3::ZERO, 0.25);
        point.mass = 2.0;

        point.integrate(Vec3::ZERO, 1.0, 0.0);

        assert_eq!(point.pos, Vec3::splat(2.0));
    }

    #[test]
    fn test_link_correction_stretched() {
        let correction = link_correction(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert!((correction.x - 0.25).abs() < 1e-6);
        assert_eq!(correction.y, 0.0);
    }

    #[test]
    fn test_link_correction_compressed_pushes_apart() {
        let correction = link_correction(Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0), 1.0);
        assert!(correction.x < 0.0);
    }

    #[test]
    fn test_link_correction_coincident_points() {
        let correction = link_correction(Vec3::ONE, Vec3::ONE, 1.0);
        assert_eq!(correction, Vec3::ZERO);
    }
}
