//! Parametric curve over a rope chain
//!
//! Maps `t ∈ [0, 1]` onto the polyline through the rope points so a tube
//! renderer can sample the chain like any other curve.

use glam::Vec3;

use super::physics::RopePhysics;

/// Piecewise-linear curve through the current rope points
#[derive(Debug, Clone, Copy)]
pub struct RopeCurve<'a> {
    rope: &'a RopePhysics,
}

impl<'a> RopeCurve<'a> {
    /// Borrow a rope for sampling
    pub fn new(rope: &'a RopePhysics) -> Self {
        Self { rope }
    }

    /// Position at normalized parameter `t` (clamped to `[0, 1]`)
    pub fn point_at(&self, t: f32) -> Vec3 {
        let points = self.rope.points();
        let last = points.len() - 1;

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let index = t * last as f32;
        let base = index.floor() as usize;

        if base >= last {
            return points[last].pos;
        }

        let frac = index - base as f32;
        points[base].pos.lerp(points[base + 1].pos, frac)
    }

    /// Unit direction of the segment containing `t`
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let points = self.rope.points();
        let last = points.len() - 1;

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let base = ((t * last as f32).floor() as usize).min(last - 1);

        (points[base + 1].pos - points[base].pos).normalize_or_zero()
    }

    /// `divisions + 1` samples at uniform `t`, both ends included
    pub fn spaced_points(&self, divisions: usize) -> Vec<Vec3> {
        if divisions == 0 {
            return vec![self.point_at(0.0)];
        }
        (0..=divisions)
            .map(|i| self.point_at(i as f32 / divisions as f32))
            .collect()
    }

    /// One sample per simulated point, for tube cross-sections
    pub fn tube_samples(&self) -> Vec<Vec3> {
        let count = self.rope.len();
        (0..count)
            .map(|i| self.point_at(i as f32 / (count - 1) as f32))
            .collect()
    }

    /// Total polyline length
    pub fn length(&self) -> f32 {
        self.rope
            .points()
            .windows(2)
            .map(|pair| pair[0].pos.distance(pair[1].pos))
            .sum()
    }
}
