//! Verlet Rope Solver
//!
//! Integrates a chain of [`RopePoint`]s and relaxes the distance constraints
//! between neighbours.
//!
//! # Tick
//!
//! ```text
//! update(dt)
//!   ├─> integrate every free point (damped Störmer–Verlet)
//!   │     pos += (pos - old) * (dt / prev_dt) * damping + accel * dt²
//!   ├─> repeat solver_iterations times:
//!   │     for every free point, pull toward prev/next by ¼ of the length error
//!   └─> prev_dt = dt
//! ```
//!
//! The chain lives in a `Vec`; the neighbours of point `i` are `i - 1` and
//! `i + 1`, so the first and last points are the only ones with a single
//! neighbour. Both are fixed and only moved through [`RopePhysics::set_endpoints`].

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::error::{Result, RopeError};
use super::point::{link_correction, RopePoint};

/// Rope construction and attachment parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RopeConfig {
    /// Initial rope length (world units)
    #[serde(default = "default_length")]
    pub length: f32,

    /// Spacing between generated points (world units)
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// Per-point mass bias
    #[serde(default = "default_mass")]
    pub mass: f32,

    /// Per-point velocity retention (0.0-1.0)
    #[serde(default = "default_damping")]
    pub damping: f32,

    /// Constraint relaxation passes per tick
    #[serde(default = "default_solver_iterations")]
    pub solver_iterations: u32,

    /// Constant acceleration applied to free points
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,

    /// Offset from the character to the first rope point
    #[serde(default = "default_start_offset")]
    pub start_offset: Vec3,

    /// Offset from the cursor to the last rope point
    #[serde(default = "default_end_offset")]
    pub end_offset: Vec3,
}

fn default_length() -> f32 {
    2.0
}
fn default_resolution() -> f32 {
    0.25
}
fn default_mass() -> f32 {
    0.88
}
fn default_damping() -> f32 {
    0.95
}
fn default_solver_iterations() -> u32 {
    500
}
fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -5.0, -1.0)
}
fn default_start_offset() -> Vec3 {
    Vec3::new(0.0, 0.0, -0.25)
}
fn default_end_offset() -> Vec3 {
    Vec3::new(0.0, -0.1, 0.0)
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            resolution: default_resolution(),
            mass: default_mass(),
            damping: default_damping(),
            solver_iterations: default_solver_iterations(),
            gravity: default_gravity(),
            start_offset: default_start_offset(),
            end_offset: default_end_offset(),
        }
    }
}

/// Verlet rope: an ordered chain of points with pinned endpoints
#[derive(Debug, Clone)]
pub struct RopePhysics {
    points: Vec<RopePoint>,
    prev_dt: f32,
    solver_iterations: u32,
    gravity: Vec3,
}

impl RopePhysics {
    /// Generate points spaced `resolution` apart on the segment `start → end`
    ///
    /// The segment is split into `ceil(distance / resolution)` links, giving
    /// one more point than links. Every point gets `resolution` as its rest
    /// length; the first and last point are fixed.
    pub fn generate(
        start: Vec3,
        end: Vec3,
        resolution: f32,
        mass: f32,
        damping: f32,
    ) -> Result<Vec<RopePoint>> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(RopeError::InvalidResolution(resolution));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(RopeError::NonFiniteParameter("endpoint"));
        }
        if !mass.is_finite() {
            return Err(RopeError::NonFiniteParameter("mass"));
        }
        if !damping.is_finite() {
            return Err(RopeError::NonFiniteParameter("damping"));
        }

        let len = start.distance(end);
        if len <= f32::EPSILON {
            return Err(RopeError::DegenerateEndpoints(len));
        }

        let segments = (len / resolution).ceil() as usize;
        let mut points: Vec<RopePoint> = (0..=segments)
            .map(|i| {
                let percentage = i as f32 / segments as f32;
                let mut point = RopePoint::new(start.lerp(end, percentage), resolution);
                point.mass = mass;
                point.damping = damping;
                point
            })
            .collect();

        if let Some(first) = points.first_mut() {
            first.is_fixed = true;
        }
        if let Some(last) = points.last_mut() {
            last.is_fixed = true;
        }

        debug!(
            "Generated rope: {} points, length={:.3}, resolution={}",
            points.len(),
            len,
            resolution
        );

        Ok(points)
    }

    /// Wrap a generated chain
    pub fn new(points: Vec<RopePoint>, solver_iterations: u32, gravity: Vec3) -> Result<Self> {
        if points.len() < 2 {
            return Err(RopeError::TooFewPoints(points.len()));
        }
        if solver_iterations == 0 {
            return Err(RopeError::ZeroIterations);
        }
        if !gravity.is_finite() {
            return Err(RopeError::NonFiniteParameter("gravity"));
        }

        let mut points = points;
        let last = points.len() - 1;
        points[0].is_fixed = true;
        points[last].is_fixed = true;

        Ok(Self {
            points,
            prev_dt: 0.0,
            solver_iterations,
            gravity,
        })
    }

    /// Build a hanging rope from configuration
    ///
    /// The rope starts at the origin and hangs `length` straight down.
    pub fn from_config(config: &RopeConfig) -> Result<Self> {
        let points = Self::generate(
            Vec3::ZERO,
            Vec3::new(0.0, -config.length, 0.0),
            config.resolution,
            config.mass,
            config.damping,
        )?;
        Self::new(points, config.solver_iterations, config.gravity)
    }

    /// Point at `index`
    pub fn point(&self, index: usize) -> Option<&RopePoint> {
        self.points.get(index)
    }

    /// First (fixed) point
    pub fn first_point(&self) -> &RopePoint {
        &self.points[0]
    }

    /// Last (fixed) point
    pub fn last_point(&self) -> &RopePoint {
        &self.points[self.points.len() - 1]
    }

    /// All points, first to last
    pub fn points(&self) -> &[RopePoint] {
        &self.points
    }

    /// Point positions, first to last
    pub fn positions(&self) -> Vec<Vec3> {
        self.points.iter().map(|p| p.pos).collect()
    }

    /// Number of points (always ≥ 2)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for the `len`/`is_empty` pair
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Gravity vector
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Change gravity for subsequent ticks
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// Constraint relaxation passes per tick
    pub fn solver_iterations(&self) -> u32 {
        self.solver_iterations
    }

    /// Delta time of the last applied tick (0 before the first one)
    pub fn previous_delta_time(&self) -> f32 {
        self.prev_dt
    }

    /// Reposition both fixed endpoints
    ///
    /// Called by the owner before each [`update`](Self::update).
    pub fn set_endpoints(&mut self, start: Vec3, end: Vec3) {
        let last = self.points.len() - 1;
        self.points[0].teleport(start);
        self.points[last].teleport(end);
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// A zero, negative or non-finite `dt` leaves the rope untouched,
    /// including the stored previous delta time.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            trace!("Rope update skipped: dt={}", dt);
            return;
        }

        let time_correction = if self.prev_dt != 0.0 {
            dt / self.prev_dt
        } else {
            0.0
        };

        for point in self.points.iter_mut().filter(|p| !p.is_fixed) {
            point.integrate(self.gravity, dt, time_correction);
        }

        for _ in 0..self.solver_iterations {
            self.relax();
        }

        self.prev_dt = dt;

        trace!(
            "Rope update: dt={:.4}, correction={:.3}, mid={:?}",
            dt,
            time_correction,
            self.points[self.points.len() / 2].pos
        );
    }

    /// One relaxation pass over every free point
    fn relax(&mut self) {
        let count = self.points.len();

        for i in 0..count {
            if self.points[i].is_fixed {
                continue;
            }
            let rest = self.points[i].distance_to_next_point;

            if i + 1 < count {
                self.relax_link(i, i + 1, rest);
            }
            if i > 0 {
                self.relax_link(i, i - 1, rest);
            }
        }
    }

    fn relax_link(&mut self, i: usize, neighbor: usize, rest: f32) {
        let correction = link_correction(self.points[i].pos, self.points[neighbor].pos, rest);

        self.points[i].pos += correction;
        if !self.points[neighbor].is_fixed {
            self.points[neighbor].pos -= correction;
        }
    }
}
