//! Verlet rope simulation
//!
//! A rope is a chain of points integrated with a damped Störmer–Verlet step
//! and held together by iterative distance-constraint relaxation. The solver
//! aims for visual stability under variable frame timing, not physical
//! accuracy.
//!
//! # Architecture
//!
//! ```text
//! RopeConfig
//!   └─> RopePhysics::generate()  (lerped points, pinned endpoints)
//!       └─> RopePhysics
//!           ├─> set_endpoints()   (owner positions both ends)
//!           ├─> update(dt)        (integrate + relax)
//!           └─> RopeCurve         (t ∈ [0,1] → position, tube samples)
//! ```
//!
//! Construction validates every precondition and returns [`RopeError`];
//! [`RopePhysics::update`] cannot fail.

mod curve;
mod error;
mod physics;
mod point;

pub use curve::RopeCurve;
pub use error::{Result, RopeError};
pub use physics::{RopeConfig, RopePhysics};
pub use point::{RopePoint, RELAXATION_FACTOR};
