//! Viewport and coordinate mapping
//!
//! Tracks canvas, world and document dimensions and converts between pixel,
//! normalized wire and world coordinates.
//!
//! # Architecture
//!
//! ```text
//! host resize / scroll
//!   └─> ViewportTracker::update()
//!       ├─> Subscription callbacks
//!       └─> CoordinateMapper (re-reads on every call)
//!           ├─> to_world / to_pixel
//!           ├─> normalize / denormalize   (wire coordinates)
//!           └─> scale_ratio               (resolution-independent thresholds)
//! ```

pub mod camera;
mod error;
mod mapping;
mod tracker;

pub use error::{Result, ViewportError};
pub use mapping::{CoordinateMapper, Viewport};
pub use tracker::{Subscription, ViewportTracker};
