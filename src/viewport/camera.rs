//! Camera scale keeping
//!
//! Adjusts the vertical field of view with the canvas height so objects keep
//! the same on-screen size regardless of window size, with a breakpoint for
//! narrow screens.

use glam::Vec2;

/// Default vertical field of view (degrees) at the ideal height
pub const DEFAULT_IDEAL_FOV: f32 = 20.0;

/// Canvas width at which the wide-screen ideal height applies
pub const WIDE_BREAKPOINT: f32 = 768.0;

/// Canvas height (pixels) at which the ideal field of view is used
pub fn ideal_height(width: f32) -> f32 {
    if width >= WIDE_BREAKPOINT {
        800.0
    } else {
        400.0
    }
}

/// Vertical field of view (degrees) that keeps object scale constant
pub fn keep_scale_fov(width: f32, height: f32, ideal_fov: f32) -> f32 {
    let tan_fov = (ideal_fov.to_radians() / 2.0).tan();
    (360.0 / std::f32::consts::PI) * (tan_fov * (height / ideal_height(width))).atan()
}

/// World-space width and height visible at `distance` from a perspective camera
pub fn visible_extent(fov: f32, aspect: f32, distance: f32) -> Vec2 {
    let height = 2.0 * (fov.to_radians() / 2.0).tan() * distance;
    Vec2::new(height * aspect, height)
}
