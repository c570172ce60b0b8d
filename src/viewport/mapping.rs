//! Coordinate Transformation
//!
//! Converts between canvas pixel coordinates (origin top-left, y down),
//! document pixel coordinates (canvas + scroll) and world coordinates
//! (origin at the canvas centre, y up).
//!
//! ```text
//! world_x = px_x * (world_width / canvas_width) - world_width / 2
//! world_y = world_height - px_y * (world_height / canvas_height) - world_height / 2
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::camera;
use super::error::{Result, ViewportError};
use super::tracker::ViewportTracker;

/// Current viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Canvas width (pixels)
    pub canvas_width: f32,
    /// Canvas height (pixels)
    pub canvas_height: f32,

    /// Visible world width at the cursor plane
    pub world_width: f32,
    /// Visible world height at the cursor plane
    pub world_height: f32,

    /// Full scrollable document height (pixels)
    pub document_height: f32,
    /// Current vertical scroll offset (pixels)
    pub scroll_y: f32,
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl Viewport {
    /// Viewport whose document is exactly the canvas (no scrolling)
    pub fn new(
        canvas_width: f32,
        canvas_height: f32,
        world_width: f32,
        world_height: f32,
    ) -> Result<Self> {
        let viewport = Self {
            canvas_width,
            canvas_height,
            world_width,
            world_height,
            document_height: canvas_height,
            scroll_y: 0.0,
        };
        viewport.validate()?;
        Ok(viewport)
    }

    /// Viewport for a perspective camera looking at the cursor plane
    ///
    /// The field of view follows [`camera::keep_scale_fov`].
    pub fn from_camera(
        canvas_width: f32,
        canvas_height: f32,
        camera_distance: f32,
        ideal_fov: f32,
    ) -> Result<Self> {
        if !positive(canvas_width) || !positive(canvas_height) {
            return Err(ViewportError::InvalidCanvasSize(canvas_width, canvas_height));
        }
        if !positive(camera_distance) || !positive(ideal_fov) || ideal_fov >= 180.0 {
            return Err(ViewportError::InvalidCamera(camera_distance, ideal_fov));
        }

        let fov = camera::keep_scale_fov(canvas_width, canvas_height, ideal_fov);
        let extent = camera::visible_extent(fov, canvas_width / canvas_height, camera_distance);
        Self::new(canvas_width, canvas_height, extent.x, extent.y)
    }

    /// Same viewport with document height and scroll offset
    pub fn with_document(mut self, document_height: f32, scroll_y: f32) -> Result<Self> {
        self.document_height = document_height;
        self.scroll_y = scroll_y;
        self.validate()?;
        Ok(self)
    }

    /// Check every dimension
    pub fn validate(&self) -> Result<()> {
        if !positive(self.canvas_width) || !positive(self.canvas_height) {
            return Err(ViewportError::InvalidCanvasSize(
                self.canvas_width,
                self.canvas_height,
            ));
        }
        if !positive(self.world_width) || !positive(self.world_height) {
            return Err(ViewportError::InvalidWorldExtent(
                self.world_width,
                self.world_height,
            ));
        }
        if !positive(self.document_height) {
            return Err(ViewportError::InvalidDocumentHeight(self.document_height));
        }
        if !self.scroll_y.is_finite() {
            return Err(ViewportError::InvalidScroll(self.scroll_y));
        }
        Ok(())
    }

    /// Canvas pixel x → world x
    pub fn world_x(&self, x: f32) -> f32 {
        x * (self.world_width / self.canvas_width) - self.world_width * 0.5
    }

    /// Canvas pixel y → world y
    pub fn world_y(&self, y: f32) -> f32 {
        self.world_height - y * (self.world_height / self.canvas_height) - self.world_height * 0.5
    }

    /// World x → canvas pixel x
    pub fn pixel_x(&self, world_x: f32) -> f32 {
        (world_x + self.world_width * 0.5) * (self.canvas_width / self.world_width)
    }

    /// World y → canvas pixel y
    pub fn pixel_y(&self, world_y: f32) -> f32 {
        (self.world_height * 0.5 - world_y) * (self.canvas_height / self.world_height)
    }

    /// Canvas pixels → world
    pub fn to_world(&self, px: Vec2) -> Vec2 {
        Vec2::new(self.world_x(px.x), self.world_y(px.y))
    }

    /// World → canvas pixels
    pub fn to_pixel(&self, world: Vec2) -> Vec2 {
        Vec2::new(self.pixel_x(world.x), self.pixel_y(world.y))
    }

    /// Canvas pixels → wire coordinates `[x / canvas_width, (y + scroll) / document_height]`
    pub fn normalize(&self, px: Vec2) -> [f32; 2] {
        [
            px.x / self.canvas_width,
            (px.y + self.scroll_y) / self.document_height,
        ]
    }

    /// Wire coordinates → document pixels
    pub fn denormalize(&self, xy: [f32; 2]) -> Vec2 {
        Vec2::new(xy[0] * self.canvas_width, xy[1] * self.document_height)
    }

    /// Document pixels → canvas pixels at the current scroll offset
    pub fn document_to_canvas(&self, doc: Vec2) -> Vec2 {
        Vec2::new(doc.x, doc.y - self.scroll_y)
    }

    /// World units per 100 canvas pixels
    ///
    /// Used to keep distance thresholds resolution independent.
    pub fn scale_ratio(&self) -> f32 {
        (self.world_height / self.canvas_height) * 100.0
    }
}

/// Coordinate mapper bound to a [`ViewportTracker`]
///
/// Every call reads the tracker's latest viewport, so resizes are picked up
/// without re-subscribing.
#[derive(Clone)]
pub struct CoordinateMapper {
    tracker: ViewportTracker,
}

impl CoordinateMapper {
    /// Create a mapper reading from `tracker`
    pub fn new(tracker: ViewportTracker) -> Self {
        Self { tracker }
    }

    /// Latest viewport
    pub fn viewport(&self) -> Viewport {
        self.tracker.current()
    }

    /// Canvas pixel x → world x
    pub fn world_x(&self, x: f32) -> f32 {
        self.viewport().world_x(x)
    }

    /// Canvas pixel y → world y
    pub fn world_y(&self, y: f32) -> f32 {
        self.viewport().world_y(y)
    }

    /// Canvas pixels → world
    pub fn to_world(&self, px: Vec2) -> Vec2 {
        self.viewport().to_world(px)
    }

    /// World → canvas pixels
    pub fn to_pixel(&self, world: Vec2) -> Vec2 {
        self.viewport().to_pixel(world)
    }

    /// Document pixels → world, through the current scroll offset
    pub fn document_to_world(&self, doc: Vec2) -> Vec2 {
        let viewport = self.viewport();
        viewport.to_world(viewport.document_to_canvas(doc))
    }

    /// Canvas pixels → wire coordinates
    pub fn normalize(&self, px: Vec2) -> [f32; 2] {
        self.viewport().normalize(px)
    }

    /// Wire coordinates → document pixels
    pub fn denormalize(&self, xy: [f32; 2]) -> Vec2 {
        self.viewport().denormalize(xy)
    }

    /// World units per 100 canvas pixels
    pub fn scale_ratio(&self) -> f32 {
        self.viewport().scale_ratio()
    }
}
