//! Viewport Error Types

use thiserror::Error;

/// Result type for viewport operations
pub type Result<T> = std::result::Result<T, ViewportError>;

/// Viewport error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    /// Canvas size in pixels is zero, negative or not finite
    #[error("Invalid canvas size: {0}x{1}")]
    InvalidCanvasSize(f32, f32),

    /// Visible world extent is zero, negative or not finite
    #[error("Invalid world extent: {0}x{1}")]
    InvalidWorldExtent(f32, f32),

    /// Document height is zero, negative or not finite
    #[error("Invalid document height: {0}")]
    InvalidDocumentHeight(f32),

    /// Scroll offset is not finite
    #[error("Invalid scroll offset: {0}")]
    InvalidScroll(f32),

    /// Camera parameters cannot produce a visible extent
    #[error("Invalid camera: distance={0}, fov={1}")]
    InvalidCamera(f32, f32),
}
