//! Renderer error types.

use sketchbook_core::SketchbookError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering thumbnails.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The generated SVG could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Pixmap allocation failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Image encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<RenderError> for SketchbookError {
    fn from(err: RenderError) -> Self {
        Self::Thumbnail(err.to_string())
    }
}
