//! Thumbnail seam between the scene list and an image exporter.

use crate::error::SketchbookResult;
use crate::scene::Scene;

/// A rendered preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Displayable image source, typically a `data:image/png;base64,...` URL.
    pub src: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Renders a scene to a preview image.
pub trait Thumbnailer: Send + Sync {
    /// Render `scene`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SketchbookError::Thumbnail`] if the scene cannot be
    /// rendered or encoded.
    fn render(&self, scene: &Scene) -> SketchbookResult<Thumbnail>;
}
