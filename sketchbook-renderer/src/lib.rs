//! # Sketchbook Renderer
//!
//! Renders scene previews for the scene list.
//!
//! ```text
//! Scene ──► SVG (fit to box) ──► usvg/resvg ──► tiny-skia Pixmap ──► PNG ──► data: URL
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod thumbnail;

pub use error::{RenderError, RenderResult};
pub use thumbnail::{ThumbnailConfig, ThumbnailExporter};
