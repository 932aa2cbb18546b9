//! Scene thumbnails.
//!
//! A scene is drawn into an SVG document scaled to fit a square box, then
//! rasterized with resvg/tiny-skia and returned as a PNG `data:` URL.

use std::fmt::Write;

use base64::Engine;
use sketchbook_core::{
    Element, ElementKind, Scene, SketchbookConfig, SketchbookResult, Thumbnail, Thumbnailer,
};

use crate::error::{RenderError, RenderResult};

/// Length of arrowhead strokes in scene units.
const ARROWHEAD_LENGTH: f64 = 12.0;

/// Line height of text placeholder bars relative to the font size.
const TEXT_LINE_HEIGHT: f64 = 1.25;

/// Font size assumed for text elements that do not carry one.
const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Configuration for thumbnail rendering.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Edge length of the square output in pixels.
    pub size: u32,
    /// Margin around the drawing in pixels.
    pub padding: f64,
    /// Background used when the scene does not set one.
    pub background: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: sketchbook_core::config::DEFAULT_THUMBNAIL_SIZE,
            padding: 4.0,
            background: "#ffffff".to_string(),
        }
    }
}

/// Renders scenes to PNG thumbnails.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailExporter {
    config: ThumbnailConfig,
}

impl ThumbnailExporter {
    /// Create an exporter with the given configuration.
    #[must_use]
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Create an exporter producing `size`×`size` thumbnails.
    #[must_use]
    pub fn with_size(size: u32) -> Self {
        Self::new(ThumbnailConfig {
            size,
            ..ThumbnailConfig::default()
        })
    }

    /// Create an exporter sized by [`SketchbookConfig::thumbnail_size`].
    #[must_use]
    pub fn from_config(config: &SketchbookConfig) -> Self {
        Self::with_size(config.thumbnail_size)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Render the scene as an SVG document fitted to the thumbnail box.
    #[must_use]
    pub fn render_to_svg(&self, scene: &Scene) -> String {
        let size = self.config.size.max(1);
        let background = scene
            .app_state
            .view_background_color
            .as_deref()
            .unwrap_or(&self.config.background);

        let mut svg = String::with_capacity(2048);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{size}\" height=\"{size}\" viewBox=\"0 0 {size} {size}\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(background),
        );

        if let Some(bounds) = scene.bounds() {
            let side = f64::from(size);
            let avail = (side - 2.0 * self.config.padding).max(1.0);
            let width = bounds.width().max(1.0);
            let height = bounds.height().max(1.0);
            let scale = (avail / width).min(avail / height);
            let tx = self.config.padding + (avail - width * scale) / 2.0 - bounds.min_x * scale;
            let ty = self.config.padding + (avail - height * scale) / 2.0 - bounds.min_y * scale;

            let _ = write!(
                svg,
                "<g transform=\"translate({tx} {ty}) scale({scale})\">"
            );
            for element in scene.visible_elements() {
                render_element_svg(&mut svg, element, scene);
            }
            svg.push_str("</g>");
        }

        svg.push_str("</svg>");
        svg
    }

    /// Render the scene to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG cannot be parsed, rasterized or encoded.
    pub fn render_to_png(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        let svg = self.render_to_svg(scene);
        let pixmap = rasterize_svg(&svg)?;
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    /// Render the scene to a `data:image/png;base64,...` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_data_url(&self, scene: &Scene) -> RenderResult<String> {
        let png = self.render_to_png(scene)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Ok(format!("data:image/png;base64,{encoded}"))
    }
}

impl Thumbnailer for ThumbnailExporter {
    fn render(&self, scene: &Scene) -> SketchbookResult<Thumbnail> {
        let src = self.render_data_url(scene)?;
        tracing::debug!(
            scene = scene.name().unwrap_or_default(),
            bytes = src.len(),
            "Thumbnail rendered"
        );
        Ok(Thumbnail {
            src,
            width: self.config.size.max(1),
            height: self.config.size.max(1),
        })
    }
}

/// Rasterize an SVG string to a tiny-skia Pixmap.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rasterize_svg(svg: &str) -> RenderResult<tiny_skia::Pixmap> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let px_w = tree.size().width().ceil() as u32;
    let px_h = tree.size().height().ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Raster("failed to create pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Render a single element to SVG.
#[allow(clippy::too_many_lines)]
fn render_element_svg(svg: &mut String, element: &Element, scene: &Scene) {
    let stroke = paint(&element.stroke_color);
    let fill = paint(&element.background_color);
    let opacity = (element.opacity / 100.0).clamp(0.0, 1.0);
    let b = element.bounds();
    let (cx, cy) = (b.min_x + b.width() / 2.0, b.min_y + b.height() / 2.0);
    let _ = write!(
        svg,
        "<g opacity=\"{opacity}\" transform=\"rotate({} {cx} {cy})\">",
        element.angle.to_degrees(),
    );

    let sw = element.stroke_width;
    match &element.kind {
        ElementKind::Rectangle | ElementKind::Frame => {
            let fill = if element.kind == ElementKind::Frame {
                "none".to_string()
            } else {
                fill
            };
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                b.min_x,
                b.min_y,
                b.width(),
                b.height(),
            );
        }

        ElementKind::Ellipse => {
            let _ = write!(
                svg,
                "<ellipse cx=\"{cx}\" cy=\"{cy}\" rx=\"{}\" ry=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                b.width() / 2.0,
                b.height() / 2.0,
            );
        }

        ElementKind::Diamond => {
            let _ = write!(
                svg,
                "<polygon points=\"{cx},{} {},{cy} {cx},{} {},{cy}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                b.min_y, b.max_x, b.max_y, b.min_x,
            );
        }

        ElementKind::Line | ElementKind::Arrow | ElementKind::Freedraw => {
            let points = absolute_points(element);
            if points.len() >= 2 {
                let _ = write!(
                    svg,
                    "<polyline points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{sw}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
                    format_points(&points),
                );
                if element.kind == ElementKind::Arrow {
                    render_arrowhead(svg, &points, &stroke, sw);
                }
            }
        }

        ElementKind::Text => render_text_bars(svg, element, &stroke),

        ElementKind::Image => {
            let file = element
                .file_id
                .as_ref()
                .and_then(|id| scene.files.get(id))
                .filter(|f| matches!(f.mime_type.as_str(), "image/png" | "image/jpeg"));
            match file {
                Some(file) => {
                    let _ = write!(
                        svg,
                        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
                        b.min_x,
                        b.min_y,
                        b.width(),
                        b.height(),
                        escape_xml(&file.data_url),
                    );
                }
                None => {
                    let _ = write!(
                        svg,
                        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#e0e0e0\" stroke=\"#999\" stroke-width=\"1\"/>",
                        b.min_x,
                        b.min_y,
                        b.width(),
                        b.height(),
                    );
                }
            }
        }

        ElementKind::Other(kind) => {
            tracing::trace!(kind = %kind, "Skipping element kind in thumbnail");
        }
    }

    svg.push_str("</g>");
}

/// Text is drawn as one bar per line; glyphs are unreadable at thumbnail size.
#[allow(clippy::cast_precision_loss)]
fn render_text_bars(svg: &mut String, element: &Element, color: &str) {
    let Some(text) = element.text.as_deref() else {
        return;
    };
    let font_size = element.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    if longest == 0 {
        return;
    }
    let full_width = if element.width > 0.0 {
        element.width
    } else {
        longest as f64 * font_size * 0.6
    };
    for (i, line) in text.lines().enumerate() {
        let chars = line.chars().count();
        if chars == 0 {
            continue;
        }
        let width = full_width * chars as f64 / longest as f64;
        let y = element.y + i as f64 * font_size * TEXT_LINE_HEIGHT + font_size * 0.25;
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{y}\" width=\"{width}\" height=\"{}\" fill=\"{color}\" opacity=\"0.6\"/>",
            element.x,
            font_size * 0.5,
        );
    }
}

fn render_arrowhead(svg: &mut String, points: &[(f64, f64)], stroke: &str, stroke_width: f64) {
    let [.., (x0, y0), (x1, y1)] = points else {
        return;
    };
    let angle = (y1 - y0).atan2(x1 - x0);
    let spread = std::f64::consts::PI / 7.0;
    for side in [-1.0, 1.0] {
        let a = angle + std::f64::consts::PI + side * spread;
        let hx = x1 + ARROWHEAD_LENGTH * a.cos();
        let hy = y1 + ARROWHEAD_LENGTH * a.sin();
        let _ = write!(
            svg,
            "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{hx}\" y2=\"{hy}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\"/>",
        );
    }
}

fn absolute_points(element: &Element) -> Vec<(f64, f64)> {
    element
        .points
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|[px, py]| (element.x + px, element.y + py))
        .collect()
}

fn format_points(points: &[(f64, f64)]) -> String {
    let mut out = String::with_capacity(points.len() * 12);
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{x},{y}");
    }
    out
}

/// SVG paint for a CSS color, mapping `transparent` to `none`.
fn paint(color: &str) -> String {
    if color.is_empty() || color.eq_ignore_ascii_case("transparent") {
        "none".to_string()
    } else {
        escape_xml(color)
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchbook_core::{AppState, BinaryFile};

    fn decode_data_url(url: &str) -> Vec<u8> {
        let payload = url
            .strip_prefix("data:image/png;base64,")
            .expect("png data url");
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .expect("base64")
    }

    /// Width and height from the PNG IHDR chunk.
    fn png_dimensions(png: &[u8]) -> (u32, u32) {
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let w = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let h = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (w, h)
    }

    fn sample_scene() -> Scene {
        let mut scene = Scene::blank("sample");
        scene.push_element(
            Element::new(ElementKind::Rectangle, 0.0, 0.0, 100.0, 50.0)
                .with_colors("#1e1e1e", "#a5d8ff"),
        );
        scene.push_element(Element::new(ElementKind::Ellipse, 120.0, 0.0, 40.0, 40.0));
        scene.push_element(
            Element::new(ElementKind::Arrow, 0.0, 80.0, 0.0, 0.0)
                .with_points(vec![[0.0, 0.0], [150.0, 20.0]]),
        );
        scene
    }

    #[test]
    fn empty_scene_renders_background_only() {
        let exporter = ThumbnailExporter::default();
        let svg = exporter.render_to_svg(&Scene::blank("empty"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"64\""));
        assert!(!svg.contains("<g "));
    }

    #[test]
    fn svg_contains_each_shape() {
        let svg = ThumbnailExporter::default().render_to_svg(&sample_scene());
        assert!(svg.contains("<rect x=\"0\" y=\"0\" width=\"100\" height=\"50\" fill=\"#a5d8ff\""));
        assert!(svg.contains("<ellipse"));
        assert!(svg.contains("<polyline points=\"0,80 150,100\""));
        assert_eq!(svg.matches("<line ").count(), 2, "arrowhead strokes");
    }

    #[test]
    fn transparent_fill_becomes_none() {
        let mut scene = Scene::blank("t");
        scene.push_element(Element::new(ElementKind::Rectangle, 0.0, 0.0, 10.0, 10.0));
        let svg = ThumbnailExporter::default().render_to_svg(&scene);
        assert!(svg.contains("fill=\"none\""));
    }

    #[test]
    fn deleted_elements_are_not_drawn() {
        let mut scene = Scene::blank("d");
        scene.push_element(Element::new(ElementKind::Rectangle, 0.0, 0.0, 10.0, 10.0));
        let mut gone = Element::new(ElementKind::Ellipse, 0.0, 0.0, 10.0, 10.0);
        gone.is_deleted = true;
        scene.push_element(gone);
        let svg = ThumbnailExporter::default().render_to_svg(&scene);
        assert!(!svg.contains("<ellipse"));
    }

    #[test]
    fn drawing_is_fitted_into_the_box() {
        let mut scene = Scene::blank("far");
        scene.push_element(Element::new(ElementKind::Rectangle, 1000.0, 1000.0, 200.0, 200.0));
        let svg = ThumbnailExporter::with_size(64).render_to_svg(&scene);
        // 56px of usable space for a 200 unit drawing.
        assert!(svg.contains("scale(0.28)"));
    }

    #[test]
    fn colors_and_text_are_escaped() {
        let mut scene = Scene::blank("x");
        scene.app_state = AppState {
            view_background_color: Some("\"><script>".to_string()),
            ..AppState::named("x")
        };
        scene.push_element(
            Element::new(ElementKind::Text, 0.0, 0.0, 50.0, 20.0).with_text("a < b\nc"),
        );
        let svg = ThumbnailExporter::default().render_to_svg(&scene);
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&quot;&gt;&lt;script&gt;"));
        assert_eq!(svg.matches("opacity=\"0.6\"").count(), 2, "one bar per line");
    }

    #[test]
    fn image_uses_embedded_file_or_placeholder() {
        let mut scene = Scene::blank("img");
        let mut with_file = Element::new(ElementKind::Image, 0.0, 0.0, 10.0, 10.0);
        with_file.file_id = Some("f1".to_string());
        scene.push_element(with_file);
        scene.push_element(Element::new(ElementKind::Image, 20.0, 0.0, 10.0, 10.0));
        scene.files.insert(
            "f1".to_string(),
            BinaryFile {
                id: "f1".to_string(),
                mime_type: "image/png".to_string(),
                data_url: "data:image/png;base64,AAAA".to_string(),
                created: 0,
                extra: Default::default(),
            },
        );
        let svg = ThumbnailExporter::default().render_to_svg(&scene);
        assert!(svg.contains("xlink:href=\"data:image/png;base64,AAAA\""));
        assert!(svg.contains("fill=\"#e0e0e0\""));
    }

    #[test]
    fn png_has_requested_size() {
        let exporter = ThumbnailExporter::with_size(48);
        let png = exporter.render_to_png(&sample_scene()).expect("png");
        assert_eq!(png_dimensions(&png), (48, 48));
    }

    #[test]
    fn thumbnailer_returns_png_data_url() {
        let exporter = ThumbnailExporter::default();
        let thumb = exporter.render(&sample_scene()).expect("thumbnail");
        assert_eq!((thumb.width, thumb.height), (64, 64));
        let png = decode_data_url(&thumb.src);
        assert_eq!(png_dimensions(&png), (64, 64));
    }
}
