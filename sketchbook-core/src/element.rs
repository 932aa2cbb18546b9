//! Drawing elements as produced by the drawing surface.
//!
//! Elements are open records: the fields the sketchbook reads are typed,
//! everything else the drawing library attaches is kept in [`Element::extra`]
//! so that a save/load cycle never loses data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of a drawing element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The shape type of an element.
///
/// Unrecognised types are carried through unchanged in [`ElementKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Ellipse inscribed in the element box.
    Ellipse,
    /// Diamond inscribed in the element box.
    Diamond,
    /// Polyline through `points`.
    Line,
    /// Polyline through `points` with an arrowhead.
    Arrow,
    /// Freehand stroke through `points`.
    Freedraw,
    /// Text label.
    Text,
    /// Embedded image referencing a binary file.
    Image,
    /// Frame grouping other elements.
    Frame,
    /// Any other type name.
    Other(String),
}

impl ElementKind {
    /// Whether this kind is drawn through its `points` list.
    #[must_use]
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Line | Self::Arrow | Self::Freedraw)
    }
}

impl From<String> for ElementKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "rectangle" => Self::Rectangle,
            "ellipse" => Self::Ellipse,
            "diamond" => Self::Diamond,
            "line" => Self::Line,
            "arrow" => Self::Arrow,
            "freedraw" => Self::Freedraw,
            "text" => Self::Text,
            "image" => Self::Image,
            "frame" => Self::Frame,
            _ => Self::Other(value),
        }
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Rectangle => "rectangle".into(),
            ElementKind::Ellipse => "ellipse".into(),
            ElementKind::Diamond => "diamond".into(),
            ElementKind::Line => "line".into(),
            ElementKind::Arrow => "arrow".into(),
            ElementKind::Freedraw => "freedraw".into(),
            ElementKind::Text => "text".into(),
            ElementKind::Image => "image".into(),
            ElementKind::Frame => "frame".into(),
            ElementKind::Other(name) => name,
        }
    }
}

/// Axis-aligned bounding box in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl Bounds {
    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

fn default_stroke_color() -> String {
    "#1e1e1e".to_string()
}

fn default_background_color() -> String {
    "transparent".to_string()
}

const fn default_stroke_width() -> f64 {
    1.0
}

const fn default_opacity() -> f64 {
    100.0
}

/// A single drawing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Element identifier.
    pub id: ElementId,
    /// Shape type.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Left edge in scene coordinates.
    #[serde(default)]
    pub x: f64,
    /// Top edge in scene coordinates.
    #[serde(default)]
    pub y: f64,
    /// Box width.
    #[serde(default)]
    pub width: f64,
    /// Box height.
    #[serde(default)]
    pub height: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub angle: f64,
    /// Stroke color as CSS color string.
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    /// Fill color as CSS color string.
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// Stroke width in pixels.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    /// Opacity from 0 to 100.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Soft-deleted elements stay in the list but are not drawn.
    #[serde(default)]
    pub is_deleted: bool,
    /// Points relative to `(x, y)` for linear kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    /// Text content for text elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Font size for text elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Referenced binary file for image elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// Fields not interpreted by the sketchbook.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Create an element of `kind` covering the given box.
    #[must_use]
    pub fn new(kind: ElementKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            x,
            y,
            width,
            height,
            angle: 0.0,
            stroke_color: default_stroke_color(),
            background_color: default_background_color(),
            stroke_width: default_stroke_width(),
            opacity: default_opacity(),
            is_deleted: false,
            points: None,
            text: None,
            font_size: None,
            file_id: None,
            extra: Map::new(),
        }
    }

    /// Set the element id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ElementId::from_string(id);
        self
    }

    /// Set the relative points of a linear element.
    #[must_use]
    pub fn with_points(mut self, points: Vec<[f64; 2]>) -> Self {
        self.points = Some(points);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set stroke and fill colors.
    #[must_use]
    pub fn with_colors(mut self, stroke: impl Into<String>, fill: impl Into<String>) -> Self {
        self.stroke_color = stroke.into();
        self.background_color = fill.into();
        self
    }

    /// Whether the element should be drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.is_deleted
    }

    /// Bounding box in scene coordinates, ignoring rotation.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        if self.kind.is_linear() {
            if let Some(points) = self.points.as_deref().filter(|p| !p.is_empty()) {
                let init = Bounds {
                    min_x: f64::INFINITY,
                    min_y: f64::INFINITY,
                    max_x: f64::NEG_INFINITY,
                    max_y: f64::NEG_INFINITY,
                };
                return points.iter().fold(init, |b, [px, py]| Bounds {
                    min_x: b.min_x.min(self.x + px),
                    min_y: b.min_y.min(self.y + py),
                    max_x: b.max_x.max(self.x + px),
                    max_y: b.max_y.max(self.y + py),
                });
            }
        }
        // Boxes may carry negative extents while being dragged out.
        Bounds {
            min_x: self.x.min(self.x + self.width),
            min_y: self.y.min(self.y + self.height),
            max_x: self.x.max(self.x + self.width),
            max_y: self.y.max(self.y + self.height),
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_known_and_unknown_types() {
        assert_eq!(ElementKind::from("ellipse".to_string()), ElementKind::Ellipse);
        assert_eq!(
            ElementKind::from("embeddable".to_string()),
            ElementKind::Other("embeddable".to_string())
        );
        assert_eq!(String::from(ElementKind::Freedraw), "freedraw");
    }

    #[test]
    fn element_keeps_unknown_fields() {
        let json = r##"{
            "id": "abc",
            "type": "rectangle",
            "x": 10, "y": 20, "width": 30, "height": 40,
            "strokeColor": "#ff0000",
            "roughness": 1,
            "seed": 1234
        }"##;
        let element: Element = serde_json::from_str(json).expect("parse");
        assert_eq!(element.kind, ElementKind::Rectangle);
        assert_eq!(element.stroke_color, "#ff0000");
        assert_eq!(element.background_color, "transparent");
        assert_eq!(element.extra.get("seed"), Some(&Value::from(1234)));

        let back = serde_json::to_value(&element).expect("serialize");
        assert_eq!(back["roughness"], Value::from(1));
        assert_eq!(back["type"], Value::from("rectangle"));
    }

    #[test]
    fn box_bounds_normalize_negative_extent() {
        let element = Element::new(ElementKind::Rectangle, 100.0, 50.0, -40.0, 20.0);
        let b = element.bounds();
        assert!((b.min_x - 60.0).abs() < f64::EPSILON);
        assert!((b.max_x - 100.0).abs() < f64::EPSILON);
        assert!((b.height() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn linear_bounds_follow_points() {
        let element = Element::new(ElementKind::Arrow, 10.0, 10.0, 0.0, 0.0)
            .with_points(vec![[0.0, 0.0], [50.0, -5.0], [20.0, 30.0]]);
        let b = element.bounds();
        assert!((b.min_y - 5.0).abs() < f64::EPSILON);
        assert!((b.max_x - 60.0).abs() < f64::EPSILON);
        assert!((b.max_y - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(ElementId::new(), ElementId::new());
    }
}
