//! Scenes: named drawings made of elements, canvas settings and attachments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::{Bounds, Element};

/// Identifier of a binary attachment.
pub type FileId = String;

/// Canvas-level settings of a scene.
///
/// Only the fields the sketchbook reads are typed; the drawing library's
/// other settings are preserved in [`AppState::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Scene name, the key under which the scene is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Canvas background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_background_color: Option<String>,
    /// UI theme (`"light"` or `"dark"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Settings not interpreted by the sketchbook.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppState {
    /// App state carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A binary attachment such as an embedded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryFile {
    /// Attachment identifier.
    pub id: FileId,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Payload as a `data:` URL.
    #[serde(rename = "dataURL")]
    pub data_url: String,
    /// Creation time in milliseconds since epoch.
    #[serde(default)]
    pub created: u64,
    /// Fields not interpreted by the sketchbook.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Elements in z-order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Canvas settings, including the scene name.
    #[serde(default)]
    pub app_state: AppState,
    /// Binary attachments keyed by file id.
    #[serde(default)]
    pub files: BTreeMap<FileId, BinaryFile>,
}

impl Scene {
    /// Create a scene from the parts reported by the drawing surface.
    #[must_use]
    pub fn new(
        elements: Vec<Element>,
        app_state: AppState,
        files: BTreeMap<FileId, BinaryFile>,
    ) -> Self {
        Self {
            elements,
            app_state,
            files,
        }
    }

    /// Create an empty scene with the given name.
    #[must_use]
    pub fn blank(name: impl Into<String>) -> Self {
        Self {
            app_state: AppState::named(name),
            ..Self::default()
        }
    }

    /// The scene's usable name.
    ///
    /// Missing, empty and whitespace-only names all count as unnamed.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.app_state
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Append an element.
    pub fn push_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Elements that are not soft-deleted, in z-order.
    pub fn visible_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_visible())
    }

    /// Bounding box of all visible elements, or `None` for an empty drawing.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.visible_elements()
            .map(Element::bounds)
            .reduce(Bounds::union)
    }

    /// Whether the scene has nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible_elements().next().is_none()
    }
}
