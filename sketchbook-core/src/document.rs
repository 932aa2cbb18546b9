//! Portable scene file format shared with the drawing library.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::{SketchbookError, SketchbookResult};
use crate::scene::{AppState, BinaryFile, FileId, Scene};

/// Value of the document `type` field.
pub const DOCUMENT_TYPE: &str = "excalidraw";

/// Document schema version written by [`SceneDocument::from_scene`].
pub const DOCUMENT_VERSION: u32 = 2;

/// Default `source` recorded in exported documents.
pub const DEFAULT_SOURCE: &str = "sketchbook";

/// Serialized scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Always [`DOCUMENT_TYPE`].
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Schema version.
    pub version: u32,
    /// Producer of the document.
    #[serde(default)]
    pub source: String,
    /// Visible elements in z-order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Canvas settings.
    #[serde(default)]
    pub app_state: AppState,
    /// Binary attachments.
    #[serde(default)]
    pub files: BTreeMap<FileId, BinaryFile>,
}

impl SceneDocument {
    /// Build a document from a scene, dropping soft-deleted elements.
    #[must_use]
    pub fn from_scene(scene: &Scene, source: impl Into<String>) -> Self {
        Self {
            doc_type: DOCUMENT_TYPE.to_string(),
            version: DOCUMENT_VERSION,
            source: source.into(),
            elements: scene.visible_elements().cloned().collect(),
            app_state: scene.app_state.clone(),
            files: scene.files.clone(),
        }
    }

    /// Convert the document back into a scene.
    #[must_use]
    pub fn into_scene(self) -> Scene {
        Scene::new(self.elements, self.app_state, self.files)
    }

    /// Parse a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SketchbookError::Serialization`] for malformed JSON and
    /// [`SketchbookError::InvalidDocument`] when the `type` field names a
    /// different format.
    pub fn parse(json: &str) -> SketchbookResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.doc_type != DOCUMENT_TYPE {
            return Err(SketchbookError::InvalidDocument(format!(
                "unexpected document type '{}'",
                doc.doc_type
            )));
        }
        Ok(doc)
    }

    /// Serialize the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> SketchbookResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn scene_with_deleted() -> Scene {
        let mut scene = Scene::blank("doc");
        scene.push_element(Element::new(ElementKind::Rectangle, 0.0, 0.0, 5.0, 5.0).with_id("keep"));
        let mut gone = Element::new(ElementKind::Line, 0.0, 0.0, 1.0, 1.0).with_id("gone");
        gone.is_deleted = true;
        scene.push_element(gone);
        scene
    }

    #[test]
    fn export_omits_deleted_elements() {
        let doc = SceneDocument::from_scene(&scene_with_deleted(), DEFAULT_SOURCE);
        assert_eq!(doc.doc_type, DOCUMENT_TYPE);
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].id.as_str(), "keep");
    }

    #[test]
    fn parse_accepts_exported_json() {
        let doc = SceneDocument::from_scene(&scene_with_deleted(), DEFAULT_SOURCE);
        let json = doc.to_json().expect("json");
        let parsed = SceneDocument::parse(&json).expect("parse");
        let scene = parsed.into_scene();
        assert_eq!(scene.name(), Some("doc"));
        assert_eq!(scene.elements.len(), 1);
    }

    #[test]
    fn parse_rejects_foreign_type() {
        let json = r#"{"type":"tldraw","version":1,"elements":[]}"#;
        let result = SceneDocument::parse(json);
        assert!(matches!(result, Err(SketchbookError::InvalidDocument(_))));
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let result = SceneDocument::parse("{ nope");
        assert!(matches!(result, Err(SketchbookError::Serialization(_))));
    }
}
