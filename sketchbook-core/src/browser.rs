//! Browser `localStorage` adapters for WASM builds.

use async_trait::async_trait;
use wasm_bindgen::prelude::*;

use crate::error::StoreError;
use crate::scene::Scene;
use crate::store::{PointerSlot, SceneStore};

/// Default key prefix for scene records.
pub const DEFAULT_SCENE_PREFIX: &str = "sketchbook-scene:";

/// Install the panic hook so Rust panics show up in the browser console.
#[wasm_bindgen(js_name = initSketchbook)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn local_storage() -> Result<web_sys::Storage, StoreError> {
    web_sys::window()
        .ok_or_else(|| StoreError::Backend("no window".into()))?
        .local_storage()
        .map_err(js_error)?
        .ok_or_else(|| StoreError::Backend("localStorage unavailable".into()))
}

#[allow(clippy::needless_pass_by_value)]
fn js_error(value: JsValue) -> StoreError {
    StoreError::Backend(format!("{value:?}"))
}

/// Scene store keeping JSON records in `localStorage` under a key prefix.
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    prefix: String,
}

impl LocalStorageStore {
    /// Store using [`DEFAULT_SCENE_PREFIX`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_SCENE_PREFIX)
    }

    /// Store using a custom key prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneStore for LocalStorageStore {
    async fn get(&self, key: &str) -> Result<Option<Scene>, StoreError> {
        let storage = local_storage()?;
        let raw = storage
            .get_item(&format!("{}{key}", self.prefix))
            .map_err(js_error)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, scene: &Scene) -> Result<(), StoreError> {
        let json = serde_json::to_string(scene)?;
        local_storage()?
            .set_item(&format!("{}{key}", self.prefix), &json)
            .map_err(js_error)
    }

    async fn entries(&self) -> Result<Vec<(String, Scene)>, StoreError> {
        let storage = local_storage()?;
        let len = storage.length().map_err(js_error)?;
        let mut entries = Vec::new();
        for index in 0..len {
            let Some(full_key) = storage.key(index).map_err(js_error)? else {
                continue;
            };
            let Some(key) = full_key.strip_prefix(&self.prefix) else {
                continue;
            };
            let Some(json) = storage.get_item(&full_key).map_err(js_error)? else {
                continue;
            };
            match serde_json::from_str(&json) {
                Ok(scene) => entries.push((key.to_string(), scene)),
                Err(e) => tracing::warn!(key = %key, "Skipping malformed scene record: {e}"),
            }
        }
        Ok(entries)
    }
}

/// Pointer slots stored directly in `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageSlot;

impl PointerSlot for LocalStorageSlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        local_storage()?.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        local_storage()?.set_item(key, value).map_err(js_error)
    }
}
