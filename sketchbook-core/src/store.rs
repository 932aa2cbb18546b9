//! Storage seams for scenes and the last-active pointer.
//!
//! The sketchbook talks to two stores:
//!
//! - a [`SceneStore`]: keyed scene records (get, set, enumerate),
//! - a [`PointerSlot`]: a small string slot for the last-active scene name.
//!
//! Both are shared across components behind `Arc`. In-memory implementations
//! live here; file-backed ones in [`crate::file_store`] and browser ones in
//! [`crate::browser`] (feature `wasm`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::scene::Scene;

/// Keyed persistent scene storage.
///
/// There is no delete and no transaction support.
#[async_trait]
pub trait SceneStore: Send + Sync {
    /// Fetch the scene stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Scene>, StoreError>;

    /// Store `scene` under `key`, replacing any previous value.
    async fn set(&self, key: &str, scene: &Scene) -> Result<(), StoreError>;

    /// All stored `(key, scene)` pairs in the backend's enumeration order.
    async fn entries(&self) -> Result<Vec<(String, Scene)>, StoreError>;
}

/// Simple string slot storage.
pub trait PointerSlot: Send + Sync {
    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Insertion-ordered in-memory scene store.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<Vec<(String, Scene)>>>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls since creation.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SceneStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Scene>, StoreError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, scene)| scene.clone()))
    }

    async fn set(&self, key: &str, scene: &Scene) -> Result<(), StoreError> {
        {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => *existing = scene.clone(),
                None => entries.push((key.to_string(), scene.clone())),
            }
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, Scene)>, StoreError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.clone())
    }
}

/// In-memory string slot storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySlot {
    /// Create an empty slot store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointerSlot for MemorySlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self
            .items
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
