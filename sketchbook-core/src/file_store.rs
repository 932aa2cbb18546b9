//! File-backed storage: one JSON file per scene in a data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::scene::Scene;
use crate::store::{PointerSlot, SceneStore};

/// Extension of scene record files.
const SCENE_EXTENSION: &str = "json";

/// Extension of pointer slot files.
const SLOT_EXTENSION: &str = "slot";

/// On-disk record. The key is stored alongside the scene so that keys
/// survive file-name sanitization unchanged.
#[derive(Debug, Serialize, Deserialize)]
struct StoredScene {
    key: String,
    scene: Scene,
}

/// Borrowed form of [`StoredScene`] for writing without cloning.
#[derive(Serialize)]
struct StoredSceneRef<'a> {
    key: &'a str,
    scene: &'a Scene,
}

/// Scene store persisting each entry as `<data_dir>/<stem>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Open a store in `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// The directory holding the scene files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{SCENE_EXTENSION}", file_stem(key)))
    }
}

#[async_trait]
impl SceneStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Scene>, StoreError> {
        let path = self.path_for(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredScene = serde_json::from_str(&contents)?;
        Ok(Some(stored.scene))
    }

    async fn set(&self, key: &str, scene: &Scene) -> Result<(), StoreError> {
        let json = serde_json::to_string(&StoredSceneRef { key, scene })?;
        let path = self.path_for(key);
        // Write to a sibling file first so a crash never leaves a torn record.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(key = %key, path = %path.display(), "Scene written");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, Scene)>, StoreError> {
        let mut dir = tokio::fs::read_dir(&self.data_dir).await?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SCENE_EXTENSION) {
                continue;
            }
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!("Skipping unreadable scene file {}: {e}", path.display());
                    continue;
                }
            };
            match serde_json::from_str::<StoredScene>(&contents) {
                Ok(stored) => entries.push((stored.key, stored.scene)),
                Err(e) => {
                    tracing::warn!("Skipping malformed scene file {}: {e}", path.display());
                }
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

/// Pointer slots persisted as `<data_dir>/<stem>.slot` text files.
#[derive(Debug, Clone)]
pub struct FileSlot {
    data_dir: PathBuf,
}

impl FileSlot {
    /// Open slot storage in `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{SLOT_EXTENSION}", file_stem(key)))
    }
}

impl PointerSlot for FileSlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Longest readable prefix kept in a file stem.
const STEM_PREFIX_LEN: usize = 32;

/// Digest bytes appended to a file stem.
const STEM_DIGEST_LEN: usize = 16;

/// Map a key to a file stem.
///
/// The stem is a lowercased, filesystem-safe prefix of the key followed by
/// a SHA-256 digest of the exact key bytes. Its length is bounded whatever
/// the key length, and keys differing only in case get distinct stems on
/// case-insensitive filesystems. The real key is kept inside the record.
fn file_stem(key: &str) -> String {
    let prefix: String = key
        .chars()
        .take(STEM_PREFIX_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let digest = Sha256::digest(key.as_bytes());
    format!("{prefix}-{}", hex::encode(&digest[..STEM_DIGEST_LEN]))
}
