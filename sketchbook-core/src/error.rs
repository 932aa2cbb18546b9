//! Error types for sketchbook operations.

use thiserror::Error;

/// Result type for sketchbook operations.
pub type SketchbookResult<T> = Result<T, SketchbookError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred in a file-backed store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored record could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The storage backend rejected the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur in sketchbook operations.
#[derive(Debug, Error)]
pub enum SketchbookError {
    /// Storage read or write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A scene document could not be parsed.
    #[error("Invalid scene document: {0}")]
    InvalidDocument(String),

    /// Scene serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The scene has no usable name and cannot be stored.
    #[error("Scene has no name")]
    UnnamedScene,

    /// The background sync task is no longer running.
    #[error("Sync task closed")]
    SyncClosed,

    /// Scene not present in the list view.
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// Thumbnail rendering failed.
    #[error("Thumbnail error: {0}")]
    Thumbnail(String),
}
