//! # Sketchbook Core
//!
//! Local persistence of named drawings ("scenes") and a list of saved
//! scenes for switching between them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Sketchbook                      │
//! ├───────────────────────────┬──────────────────────────┤
//! │  ActiveSceneView          │  SceneListView           │
//! │  - Loading → Ready        │  - loaded from store     │
//! │  - change events ──┐      │  - patched from bus      │
//! │                    ▼      │  - thumbnails            │
//! │  SyncHandle (debounced) ──┼──► SceneBus ──┘          │
//! ├───────────────────────────┴──────────────────────────┤
//! │  SceneStore (keyed scenes)  │  PointerSlot (last id) │
//! └──────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod active;
pub mod bus;
pub mod config;
pub mod debounce;
pub mod document;
pub mod element;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_store;
pub mod list;
pub mod runtime;
pub mod scene;
pub mod sketchbook;
pub mod store;
pub mod sync;
pub mod thumbnail;

#[cfg(feature = "wasm")]
pub mod browser;

pub use active::{ActiveSceneView, LoadTicket, SceneState};
pub use bus::{SceneBus, SceneEvent};
pub use config::SketchbookConfig;
pub use debounce::Debouncer;
pub use document::SceneDocument;
pub use element::{Bounds, Element, ElementId, ElementKind};
pub use error::{SketchbookError, SketchbookResult, StoreError};
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::{FileSlot, FileStore};
pub use list::{ListChange, ListEntry, SceneListView};
pub use scene::{AppState, BinaryFile, FileId, Scene};
pub use sketchbook::{generate_scene_name, Sketchbook};
pub use store::{MemorySlot, MemoryStore, PointerSlot, SceneStore};
pub use sync::{SceneSync, SyncCounts, SyncHandle, WriteOutcome};
pub use thumbnail::{Thumbnail, Thumbnailer};

/// Sketchbook core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
