//! Active scene view: loads a scene and feeds its edits to the sync task.
//!
//! ```text
//!   mount(id) ──► Loading ──(fetch ok / not found / error)──► Ready
//!                    ▲                                          │
//!                    └──────────────── reset(id) ◄──────────────┘
//! ```
//!
//! Every mount gets a new generation. A load that completes for an older
//! generation is dropped, so a slow read can never overwrite a newer mount.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::element::Element;
use crate::error::{SketchbookResult, StoreError};
use crate::scene::{AppState, BinaryFile, FileId, Scene};
use crate::sync::{SceneSync, SyncCounts, SyncHandle, WriteOutcome};

/// Load state of the active scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneState {
    /// Waiting for the initial read from the store.
    Loading,
    /// Drawing surface is live.
    Ready {
        /// Data the surface starts from; `None` means a blank canvas.
        initial: Option<Arc<Scene>>,
    },
}

/// Proof of a started mount, consumed by [`ActiveSceneView::complete_mount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    id: Option<String>,
}

impl LoadTicket {
    /// The scene id being loaded.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The mount generation this ticket belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The scene currently loaded into the drawing surface.
#[derive(Debug)]
pub struct ActiveSceneView {
    sync: SceneSync,
    id: Option<String>,
    generation: u64,
    state: SceneState,
    handle: Option<SyncHandle>,
}

impl ActiveSceneView {
    /// Create an unmounted view.
    #[must_use]
    pub fn new(sync: SceneSync) -> Self {
        Self {
            sync,
            id: None,
            generation: 0,
            state: SceneState::Loading,
            handle: None,
        }
    }

    /// Start a mount for `id`, tearing down the previous one.
    ///
    /// The previous sync task is dropped without waiting, so a pending
    /// change is handled by the close policy in the background. Use
    /// [`Self::reset`] to wait for it.
    pub fn begin_mount(&mut self, id: Option<String>) -> LoadTicket {
        drop(self.handle.take());
        self.generation += 1;
        self.id = id.filter(|id| !id.trim().is_empty());
        self.state = SceneState::Loading;
        LoadTicket {
            generation: self.generation,
            id: self.id.clone(),
        }
    }

    /// Finish the mount started with `ticket`.
    ///
    /// Read failures are logged and treated like a missing scene. Returns
    /// `false` if the ticket belongs to an older mount and was ignored.
    pub fn complete_mount(
        &mut self,
        ticket: &LoadTicket,
        loaded: Result<Option<Scene>, StoreError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "Dropping stale scene load"
            );
            return false;
        }

        let initial = match loaded {
            Ok(scene) => scene.map(Arc::new),
            Err(e) => {
                tracing::warn!(
                    scene = ticket.id.as_deref().unwrap_or_default(),
                    "Failed to load scene, starting blank: {e}"
                );
                None
            }
        };
        tracing::info!(
            scene = ticket.id.as_deref().unwrap_or_default(),
            blank = initial.is_none(),
            "Active scene ready"
        );
        self.state = SceneState::Ready { initial };
        self.handle = Some(self.sync.spawn());
        true
    }

    /// Mount `id`: read it from the store and become ready.
    ///
    /// Without an id the view becomes ready with a blank canvas at once.
    pub async fn mount(&mut self, id: Option<String>) {
        let ticket = self.begin_mount(id);
        let loaded = match ticket.id() {
            Some(id) => self.sync.store().get(id).await,
            None => Ok(None),
        };
        self.complete_mount(&ticket, loaded);
    }

    /// Tear down the current mount, waiting for its sync task to stop, and
    /// mount `id` from the store.
    pub async fn reset(&mut self, id: Option<String>) {
        self.unmount().await;
        self.mount(id).await;
    }

    /// Stop the sync task and wait for it, applying the close policy.
    pub async fn unmount(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close().await;
        }
        self.state = SceneState::Loading;
    }

    /// Forward a change event from the drawing surface.
    ///
    /// A change without a scene name inherits the active id. Returns
    /// `false` if the view is not ready and the change was ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SketchbookError::SyncClosed`] if the sync task died.
    pub fn on_change(
        &self,
        elements: Vec<Element>,
        app_state: AppState,
        files: BTreeMap<FileId, BinaryFile>,
    ) -> SketchbookResult<bool> {
        self.on_change_scene(Scene::new(elements, app_state, files))
    }

    /// Forward an already assembled scene. See [`Self::on_change`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::SketchbookError::SyncClosed`] if the sync task died.
    pub fn on_change_scene(&self, mut scene: Scene) -> SketchbookResult<bool> {
        let Some(handle) = self.handle.as_ref().filter(|_| self.is_ready()) else {
            tracing::debug!("Ignoring change while scene is loading");
            return Ok(false);
        };
        if scene.name().is_none() {
            scene.app_state.name.clone_from(&self.id);
        }
        handle.notify_scene(scene)?;
        Ok(true)
    }

    /// Write the pending change immediately.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SketchbookError::SyncClosed`] if the sync task died.
    pub async fn flush(&self) -> SketchbookResult<WriteOutcome> {
        match &self.handle {
            Some(handle) => handle.flush().await,
            None => Ok(WriteOutcome::Idle),
        }
    }

    /// Current load state.
    #[must_use]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Whether the surface is live.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SceneState::Ready { .. })
    }

    /// Initial data of a ready view, `None` while loading or when blank.
    #[must_use]
    pub fn initial_data(&self) -> Option<&Arc<Scene>> {
        match &self.state {
            SceneState::Ready { initial } => initial.as_ref(),
            SceneState::Loading => None,
        }
    }

    /// The active scene id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Mount generation, bumped on every mount.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sync counters of the current mount.
    #[must_use]
    pub fn sync_stats(&self) -> Option<SyncCounts> {
        self.handle.as_ref().map(SyncHandle::stats)
    }
}
