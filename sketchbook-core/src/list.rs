//! Scene list view model.
//!
//! Holds every saved scene in store enumeration order, keeps entries current
//! from [`SceneEvent`]s and tracks which thumbnails need re-rendering.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::bus::SceneEvent;
use crate::error::{SketchbookError, SketchbookResult};
use crate::scene::Scene;
use crate::store::SceneStore;
use crate::thumbnail::{Thumbnail, Thumbnailer};

/// Callback invoked with the full scene when an entry is selected.
pub type SelectCallback = Box<dyn Fn(&Scene) + Send + Sync>;

/// What [`SceneListView::apply`] did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// An existing entry at this index was replaced.
    Replaced(usize),
    /// A new entry was appended at this index.
    Appended(usize),
    /// The scene had no name and was ignored.
    Ignored,
}

/// One scene in the list.
#[derive(Debug, Clone)]
pub struct ListEntry {
    scene: Arc<Scene>,
    name: String,
    revision: u64,
    thumbnail: Option<Thumbnail>,
    thumbnail_revision: Option<u64>,
}

impl ListEntry {
    /// The scene's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scene data.
    #[must_use]
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Bumped every time the entry's data is replaced.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The last rendered thumbnail, possibly from an older revision.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// Whether the thumbnail needs rendering for the current data.
    #[must_use]
    pub fn thumbnail_is_stale(&self) -> bool {
        self.thumbnail_revision != Some(self.revision)
    }
}

/// In-memory list of saved scenes.
#[derive(Default)]
pub struct SceneListView {
    entries: Vec<ListEntry>,
    next_revision: u64,
    on_select: Option<SelectCallback>,
}

impl std::fmt::Debug for SceneListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneListView")
            .field("entries", &self.entries)
            .field("next_revision", &self.next_revision)
            .field("on_select", &self.on_select.is_some())
            .finish()
    }
}

impl SceneListView {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every stored scene, in the store's enumeration order.
    ///
    /// A stored scene whose app state lost its name is listed under its
    /// store key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    pub async fn load(store: &dyn SceneStore) -> SketchbookResult<Self> {
        let mut list = Self::new();
        for (key, mut scene) in store.entries().await? {
            if scene.name().is_none() {
                scene.app_state.name = Some(key);
            }
            list.apply(Arc::new(scene));
        }
        tracing::debug!(count = list.len(), "Scene list loaded");
        Ok(list)
    }

    /// Register the selection callback.
    pub fn set_on_select(&mut self, callback: impl Fn(&Scene) + Send + Sync + 'static) {
        self.on_select = Some(Box::new(callback));
    }

    /// Replace the entry with the same name in place, or append it.
    pub fn apply(&mut self, scene: Arc<Scene>) -> ListChange {
        let Some(name) = scene.name().map(str::to_owned) else {
            tracing::debug!("Ignoring unnamed scene update");
            return ListChange::Ignored;
        };
        let revision = self.bump_revision();

        if let Some(index) = self.position(&name) {
            let entry = &mut self.entries[index];
            entry.scene = scene;
            entry.revision = revision;
            return ListChange::Replaced(index);
        }

        self.entries.push(ListEntry {
            scene,
            name,
            revision,
            thumbnail: None,
            thumbnail_revision: None,
        });
        ListChange::Appended(self.entries.len() - 1)
    }

    /// Apply a bus event.
    pub fn handle_event(&mut self, event: &SceneEvent) -> ListChange {
        match event {
            SceneEvent::Saved(scene) => self.apply(Arc::clone(scene)),
        }
    }

    /// Apply every event already waiting on `rx` without blocking.
    ///
    /// Returns how many events were applied.
    pub fn drain(&mut self, rx: &mut broadcast::Receiver<SceneEvent>) -> usize {
        let mut applied = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.handle_event(&event);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Scene list fell behind the bus");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return applied,
            }
        }
    }

    /// Apply events from `rx` until the bus closes.
    pub async fn follow(&mut self, mut rx: broadcast::Receiver<SceneEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Scene list fell behind the bus");
                }
                Err(RecvError::Closed) => return,
            }
        }
    }

    /// Select the entry named `name`, invoking the selection callback.
    ///
    /// # Errors
    ///
    /// Returns [`SketchbookError::SceneNotFound`] if no entry has that name.
    pub fn select(&self, name: &str) -> SketchbookResult<Arc<Scene>> {
        let entry = self
            .get(name)
            .ok_or_else(|| SketchbookError::SceneNotFound(name.to_string()))?;
        if let Some(callback) = &self.on_select {
            callback(&entry.scene);
        }
        Ok(Arc::clone(&entry.scene))
    }

    /// Render thumbnails for every entry whose data changed since its last
    /// render. Returns how many thumbnails were rendered.
    ///
    /// A failed render leaves that entry without a thumbnail; it is retried
    /// on the next refresh.
    pub fn refresh_thumbnails(&mut self, thumbnailer: &dyn Thumbnailer) -> usize {
        let mut rendered = 0;
        for entry in self.entries.iter_mut().filter(|e| e.thumbnail_is_stale()) {
            match thumbnailer.render(&entry.scene) {
                Ok(thumbnail) => {
                    entry.thumbnail = Some(thumbnail);
                    entry.thumbnail_revision = Some(entry.revision);
                    rendered += 1;
                }
                Err(e) => {
                    tracing::warn!(scene = %entry.name, "Thumbnail render failed: {e}");
                    entry.thumbnail = None;
                }
            }
        }
        rendered
    }

    /// Entry named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ListEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// All entries in display order.
    #[must_use]
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// Names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ListEntry::name)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    fn bump_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}
