//! Top-level container wiring the active scene and the scene list together.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::active::ActiveSceneView;
use crate::bus::{SceneBus, SceneEvent};
use crate::config::SketchbookConfig;
use crate::document::{SceneDocument, DEFAULT_SOURCE};
use crate::error::{SketchbookError, SketchbookResult};
#[cfg(not(target_arch = "wasm32"))]
use crate::file_store::{FileSlot, FileStore};
use crate::list::SceneListView;
use crate::store::{PointerSlot, SceneStore};
use crate::sync::SceneSync;
use crate::thumbnail::Thumbnailer;

/// Prefix of generated scene names.
pub const UNTITLED_PREFIX: &str = "untitled-";

/// Generate a fresh scene name such as `untitled-3f2a9c1b`.
#[must_use]
pub fn generate_scene_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{UNTITLED_PREFIX}{}", &id[..8])
}

/// A sketchbook session: one active scene plus the list of saved scenes.
pub struct Sketchbook {
    config: SketchbookConfig,
    store: Arc<dyn SceneStore>,
    bus: SceneBus,
    events: broadcast::Receiver<SceneEvent>,
    active: ActiveSceneView,
    list: SceneListView,
    thumbnailer: Option<Arc<dyn Thumbnailer>>,
}

impl std::fmt::Debug for Sketchbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sketchbook")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("list", &self.list)
            .finish_non_exhaustive()
    }
}

impl Sketchbook {
    /// Open a sketchbook over the given stores.
    ///
    /// The active scene starts at the last-active pointer (none if the slot
    /// is empty or unreadable) and the list holds every stored scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated for the list.
    pub async fn open(
        store: Arc<dyn SceneStore>,
        slot: Arc<dyn PointerSlot>,
        config: SketchbookConfig,
    ) -> SketchbookResult<Self> {
        let bus = SceneBus::with_capacity(config.bus_capacity);
        let events = bus.subscribe();

        let last_active = match slot.get_item(&config.pointer_key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read last-active pointer: {e}");
                None
            }
        };

        let sync = SceneSync::new(Arc::clone(&store), slot, bus.clone(), config.clone());
        let mut active = ActiveSceneView::new(sync);
        active.mount(last_active).await;

        let list = SceneListView::load(store.as_ref()).await?;
        tracing::info!(
            active = active.id().unwrap_or_default(),
            scenes = list.len(),
            "Sketchbook opened"
        );

        Ok(Self {
            config,
            store,
            bus,
            events,
            active,
            list,
            thumbnailer: None,
        })
    }

    /// Open a sketchbook backed by JSON files in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or read.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn open_dir(
        data_dir: impl Into<PathBuf>,
        config: SketchbookConfig,
    ) -> SketchbookResult<Self> {
        let data_dir = data_dir.into();
        let store = FileStore::open(&data_dir)?;
        let slot = FileSlot::open(&data_dir)?;
        Self::open(Arc::new(store), Arc::new(slot), config).await
    }

    /// Use `thumbnailer` for list previews.
    #[must_use]
    pub fn with_thumbnailer(mut self, thumbnailer: Arc<dyn Thumbnailer>) -> Self {
        self.thumbnailer = Some(thumbnailer);
        self
    }

    /// Make the scene named `name` active, reloading it from the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SketchbookError::SceneNotFound`] if the list has no
    /// such scene.
    pub async fn select(&mut self, name: &str) -> SketchbookResult<()> {
        self.pump();
        self.list.select(name)?;
        tracing::info!(scene = %name, "Scene selected");
        self.active.reset(Some(name.to_string())).await;
        Ok(())
    }

    /// Start a blank scene under a generated name and return the name.
    ///
    /// The scene enters the store and the list on its first save. The
    /// generated name only applies to changes that carry no name of their
    /// own: if the drawing surface reports `appState.name`, that name wins
    /// and the scene is saved under it.
    pub async fn new_scene(&mut self) -> String {
        let name = generate_scene_name();
        tracing::info!(scene = %name, "New scene");
        self.active.reset(Some(name.clone())).await;
        name
    }

    /// Serialize the stored scene `name` as a portable scene document.
    ///
    /// # Errors
    ///
    /// Returns [`SketchbookError::SceneNotFound`] if nothing is stored under
    /// `name`, or a store error if it cannot be read.
    pub async fn export_scene(&self, name: &str) -> SketchbookResult<String> {
        let scene = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| SketchbookError::SceneNotFound(name.to_string()))?;
        SceneDocument::from_scene(&scene, DEFAULT_SOURCE).to_json()
    }

    /// Store a scene document and make it the active scene.
    ///
    /// A document without a scene name is stored under a generated one. An
    /// existing scene with the same name is replaced. Returns the name.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or of another type, or
    /// if the store rejects the write.
    pub async fn import_scene(&mut self, json: &str) -> SketchbookResult<String> {
        let mut scene = SceneDocument::parse(json)?.into_scene();
        let name = match scene.name() {
            Some(name) => name.to_string(),
            None => {
                let name = generate_scene_name();
                scene.app_state.name = Some(name.clone());
                name
            }
        };
        self.store.set(&name, &scene).await?;
        self.bus.publish(SceneEvent::Saved(Arc::new(scene)));
        tracing::info!(scene = %name, "Scene imported");
        self.select(&name).await?;
        Ok(name)
    }

    /// Apply saved-scene events waiting on the bus to the list.
    pub fn pump(&mut self) -> usize {
        self.list.drain(&mut self.events)
    }

    /// Apply pending events, then render stale thumbnails.
    ///
    /// Returns how many thumbnails were rendered; zero without a thumbnailer.
    pub fn refresh_thumbnails(&mut self) -> usize {
        self.pump();
        match &self.thumbnailer {
            Some(thumbnailer) => self.list.refresh_thumbnails(thumbnailer.as_ref()),
            None => 0,
        }
    }

    /// Stop the active scene's sync task, applying the close policy.
    pub async fn close(mut self) {
        self.active.unmount().await;
    }

    /// The active scene view.
    #[must_use]
    pub fn active(&self) -> &ActiveSceneView {
        &self.active
    }

    /// The active scene id.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.id()
    }

    /// The scene list.
    #[must_use]
    pub fn list(&self) -> &SceneListView {
        &self.list
    }

    /// Mutable access to the scene list, e.g. to register a select callback.
    pub fn list_mut(&mut self) -> &mut SceneListView {
        &mut self.list
    }

    /// The bus saves are published on.
    #[must_use]
    pub fn bus(&self) -> &SceneBus {
        &self.bus
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SketchbookConfig {
        &self.config
    }
}
