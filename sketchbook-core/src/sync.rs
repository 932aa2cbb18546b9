//! Debounced persistence of the active scene.
//!
//! Change events from the drawing surface are fed into a [`SyncHandle`]. A
//! background task collapses them with a [`Debouncer`] and, once the scene
//! has been quiet for the configured period:
//!
//! 1. points the last-active slot at the scene's name,
//! 2. writes the scene to the store under its name,
//! 3. publishes [`SceneEvent::Saved`] on the bus.
//!
//! Closing or dropping the handle discards a pending change unless
//! [`SketchbookConfig::flush_on_close`] is set.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::bus::{SceneBus, SceneEvent};
use crate::config::SketchbookConfig;
use crate::debounce::Debouncer;
use crate::element::Element;
use crate::error::{SketchbookError, SketchbookResult};
use crate::runtime;
use crate::scene::{AppState, BinaryFile, FileId, Scene};
use crate::store::{PointerSlot, SceneStore};

/// Result of a single write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Scene stored and published.
    Written,
    /// Scene has no usable name; nothing was stored.
    Rejected,
    /// The store rejected the write.
    Failed,
    /// There was no pending change to write.
    Idle,
}

/// Counters shared between a [`SyncHandle`] and its task.
#[derive(Debug, Default)]
pub struct SyncStats {
    written: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    superseded: AtomicU64,
    discarded: AtomicU64,
}

/// Point-in-time copy of [`SyncStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    /// Scenes written to the store.
    pub written: u64,
    /// Writes skipped because the scene had no name.
    pub rejected: u64,
    /// Writes the store or slot rejected.
    pub failed: u64,
    /// Changes replaced by a later change inside the quiet period.
    pub superseded: u64,
    /// Pending changes dropped on close.
    pub discarded: u64,
}

impl SyncStats {
    /// Snapshot the counters.
    #[must_use]
    pub fn snapshot(&self) -> SyncCounts {
        SyncCounts {
            written: self.written.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

enum Command {
    Change(Scene),
    Flush(oneshot::Sender<WriteOutcome>),
    Close,
}

/// Everything the sync task writes to.
#[derive(Clone)]
pub struct SceneSync {
    store: Arc<dyn SceneStore>,
    slot: Arc<dyn PointerSlot>,
    bus: SceneBus,
    config: SketchbookConfig,
}

impl std::fmt::Debug for SceneSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSync")
            .field("bus", &self.bus)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SceneSync {
    /// Create a sync target set.
    #[must_use]
    pub fn new(
        store: Arc<dyn SceneStore>,
        slot: Arc<dyn PointerSlot>,
        bus: SceneBus,
        config: SketchbookConfig,
    ) -> Self {
        Self {
            store,
            slot,
            bus,
            config,
        }
    }

    /// The store scenes are written to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SceneStore> {
        &self.store
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

    /// Start a background sync task.
    ///
    /// Native builds need an ambient tokio runtime; `wasm32` builds run the
    /// task on the browser event loop.
    #[must_use]
    pub fn spawn(&self) -> SyncHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let stats = Arc::new(SyncStats::default());
        let worker = Worker {
            sync: self.clone(),
            debouncer: Debouncer::new(self.config.debounce),
            stats: Arc::clone(&stats),
        };
        runtime::spawn(async move {
            worker.run(rx).await;
            let _ = done_tx.send(());
        });
        SyncHandle {
            tx,
            stats,
            done: Some(done_rx),
        }
    }

    /// Write `scene` immediately: pointer slot, store, then bus.
    pub async fn write(&self, scene: Scene, stats: &SyncStats) -> WriteOutcome {
        let Some(name) = scene.name().map(str::to_owned) else {
            tracing::warn!("Refusing to store a scene without a name");
            stats.rejected.fetch_add(1, Ordering::Relaxed);
            return WriteOutcome::Rejected;
        };

        if let Err(e) = self.slot.set_item(&self.config.pointer_key, &name) {
            tracing::error!(scene = %name, "Failed to update last-active pointer: {e}");
            stats.failed.fetch_add(1, Ordering::Relaxed);
        }

        if let Err(e) = self.store.set(&name, &scene).await {
            tracing::error!(scene = %name, "Failed to store scene: {e}");
            stats.failed.fetch_add(1, Ordering::Relaxed);
            return WriteOutcome::Failed;
        }

        stats.written.fetch_add(1, Ordering::Relaxed);
        let receivers = self.bus.publish(SceneEvent::Saved(Arc::new(scene)));
        tracing::debug!(scene = %name, receivers, "Scene saved");
        WriteOutcome::Written
    }
}

struct Worker {
    sync: SceneSync,
    debouncer: Debouncer<Scene>,
    stats: Arc<SyncStats>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.debouncer.deadline();
            // A due write goes out before any queued command is handled.
            let command = tokio::select! {
                biased;
                () = wait_until(deadline) => {
                    if let Some(scene) = self.debouncer.poll(runtime::now()) {
                        self.sync.write(scene, &self.stats).await;
                    }
                    continue;
                }
                command = rx.recv() => command,
            };

            match command {
                Some(Command::Change(scene)) => {
                    if self.debouncer.push(scene, runtime::now()).is_some() {
                        self.stats.superseded.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Some(Command::Flush(reply)) => {
                    let outcome = match self.debouncer.take() {
                        Some(scene) => self.sync.write(scene, &self.stats).await,
                        None => WriteOutcome::Idle,
                    };
                    let _ = reply.send(outcome);
                }
                Some(Command::Close) | None => {
                    self.finish().await;
                    break;
                }
            }
        }
    }

    async fn finish(&mut self) {
        if self.sync.config.flush_on_close {
            if let Some(scene) = self.debouncer.take() {
                self.sync.write(scene, &self.stats).await;
            }
        } else if self.debouncer.discard() {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Discarded pending scene change on close");
        }
    }
}

async fn wait_until(deadline: Option<runtime::Instant>) {
    match deadline {
        Some(deadline) => runtime::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Sender side of a running sync task.
///
/// Dropping the handle stops the task with the same policy as
/// [`SyncHandle::close`], without waiting for it.
#[derive(Debug)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Command>,
    stats: Arc<SyncStats>,
    done: Option<oneshot::Receiver<()>>,
}

impl SyncHandle {
    /// Forward a change event from the drawing surface.
    ///
    /// # Errors
    ///
    /// Returns [`SketchbookError::SyncClosed`] if the task has stopped.
    pub fn notify(
        &self,
        elements: Vec<Element>,
        app_state: AppState,
        files: BTreeMap<FileId, BinaryFile>,
    ) -> SketchbookResult<()> {
        self.notify_scene(Scene::new(elements, app_state, files))
    }

    /// Forward an already assembled scene.
    ///
    /// # Errors
    ///
    /// Returns [`SketchbookError::SyncClosed`] if the task has stopped.
    pub fn notify_scene(&self, scene: Scene) -> SketchbookResult<()> {
        self.tx
            .send(Command::Change(scene))
            .map_err(|_| SketchbookError::SyncClosed)
    }

    /// Write the pending change now instead of waiting for the quiet period.
    ///
    /// # Errors
    ///
    /// Returns [`SketchbookError::SyncClosed`] if the task has stopped.
    pub async fn flush(&self) -> SketchbookResult<WriteOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .map_err(|_| SketchbookError::SyncClosed)?;
        reply_rx.await.map_err(|_| SketchbookError::SyncClosed)
    }

    /// Stop the task and wait for it to finish.
    pub async fn close(mut self) {
        let _ = self.tx.send(Command::Close);
        if let Some(done) = self.done.take() {
            if done.await.is_err() {
                tracing::error!("Sync task ended abnormally");
            }
        }
    }

    /// Counters for this task.
    #[must_use]
    pub fn stats(&self) -> SyncCounts {
        self.stats.snapshot()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::element::ElementKind;
    use crate::store::{MemorySlot, MemoryStore};

    struct Fixture {
        store: MemoryStore,
        slot: MemorySlot,
        bus: SceneBus,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                slot: MemorySlot::new(),
                bus: SceneBus::new(),
            }
        }

        fn sync(&self, config: SketchbookConfig) -> SceneSync {
            SceneSync::new(
                Arc::new(self.store.clone()),
                Arc::new(self.slot.clone()),
                self.bus.clone(),
                config,
            )
        }
    }

    fn drawing(name: &str, elements: usize) -> Scene {
        let mut scene = Scene::blank(name);
        for i in 0..elements {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f64 * 10.0;
            scene.push_element(Element::new(ElementKind::Rectangle, offset, 0.0, 5.0, 5.0));
        }
        scene
    }

    #[tokio::test(start_paused = true)]
    async fn burst_produces_single_write_of_last_change() {
        let fx = Fixture::new();
        let handle = fx.sync(SketchbookConfig::default()).spawn();

        handle.notify_scene(drawing("draft1", 1)).expect("notify");
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.notify_scene(drawing("draft1", 2)).expect("notify");
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(fx.store.write_count(), 1);
        let stored = fx.store.get("draft1").await.expect("get").expect("stored");
        assert_eq!(stored.elements.len(), 2);
        assert_eq!(handle.stats().superseded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_written_before_quiet_period() {
        let fx = Fixture::new();
        let handle = fx.sync(SketchbookConfig::default()).spawn();
        handle.notify_scene(drawing("draft1", 1)).expect("notify");
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fx.store.write_count(), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fx.store.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_updates_pointer_and_publishes() {
        let fx = Fixture::new();
        let mut rx = fx.bus.subscribe();
        let handle = fx.sync(SketchbookConfig::default()).spawn();

        handle
            .notify(Vec::new(), AppState::named("draft1"), BTreeMap::new())
            .expect("notify");
        tokio::time::sleep(Duration::from_millis(600)).await;

        let pointer = fx
            .slot
            .get_item(crate::config::DEFAULT_POINTER_KEY)
            .expect("slot");
        assert_eq!(pointer.as_deref(), Some("draft1"));
        let event = rx.recv().await.expect("event");
        assert_eq!(event.scene().name(), Some("draft1"));
    }

    #[tokio::test(start_paused = true)]
    async fn unnamed_scene_is_rejected() {
        let fx = Fixture::new();
        let handle = fx.sync(SketchbookConfig::default()).spawn();
        handle.notify_scene(Scene::default()).expect("notify");
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(fx.store.write_count(), 0);
        assert_eq!(handle.stats().rejected, 1);
        assert_eq!(
            fx.slot.get_item(crate::config::DEFAULT_POINTER_KEY).expect("slot"),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn close_discards_pending_change_by_default() {
        let fx = Fixture::new();
        let handle = fx.sync(SketchbookConfig::default()).spawn();
        handle.notify_scene(drawing("draft1", 1)).expect("notify");
        tokio::task::yield_now().await;
        handle.close().await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fx.store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn close_flushes_when_configured() {
        let fx = Fixture::new();
        let config = SketchbookConfig {
            flush_on_close: true,
            ..SketchbookConfig::default()
        };
        let handle = fx.sync(config).spawn();
        handle.notify_scene(drawing("draft1", 3)).expect("notify");
        handle.close().await;

        assert_eq!(fx.store.write_count(), 1);
        let stored = fx.store.get("draft1").await.expect("get").expect("stored");
        assert_eq!(stored.elements.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately() {
        let fx = Fixture::new();
        let handle = fx.sync(SketchbookConfig::default()).spawn();
        assert_eq!(handle.flush().await.expect("flush"), WriteOutcome::Idle);

        handle.notify_scene(drawing("draft1", 1)).expect("notify");
        assert_eq!(handle.flush().await.expect("flush"), WriteOutcome::Written);
        assert_eq!(fx.store.write_count(), 1);

        // Nothing left pending after the flush.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fx.store.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_scenes_write_independently() {
        let fx = Fixture::new();
        let sync = fx.sync(SketchbookConfig::default());
        let a = sync.spawn();
        let b = sync.spawn();
        a.notify_scene(drawing("a", 1)).expect("a");
        b.notify_scene(drawing("b", 2)).expect("b");
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(fx.store.get("a").await.expect("get").is_some());
        assert!(fx.store.get("b").await.expect("get").is_some());
    }
}
