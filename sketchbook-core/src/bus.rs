//! Publish/subscribe bus for saved scenes.
//!
//! The bus is an explicit value handed to whoever needs it, so tests and
//! separate sketchbooks each get an isolated channel.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::scene::Scene;

/// Default number of events buffered per subscriber.
pub const DEFAULT_BUS_CAPACITY: usize = 100;

/// Event published on the scene bus.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A scene was written to the store.
    Saved(Arc<Scene>),
}

impl SceneEvent {
    /// The scene carried by the event.
    #[must_use]
    pub fn scene(&self) -> &Arc<Scene> {
        match self {
            Self::Saved(scene) => scene,
        }
    }
}

/// Broadcast channel of [`SceneEvent`]s.
///
/// Clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct SceneBus {
    tx: broadcast::Sender<SceneEvent>,
}

impl SceneBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    pub fn publish(&self, event: SceneEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                // No subscribers is normal before the list view is attached.
                tracing::debug!("Scene event dropped: no subscribers");
                0
            }
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SceneBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_scene() {
        let bus = SceneBus::new();
        let mut rx = bus.subscribe();
        let delivered = bus.publish(SceneEvent::Saved(Arc::new(Scene::blank("x"))));
        assert_eq!(delivered, 1);

        let event = rx.recv().await.expect("event");
        assert_eq!(event.scene().name(), Some("x"));
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = SceneBus::new();
        assert_eq!(bus.publish(SceneEvent::Saved(Arc::new(Scene::default()))), 0);
    }

    #[test]
    fn separate_buses_are_isolated() {
        let a = SceneBus::new();
        let b = SceneBus::new();
        let mut rx_b = b.subscribe();
        a.publish(SceneEvent::Saved(Arc::new(Scene::blank("only-a"))));
        assert!(rx_b.try_recv().is_err());
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 1);
    }
}
