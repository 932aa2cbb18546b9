//! Sketchbook configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bus::DEFAULT_BUS_CAPACITY;

/// Default quiet period before a change is persisted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default key of the last-active pointer slot.
pub const DEFAULT_POINTER_KEY: &str = "sketchbook-active-id";

/// Default thumbnail edge length in pixels.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 64;

/// Runtime configuration of a sketchbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchbookConfig {
    /// Quiet period after the last change before it is written.
    #[serde(with = "duration_ms")]
    pub debounce: Duration,
    /// Slot key holding the last-active scene name.
    pub pointer_key: String,
    /// Write a pending change when the active scene is torn down.
    pub flush_on_close: bool,
    /// Events buffered per bus subscriber.
    pub bus_capacity: usize,
    /// Thumbnail edge length in pixels.
    pub thumbnail_size: u32,
}

impl Default for SketchbookConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            pointer_key: DEFAULT_POINTER_KEY.to_string(),
            flush_on_close: false,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

impl SketchbookConfig {
    /// Defaults overridden by `SKETCHBOOK_*` environment variables.
    ///
    /// - `SKETCHBOOK_DEBOUNCE_MS`
    /// - `SKETCHBOOK_POINTER_KEY`
    /// - `SKETCHBOOK_FLUSH_ON_CLOSE`
    ///
    /// Unparsable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`] but reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("SKETCHBOOK_DEBOUNCE_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.debounce = Duration::from_millis(ms),
                Err(e) => tracing::warn!("Ignoring SKETCHBOOK_DEBOUNCE_MS={raw:?}: {e}"),
            }
        }

        if let Some(raw) = lookup("SKETCHBOOK_POINTER_KEY") {
            if raw.trim().is_empty() {
                tracing::warn!("Ignoring empty SKETCHBOOK_POINTER_KEY");
            } else {
                config.pointer_key = raw;
            }
        }

        if let Some(raw) = lookup("SKETCHBOOK_FLUSH_ON_CLOSE") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.flush_on_close = true,
                "0" | "false" | "no" => config.flush_on_close = false,
                _ => tracing::warn!("Ignoring SKETCHBOOK_FLUSH_ON_CLOSE={raw:?}"),
            }
        }

        config
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
