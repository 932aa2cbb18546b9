//! `localStorage` adapters and the browser sync driver.
//!
//! Run with `wasm-pack test --headless --firefox sketchbook-core --features wasm`.

#![cfg(all(target_arch = "wasm32", feature = "wasm"))]

use std::sync::Arc;
use std::time::Duration;

use sketchbook_core::browser::{LocalStorageSlot, LocalStorageStore};
use sketchbook_core::{
    Element, ElementKind, PointerSlot, Scene, SceneStore, Sketchbook, SketchbookConfig,
};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

/// Store with a per-test prefix so tests sharing one origin stay apart.
fn store(test: &str) -> LocalStorageStore {
    LocalStorageStore::with_prefix(format!("sketchbook-test:{test}:"))
}

fn drawing(name: &str, count: usize) -> Scene {
    let mut scene = Scene::blank(name);
    for i in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let x = i as f64 * 10.0;
        scene.push_element(Element::new(ElementKind::Rectangle, x, 0.0, 5.0, 5.0));
    }
    scene
}

#[wasm_bindgen_test]
async fn local_storage_store_roundtrip() {
    let store = store("roundtrip");
    let scene = drawing("My Drawing", 2);

    store.set("My Drawing", &scene).await.expect("set");
    assert_eq!(store.get("My Drawing").await.expect("get"), Some(scene));
    assert_eq!(store.get("missing").await.expect("get"), None);
}

#[wasm_bindgen_test]
async fn entries_only_list_own_prefix() {
    let ours = store("entries");
    let other = store("entries-other");
    ours.set("a", &drawing("a", 1)).await.expect("a");
    other.set("b", &drawing("b", 1)).await.expect("b");

    let keys: Vec<_> = ours
        .entries()
        .await
        .expect("entries")
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, ["a"]);
}

#[wasm_bindgen_test]
fn local_storage_slot_roundtrip() {
    let slot = LocalStorageSlot;
    slot.set_item("sketchbook-test:slot", "draft1").expect("set");
    assert_eq!(
        slot.get_item("sketchbook-test:slot").expect("get").as_deref(),
        Some("draft1")
    );
}

#[wasm_bindgen_test]
async fn debounced_save_runs_on_browser_event_loop() {
    sketchbook_core::browser::init();
    let store = store("sync");
    let config = SketchbookConfig {
        debounce: Duration::from_millis(50),
        pointer_key: "sketchbook-test:sync-active".to_string(),
        ..SketchbookConfig::default()
    };
    let book = Sketchbook::open(Arc::new(store.clone()), Arc::new(LocalStorageSlot), config)
        .await
        .expect("open");

    book.active()
        .on_change_scene(drawing("browser", 3))
        .expect("change");
    gloo_timers::future::sleep(Duration::from_millis(200)).await;

    let saved = store.get("browser").await.expect("get").expect("saved");
    assert_eq!(saved.elements.len(), 3);
    assert_eq!(
        LocalStorageSlot
            .get_item("sketchbook-test:sync-active")
            .expect("slot")
            .as_deref(),
        Some("browser")
    );
    book.close().await;
}
