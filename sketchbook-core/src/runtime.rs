//! Task spawning and timers for the sync worker.
//!
//! Native builds run on the ambient tokio runtime. `wasm32` builds have no
//! tokio runtime: tasks run on the browser microtask queue through
//! `wasm-bindgen-futures`, sleeps use `setTimeout` and the clock reads
//! `performance.now()`.

use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::Instant;

#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

/// Current time on the sync clock.
#[must_use]
pub fn now() -> Instant {
    Instant::now()
}

/// Sleep until `deadline`.
#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep_until(deadline: Instant) {
    tokio::time::sleep_until(deadline).await;
}

/// Sleep until `deadline`.
#[cfg(target_arch = "wasm32")]
pub async fn sleep_until(deadline: Instant) {
    let remaining = deadline.saturating_duration_since(now());
    gloo_timers::future::sleep(remaining).await;
}

/// Run `task` in the background.
///
/// Completion is not reported here; callers that need to wait signal it
/// from inside the task.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    drop(tokio::spawn(task));
}

/// Run `task` in the background.
///
/// Completion is not reported here; callers that need to wait signal it
/// from inside the task.
#[cfg(target_arch = "wasm32")]
pub fn spawn<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}
