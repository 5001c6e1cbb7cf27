//! Config artifact lifecycle: load, validate, watch, and hot-reload.

pub mod loader;
pub mod model;
pub mod watch;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use tokio::task::JoinHandle;
use tracing::info;

pub use model::{AuthBlock, AuthCredentials, Listener, RelayConfig};

/// Owns the live, validated snapshot of the relay config artifact.
///
/// One driver task per instance watches the file and republishes the
/// snapshot on every change; readers call [`snapshot`](Self::snapshot) and
/// never block. Construct explicitly and keep it alive for as long as
/// credentials are resolved against it.
pub struct ConfigSource {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the source handle and its driver task.
pub(crate) struct Shared {
    /// Last known-good parsed config, or `None` while absent.
    snapshot: ArcSwapOption<RelayConfig>,
    /// Bumped on every `start`/`stop`; driver tasks carrying an older value
    /// are stale and must not mutate the snapshot.
    generation: AtomicU64,
}

impl Shared {
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Replaces the snapshot wholesale, unless this generation has been
    /// superseded. The re-check after the store closes the window where a
    /// concurrent `stop` already cleared the snapshot.
    pub(crate) fn publish(&self, generation: u64, config: Option<RelayConfig>) {
        if !self.is_current(generation) {
            return;
        }
        self.snapshot.store(config.map(Arc::new));
        if !self.is_current(generation) {
            self.snapshot.store(None);
        }
    }
}

impl ConfigSource {
    /// Creates a source with no artifact loaded and no watch running.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                snapshot: ArcSwapOption::const_empty(),
                generation: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Starts (or restarts) watching `path`.
    ///
    /// Any prior watch or pending retry is cancelled first, so exactly one
    /// driver task is outstanding per source. Returns once the driver is
    /// scheduled; the initial read happens asynchronously. Must be called
    /// from within a tokio runtime.
    pub fn start(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut task = self.task.lock().expect("config source task lock poisoned");
        if let Some(handle) = task.take() {
            handle.abort();
        }

        info!(path = %path.display(), "starting relay config watch");
        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(watch::run(shared, path, generation)));
    }

    /// Returns the currently published artifact, or `None` when absent.
    ///
    /// Non-blocking; concurrent with an in-flight reload this observes
    /// either the old or the new snapshot, never a partial one.
    pub fn snapshot(&self) -> Option<Arc<RelayConfig>> {
        self.shared.snapshot.load_full()
    }

    /// Cancels the watch and any pending retry, and clears the snapshot.
    /// Idempotent; a later `start` re-enters cleanly.
    pub fn stop(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let mut task = self.task.lock().expect("config source task lock poisoned");
        if let Some(handle) = task.take() {
            handle.abort();
        }
        self.shared.snapshot.store(None);
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConfigSource {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}
