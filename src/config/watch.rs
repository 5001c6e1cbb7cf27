//! Filesystem watch and retry driver for the config source.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{loader, Shared};
use crate::error::ConfigError;

/// Fixed backoff between attempts to establish a watch. Not exponential;
/// the same interval is re-applied on each consecutive failure.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Driver task for one `start()` call.
///
/// The watch is registered on the config file's parent directory and events
/// are filtered by file name, so deleting and re-creating the file keeps
/// producing notifications without re-arming the watch. Only a missing
/// parent directory sends us through the retry loop.
///
/// `generation` identifies this task; once the owning source moves on, the
/// task observes the stale generation and exits without touching the
/// snapshot.
pub(crate) async fn run(shared: Arc<Shared>, path: PathBuf, generation: u64) {
    loop {
        if !shared.is_current(generation) {
            return;
        }

        match establish_watch(&path) {
            Ok((watcher, mut rx)) => {
                // The watcher must stay alive for the duration of the event loop.
                let _watcher = watcher;

                reload(&shared, &path, generation);

                while let Some(event) = rx.recv().await {
                    if !shared.is_current(generation) {
                        return;
                    }
                    if !touches(&event.paths, &path) {
                        continue;
                    }
                    reload(&shared, &path, generation);
                }

                // Channel closed: the watch backend went away. Re-establish.
                warn!(path = %path.display(), "config watch ended, re-establishing");
            }
            Err(e) => {
                // Watch setup failed, e.g. the parent directory does not
                // exist yet. A readable file is still served while the
                // watch keeps retrying.
                warn!(path = %path.display(), error = %e, "failed to establish config watch");
                reload(&shared, &path, generation);
            }
        }

        tokio::time::sleep(RETRY_INTERVAL).await;
    }
}

/// Creates a watcher on the parent directory of `path`, forwarding events
/// into an unbounded channel drained by the driver loop.
fn establish_watch(
    path: &Path,
) -> notify::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<Event>)> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(&watch_root(path), RecursiveMode::NonRecursive)?;

    Ok((watcher, rx))
}

/// The directory whose entries we watch for changes to the config file.
fn watch_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether an event concerns the watched config file. Events without path
/// information are passed through rather than dropped.
fn touches(event_paths: &[PathBuf], path: &Path) -> bool {
    let name = path.file_name();
    event_paths.is_empty() || event_paths.iter().any(|p| p.file_name() == name)
}

/// Runs one read-parse-validate step and publishes the outcome: a fully
/// validated artifact replaces the snapshot, any failure clears it.
pub(crate) fn reload(shared: &Shared, path: &Path, generation: u64) {
    match loader::load_from_path(path) {
        Ok(config) => {
            info!(
                path = %path.display(),
                version = %config.version,
                listeners = config.listeners.len(),
                "loaded relay config"
            );
            shared.publish(generation, Some(config));
        }
        Err(e) => {
            match e {
                ConfigError::ReadFailed { .. } => {
                    debug!(path = %path.display(), error = %e, "config file not readable")
                }
                _ => warn!(path = %path.display(), error = %e, "rejected config file"),
            }
            shared.publish(generation, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_root_of_relative_file_is_cwd() {
        assert_eq!(watch_root(Path::new("config.json")), PathBuf::from("."));
        assert_eq!(watch_root(Path::new("etc/config.json")), PathBuf::from("etc"));
    }

    #[test]
    fn touches_matches_by_file_name() {
        let path = Path::new("/etc/relay/config.json");

        assert!(touches(&[PathBuf::from("/etc/relay/config.json")], path));
        assert!(!touches(&[PathBuf::from("/etc/relay/other.json")], path));

        // No path info: treated as potentially relevant.
        assert!(touches(&[], path));
    }
}
